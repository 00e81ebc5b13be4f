//! Rule-string validator
//!
//! Rules are declared per field as a pipe-separated list, for example
//! `"required|min_length:3|max_length:120"`. Supported rules:
//!
//! - `required` - present, not null, not an empty string or list
//! - `min_length:n` / `max_length:n` - character count of strings, length of lists
//! - `email`
//! - `numeric` - a number or a string holding one
//! - `integer` - an integer or a string holding one
//! - `in:a,b,c` - one of the listed values
//! - `regex:pattern` - must be the last rule of the list, the pattern may contain `|`
//!
//! A field that is absent and not `required` is skipped.

use std::str::FromStr;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use super::{ErrorField, ValidationData, Validator};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Unknown rule: {0}")]
    Unknown(String),

    #[error("Rule '{rule}' expects an argument")]
    MissingArgument { rule: String },

    #[error("Rule '{rule}' has an invalid argument: {argument}")]
    InvalidArgument { rule: String, argument: String },
}

#[derive(Debug, Clone)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Email,
    Numeric,
    Integer,
    In(Vec<String>),
    Regex(Regex),
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::MinLength(_) => "min_length",
            Rule::MaxLength(_) => "max_length",
            Rule::Email => "email",
            Rule::Numeric => "numeric",
            Rule::Integer => "integer",
            Rule::In(_) => "in",
            Rule::Regex(_) => "regex",
        }
    }

    /// Parse a pipe-separated rule list
    pub fn parse_list(spec: &str) -> Result<Vec<Rule>, RuleError> {
        let mut rules = Vec::new();
        let mut rest = spec.trim();
        while !rest.is_empty() {
            if let Some(pattern) = rest.strip_prefix("regex:") {
                rules.push(Rule::regex(pattern)?);
                break;
            }
            let (head, tail) = match rest.split_once('|') {
                Some((head, tail)) => (head, tail),
                None => (rest, ""),
            };
            if !head.trim().is_empty() {
                rules.push(head.trim().parse()?);
            }
            rest = tail.trim();
        }
        Ok(rules)
    }

    fn regex(pattern: &str) -> Result<Rule, RuleError> {
        Regex::new(pattern)
            .map(Rule::Regex)
            .map_err(|_| RuleError::InvalidArgument {
                rule: "regex".to_string(),
                argument: pattern.to_string(),
            })
    }

    fn passes(&self, value: &Value) -> bool {
        match self {
            Rule::Required => !is_empty(value),
            Rule::MinLength(min) => length(value).map_or(false, |len| len >= *min),
            Rule::MaxLength(max) => length(value).map_or(false, |len| len <= *max),
            Rule::Email => value.as_str().map_or(false, |s| EMAIL.is_match(s)),
            Rule::Numeric => match value {
                Value::Number(_) => true,
                Value::String(s) => s.trim().parse::<f64>().is_ok(),
                _ => false,
            },
            Rule::Integer => match value {
                Value::Number(n) => n.is_i64() || n.is_u64(),
                Value::String(s) => s.trim().parse::<i64>().is_ok(),
                _ => false,
            },
            Rule::In(allowed) => scalar_text(value).map_or(false, |text| allowed.contains(&text)),
            Rule::Regex(regex) => value.as_str().map_or(false, |s| regex.is_match(s)),
        }
    }

    fn default_message(&self, field: &str) -> String {
        match self {
            Rule::Required => format!("The {} field is required.", field),
            Rule::MinLength(min) => {
                format!("The {} field must be at least {} characters long.", field, min)
            }
            Rule::MaxLength(max) => {
                format!("The {} field must be at most {} characters long.", field, max)
            }
            Rule::Email => format!("The {} field must be a valid email address.", field),
            Rule::Numeric => format!("The {} field must be a number.", field),
            Rule::Integer => format!("The {} field must be an integer.", field),
            Rule::In(allowed) => format!(
                "The {} field must be one of: {}.",
                field,
                allowed.join(", ")
            ),
            Rule::Regex(_) => format!("The {} field has an invalid format.", field),
        }
    }
}

fn require<'a>(rule: &str, argument: Option<&'a str>) -> Result<&'a str, RuleError> {
    argument.ok_or_else(|| RuleError::MissingArgument {
        rule: rule.to_string(),
    })
}

fn size(rule: &str, argument: Option<&str>) -> Result<usize, RuleError> {
    let raw = require(rule, argument)?;
    raw.parse().map_err(|_| RuleError::InvalidArgument {
        rule: rule.to_string(),
        argument: raw.to_string(),
    })
}

impl FromStr for Rule {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, argument) = match s.split_once(':') {
            Some((name, argument)) => (name.trim(), Some(argument.trim())),
            None => (s.trim(), None),
        };
        match name {
            "required" => Ok(Rule::Required),
            "min_length" => Ok(Rule::MinLength(size(name, argument)?)),
            "max_length" => Ok(Rule::MaxLength(size(name, argument)?)),
            "email" => Ok(Rule::Email),
            "numeric" => Ok(Rule::Numeric),
            "integer" => Ok(Rule::Integer),
            "in" => Ok(Rule::In(
                require(name, argument)?
                    .split(',')
                    .map(|item| item.trim().to_string())
                    .collect(),
            )),
            "regex" => Rule::regex(require(name, argument)?),
            other => Err(RuleError::Unknown(other.to_string())),
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Validator driven by per-field rule lists
#[derive(Debug, Clone, Default)]
pub struct RuleValidator {
    rules: IndexMap<String, Vec<Rule>>,
    messages: IndexMap<String, IndexMap<String, String>>,
}

impl RuleValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a validator from `(field, rule list)` pairs
    pub fn from_rules<I, F, S>(rules: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = (F, S)>,
        F: Into<String>,
        S: AsRef<str>,
    {
        rules
            .into_iter()
            .try_fold(Self::new(), |validator, (field, spec)| validator.rule(field, spec.as_ref()))
    }

    /// Append rules for a field
    pub fn rule(mut self, field: impl Into<String>, spec: &str) -> Result<Self, RuleError> {
        let parsed = Rule::parse_list(spec)?;
        self.rules.entry(field.into()).or_default().extend(parsed);
        Ok(self)
    }

    /// Override the message reported when `rule` fails on `field`
    pub fn message(
        mut self,
        field: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.messages
            .entry(field.into())
            .or_default()
            .insert(rule.into(), message.into());
        self
    }

    /// Failed rules per field, mapped to their messages
    pub fn failures(&self, data: &ValidationData) -> IndexMap<String, IndexMap<String, String>> {
        let mut failures: IndexMap<String, IndexMap<String, String>> = IndexMap::new();

        for (field, rules) in &self.rules {
            let value = data.get(field).unwrap_or(&Value::Null);
            let required = rules.iter().any(|rule| matches!(rule, Rule::Required));

            if is_empty(value) {
                if required {
                    failures
                        .entry(field.clone())
                        .or_default()
                        .insert("required".to_string(), self.message_for(field, &Rule::Required));
                }
                continue;
            }

            for rule in rules.iter().filter(|rule| !rule.passes(value)) {
                failures
                    .entry(field.clone())
                    .or_default()
                    .insert(rule.name().to_string(), self.message_for(field, rule));
            }
        }

        failures
    }

    fn message_for(&self, field: &str, rule: &Rule) -> String {
        self.messages
            .get(field)
            .and_then(|messages| messages.get(rule.name()))
            .cloned()
            .unwrap_or_else(|| rule.default_message(field))
    }
}

impl Validator for RuleValidator {
    fn validate(&self, data: &ValidationData) -> Vec<ErrorField> {
        ErrorField::from_rule_messages(&self.failures(data))
    }
}
