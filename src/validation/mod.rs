//! Validators and field errors
//!
//! A validator inspects the argument data of a mutation and yields zero or
//! more [`ErrorField`]s. Validators are collected in a [`ValidatorSet`], which
//! runs every entry independently and concatenates the errors in declaration
//! order.

pub mod rules;

pub use rules::RuleValidator;

use std::sync::Arc;

use async_graphql::SimpleObject;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Validation data handed to validators
pub type ValidationData = Map<String, Value>;

/// A field name paired with its ordered error messages
#[derive(SimpleObject, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[graphql(name = "ErrorFieldType")]
pub struct ErrorField {
    /// Field name
    pub field: String,
    /// Error messages
    pub messages: Vec<String>,
}

impl ErrorField {
    pub fn new(field: impl Into<String>, messages: Vec<String>) -> Self {
        Self {
            field: field.into(),
            messages,
        }
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, vec![message.into()])
    }

    /// Build errors from a field -> messages mapping
    pub fn from_messages<I, F, M>(messages: I) -> Vec<ErrorField>
    where
        I: IntoIterator<Item = (F, Vec<M>)>,
        F: Into<String>,
        M: Into<String>,
    {
        messages
            .into_iter()
            .map(|(field, msgs)| ErrorField::new(field, msgs.into_iter().map(Into::into).collect()))
            .collect()
    }

    /// Build errors from the field -> rule -> message mapping produced by a
    /// rule validator
    pub fn from_rule_messages(messages: &IndexMap<String, IndexMap<String, String>>) -> Vec<ErrorField> {
        messages
            .iter()
            .map(|(field, rules)| ErrorField::new(field.clone(), rules.values().cloned().collect()))
            .collect()
    }
}

/// Inspects validation data and reports field errors
pub trait Validator: Send + Sync {
    fn validate(&self, data: &ValidationData) -> Vec<ErrorField>;
}

impl<F> Validator for F
where
    F: Fn(&ValidationData) -> Vec<ErrorField> + Send + Sync,
{
    fn validate(&self, data: &ValidationData) -> Vec<ErrorField> {
        self(data)
    }
}

/// Selects which argument keys a validator sees
pub type KeyFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A validator optionally paired with a key predicate
#[derive(Clone)]
pub struct ValidatorEntry {
    validator: Arc<dyn Validator>,
    key_filter: Option<KeyFilter>,
}

impl ValidatorEntry {
    pub fn new(validator: impl Validator + 'static) -> Self {
        Self {
            validator: Arc::new(validator),
            key_filter: None,
        }
    }

    pub fn filtered<P>(validator: impl Validator + 'static, predicate: P) -> Self
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            validator: Arc::new(validator),
            key_filter: Some(Arc::new(predicate)),
        }
    }

    pub fn validate(&self, data: &ValidationData) -> Vec<ErrorField> {
        match &self.key_filter {
            Some(filter) => {
                let selected: ValidationData = data
                    .iter()
                    .filter(|(key, _)| filter(key))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                self.validator.validate(&selected)
            }
            None => self.validator.validate(data),
        }
    }
}

/// Ordered collection of validators
#[derive(Clone, Default)]
pub struct ValidatorSet {
    entries: Vec<ValidatorEntry>,
}

impl ValidatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, validator: impl Validator + 'static) -> Self {
        self.with_entry(ValidatorEntry::new(validator))
    }

    /// Add a validator that only sees the keys accepted by `predicate`
    pub fn with_filtered<P>(self, validator: impl Validator + 'static, predicate: P) -> Self
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.with_entry(ValidatorEntry::filtered(validator, predicate))
    }

    pub fn with_entry(mut self, entry: ValidatorEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Run every validator and collect the errors
    pub fn errors(&self, data: &ValidationData) -> Vec<ErrorField> {
        self.entries
            .iter()
            .flat_map(|entry| entry.validate(data))
            .collect()
    }
}
