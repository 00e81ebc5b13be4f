//! Resolve models
//!
//! A resolve model rewrites the arguments of a mutation before its body runs,
//! for example replacing a global identifier by the record it points to.
//! Resolve models are applied left to right, each one receiving the output of
//! the previous one.

use std::marker::PhantomData;
use std::str::FromStr;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::arguments::{Argument, Arguments};
use crate::auth::RequestContext;
use crate::errors::{MutationError, MutationResult};
use crate::orm::{get_object_or_404, parse_primary_key, PrimaryKeyValue};
use crate::utils::from_global_id;

#[async_trait]
pub trait ResolveModel: Send + Sync {
    async fn resolve(&self, ctx: &RequestContext, args: Arguments) -> MutationResult<Arguments>;
}

/// Decodes global ids stored under `key` into local ids.
///
/// Works on a single id or a list of ids. With an expected type name, ids of
/// another type are rejected.
#[derive(Clone, Debug)]
pub struct GlobalIdResolver {
    key: String,
    target: Option<String>,
    expected_type: Option<String>,
}

impl GlobalIdResolver {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            target: None,
            expected_type: None,
        }
    }

    /// Store the decoded id under another key
    pub fn into_key(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn expect_type(mut self, type_name: impl Into<String>) -> Self {
        self.expected_type = Some(type_name.into());
        self
    }

    fn decode(&self, value: &Value) -> MutationResult<Value> {
        match value {
            Value::String(gid) => {
                let (type_name, id) = from_global_id(gid)?;
                if let Some(expected) = &self.expected_type {
                    if &type_name != expected {
                        return Err(MutationError::InvalidGlobalId(gid.clone()));
                    }
                }
                Ok(id
                    .parse::<i64>()
                    .map(Value::from)
                    .unwrap_or(Value::String(id)))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.decode(item))
                .collect::<MutationResult<Vec<_>>>()
                .map(Value::Array),
            Value::Null => Ok(Value::Null),
            other => Err(MutationError::invalid_argument(
                self.key.clone(),
                format!("expected a global id, got {}", other),
            )),
        }
    }
}

#[async_trait]
impl ResolveModel for GlobalIdResolver {
    async fn resolve(&self, _ctx: &RequestContext, mut args: Arguments) -> MutationResult<Arguments> {
        let Some(value) = args.value(&self.key).cloned() else {
            return Ok(args);
        };
        let decoded = self.decode(&value)?;
        debug!(key = %self.key, "decoded global id argument");
        match &self.target {
            Some(target) => {
                args.remove(&self.key);
                args.insert(target.clone(), decoded);
            }
            None => {
                args.insert(self.key.clone(), decoded);
            }
        }
        Ok(args)
    }
}

/// Loads the record an identifier argument points to and replaces the
/// identifier with the serialized record.
///
/// `note_id` resolves into `note` unless another target key is given.
pub struct EntityResolver<E> {
    db: DatabaseConnection,
    key: String,
    target: String,
    is_global_id: bool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> EntityResolver<E> {
    pub fn new(db: DatabaseConnection, key: impl Into<String>) -> Self {
        let key = key.into();
        let target = key
            .strip_suffix("_id")
            .filter(|stem| !stem.is_empty())
            .unwrap_or(&key)
            .to_string();
        Self {
            db,
            key,
            target,
            is_global_id: false,
            _entity: PhantomData,
        }
    }

    pub fn into_key(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn global(mut self) -> Self {
        self.is_global_id = true;
        self
    }
}

#[async_trait]
impl<E> ResolveModel for EntityResolver<E>
where
    E: EntityTrait,
    E::Model: Serialize,
    PrimaryKeyValue<E>: FromStr,
{
    async fn resolve(&self, _ctx: &RequestContext, mut args: Arguments) -> MutationResult<Arguments> {
        let raw = match args.value(&self.key) {
            None | Some(Value::Null) => return Ok(args),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(MutationError::invalid_argument(
                    self.key.clone(),
                    format!("expected an identifier, got {}", other),
                ))
            }
        };
        let id = parse_primary_key::<E>(&raw, self.is_global_id)?;
        let record = get_object_or_404::<E, _>(&self.db, id).await?;
        let value = serde_json::to_value(&record)
            .map_err(|err| MutationError::invalid_argument(self.key.clone(), err.to_string()))?;

        debug!(key = %self.key, target = %self.target, "resolved record argument");
        args.remove(&self.key);
        args.insert(self.target.clone(), Argument::Value(value));
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::to_global_id;
    use serde_json::json;

    #[tokio::test]
    async fn test_global_id_resolver_replaces_value() {
        let args = Arguments::new().with("note_id", json!(to_global_id("NoteType", 4)));
        let resolved = GlobalIdResolver::new("note_id")
            .resolve(&RequestContext::anonymous(), args)
            .await
            .unwrap();
        assert_eq!(resolved.value("note_id"), Some(&json!(4)));
    }

    #[tokio::test]
    async fn test_global_id_resolver_lists_and_target() {
        let args = Arguments::new().with(
            "ids",
            json!([to_global_id("NoteType", 1), to_global_id("NoteType", "x")]),
        );
        let resolved = GlobalIdResolver::new("ids")
            .into_key("note_ids")
            .resolve(&RequestContext::anonymous(), args)
            .await
            .unwrap();
        assert!(!resolved.contains("ids"));
        assert_eq!(resolved.value("note_ids"), Some(&json!([1, "x"])));
    }

    #[tokio::test]
    async fn test_global_id_resolver_checks_type() {
        let args = Arguments::new().with("note_id", json!(to_global_id("UserType", 4)));
        let result = GlobalIdResolver::new("note_id")
            .expect_type("NoteType")
            .resolve(&RequestContext::anonymous(), args)
            .await;
        assert!(matches!(result, Err(MutationError::InvalidGlobalId(_))));
    }

    #[tokio::test]
    async fn test_missing_key_is_left_alone() {
        let args = Arguments::new().with("title", json!("Minutes"));
        let resolved = GlobalIdResolver::new("note_id")
            .resolve(&RequestContext::anonymous(), args.clone())
            .await
            .unwrap();
        assert_eq!(resolved, args);
    }
}
