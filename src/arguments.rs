//! Mutation arguments
//!
//! Arguments keep their declaration order. Uploaded files travel next to the
//! plain values but are never handed to validators.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{MutationError, MutationResult};
use crate::validation::ValidationData;

/// Metadata of a file uploaded together with a mutation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub size: u64,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content_type: Option<String>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            size,
        }
    }

    /// Read the metadata of an async-graphql upload
    pub fn from_upload(
        ctx: &async_graphql::Context<'_>,
        upload: &async_graphql::Upload,
    ) -> std::io::Result<Self> {
        let value = upload.value(ctx)?;
        let size = value.size()?;
        Ok(Self {
            filename: value.filename,
            content_type: value.content_type,
            size,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Argument {
    Value(Value),
    File(UploadedFile),
}

impl Argument {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Argument::Value(value) => Some(value),
            Argument::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            Argument::File(file) => Some(file),
            Argument::Value(_) => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Argument::File(_))
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Argument::Value(value)
    }
}

impl From<UploadedFile> for Argument {
    fn from(file: UploadedFile) -> Self {
        Argument::File(file)
    }
}

/// Named mutation arguments in declaration order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    values: IndexMap<String, Argument>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build arguments from a serializable input object
    pub fn from_input<T: Serialize>(input: &T) -> MutationResult<Self> {
        match serde_json::to_value(input) {
            Ok(Value::Object(map)) => Ok(Self::from(map)),
            Ok(other) => Err(MutationError::invalid_argument(
                "input",
                format!("expected an object, got {}", other),
            )),
            Err(err) => Err(MutationError::invalid_argument("input", err.to_string())),
        }
    }

    pub fn with(mut self, name: impl Into<String>, argument: impl Into<Argument>) -> Self {
        self.insert(name, argument);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, argument: impl Into<Argument>) -> Option<Argument> {
        self.values.insert(name.into(), argument.into())
    }

    pub fn get(&self, name: &str) -> Option<&Argument> {
        self.values.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Argument::as_value)
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.get(name).and_then(Argument::as_file)
    }

    pub fn remove(&mut self, name: &str) -> Option<Argument> {
        self.values.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Argument)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Deserialize one argument into a typed value
    pub fn parse<T: DeserializeOwned>(&self, name: &str) -> MutationResult<T> {
        let value = self
            .value(name)
            .ok_or_else(|| MutationError::invalid_argument(name, "missing"))?;
        serde_json::from_value(value.clone())
            .map_err(|err| MutationError::invalid_argument(name, err.to_string()))
    }

    /// Deserialize the plain (non-file) arguments as a whole
    pub fn deserialize<T: DeserializeOwned>(&self) -> MutationResult<T> {
        serde_json::from_value(Value::Object(self.validation_data()))
            .map_err(|err| MutationError::invalid_argument("input", err.to_string()))
    }

    /// Plain values only; uploaded files are dropped
    pub fn validation_data(&self) -> ValidationData {
        self.values
            .iter()
            .filter_map(|(name, argument)| argument.as_value().map(|v| (name.clone(), v.clone())))
            .collect()
    }
}

impl From<Map<String, Value>> for Arguments {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            values: map
                .into_iter()
                .map(|(name, value)| (name, Argument::Value(value)))
                .collect(),
        }
    }
}

impl FromIterator<(String, Argument)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (String, Argument)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
