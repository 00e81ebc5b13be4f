//! Synthesized GraphQL types for delete mutations
//!
//! Each registered mutation contributes an input object, a payload object and
//! a field on the mutation root of an `async_graphql::dynamic` schema:
//!
//! ```graphql
//! input DeleteNoteMutationInput { noteId: ID! }
//! type DeleteNoteMutationPayload { success: Boolean! errors: [ErrorFieldType!]! }
//! type Mutation { deleteNote(input: DeleteNoteMutationInput!): DeleteNoteMutationPayload! }
//! ```

use std::str::FromStr;
use std::sync::Arc;

use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputObject, InputValue, Object, SchemaBuilder, TypeRef,
    ValueAccessor,
};
use async_graphql::Value;

use super::delete::{DeletableModel, DeleteMutation, DeleteTarget};
use super::MutationPayload;
use crate::auth::RequestContext;
use crate::errors::ToGraphQLError;
use crate::orm::PrimaryKeyValue;
use crate::validation::ErrorField;

pub const ERROR_FIELD_TYPE: &str = "ErrorFieldType";

/// A mutation that can describe itself as dynamic GraphQL types
pub trait DynamicMutation: Send + Sync {
    fn field_name(&self) -> String;

    fn input_type(&self) -> InputObject;

    fn payload_type(&self) -> Object;

    fn field(self: Arc<Self>) -> Field;
}

impl<E> DynamicMutation for DeleteMutation<E>
where
    E: DeletableModel,
    E::Model: Sync + 'static,
    PrimaryKeyValue<E>: FromStr + Clone + Into<sea_orm::Value>,
{
    fn field_name(&self) -> String {
        self.graphql_field_name()
    }

    fn input_type(&self) -> InputObject {
        let id_type = if self.is_multiple() {
            TypeRef::named_nn_list_nn(TypeRef::ID)
        } else {
            TypeRef::named_nn(TypeRef::ID)
        };
        InputObject::new(input_type_name(&self.type_name())).field(
            InputValue::new(self.graphql_key(), id_type).description(self.description_text()),
        )
    }

    fn payload_type(&self) -> Object {
        payload_object(&payload_type_name(&self.type_name()))
    }

    fn field(self: Arc<Self>) -> Field {
        let type_name = self.type_name();
        let doc = self.doc_text();
        let mutation = Arc::clone(&self);

        Field::new(
            self.graphql_field_name(),
            TypeRef::named_nn(payload_type_name(&type_name)),
            move |ctx| {
                let mutation = Arc::clone(&mutation);
                FieldFuture::new(async move {
                    let request = RequestContext::from_graphql(ctx.ctx);
                    let input = ctx.args.try_get("input")?.object()?;
                    let raw = input.try_get(&mutation.graphql_key())?;
                    let target = if mutation.is_multiple() {
                        DeleteTarget::Many(
                            raw.list()?
                                .iter()
                                .map(|item| identifier_text(&item))
                                .collect::<async_graphql::Result<Vec<_>>>()?,
                        )
                    } else {
                        DeleteTarget::One(identifier_text(&raw)?)
                    };

                    let payload = mutation
                        .execute(&request, target)
                        .await
                        .map_err(|err| err.to_graphql_error())?;
                    Ok(Some(FieldValue::owned_any(payload)))
                })
            },
        )
        .argument(InputValue::new(
            "input",
            TypeRef::named_nn(input_type_name(&type_name)),
        ))
        .description(doc)
    }
}

/// Collects synthesized mutations and installs them on a dynamic schema
#[derive(Clone, Default)]
pub struct MutationRegistry {
    mutations: Vec<Arc<dyn DynamicMutation>>,
}

impl MutationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, mutation: impl DynamicMutation + 'static) -> Self {
        self.mutations.push(Arc::new(mutation));
        self
    }

    pub fn field_names(&self) -> Vec<String> {
        self.mutations.iter().map(|m| m.field_name()).collect()
    }

    /// Register the shared error type plus every mutation's input and payload
    /// types, and add the mutation fields to `mutation_root`.
    pub fn install(&self, builder: SchemaBuilder, mutation_root: Object) -> (SchemaBuilder, Object) {
        let mut builder = builder.register(error_field_object());
        let mut root = mutation_root;
        for mutation in &self.mutations {
            builder = builder
                .register(mutation.input_type())
                .register(mutation.payload_type());
            root = root.field(Arc::clone(mutation).field());
        }
        (builder, root)
    }
}

fn input_type_name(type_name: &str) -> String {
    format!("{}Input", type_name)
}

fn payload_type_name(type_name: &str) -> String {
    format!("{}Payload", type_name)
}

fn identifier_text(value: &ValueAccessor<'_>) -> async_graphql::Result<String> {
    match value.as_value() {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(format!("Invalid identifier: {}", other).into()),
    }
}

fn payload_object(name: &str) -> Object {
    Object::new(name)
        .field(Field::new(
            "success",
            TypeRef::named_nn(TypeRef::BOOLEAN),
            |ctx| {
                FieldFuture::new(async move {
                    let payload = ctx.parent_value.try_downcast_ref::<MutationPayload>()?;
                    Ok(Some(Value::from(payload.success)))
                })
            },
        ))
        .field(Field::new(
            "errors",
            TypeRef::named_nn_list_nn(ERROR_FIELD_TYPE),
            |ctx| {
                FieldFuture::new(async move {
                    let payload = ctx.parent_value.try_downcast_ref::<MutationPayload>()?;
                    Ok(Some(FieldValue::list(
                        payload.errors.iter().cloned().map(FieldValue::owned_any),
                    )))
                })
            },
        ))
}

fn error_field_object() -> Object {
    Object::new(ERROR_FIELD_TYPE)
        .field(Field::new(
            "field",
            TypeRef::named_nn(TypeRef::STRING),
            |ctx| {
                FieldFuture::new(async move {
                    let error = ctx.parent_value.try_downcast_ref::<ErrorField>()?;
                    Ok(Some(Value::from(error.field.as_str())))
                })
            },
        ))
        .field(Field::new(
            "messages",
            TypeRef::named_nn_list_nn(TypeRef::STRING),
            |ctx| {
                FieldFuture::new(async move {
                    let error = ctx.parent_value.try_downcast_ref::<ErrorField>()?;
                    Ok(Some(Value::List(
                        error
                            .messages
                            .iter()
                            .map(|message| Value::from(message.as_str()))
                            .collect(),
                    )))
                })
            },
        ))
}
