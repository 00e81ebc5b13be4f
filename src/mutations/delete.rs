//! Delete-mutation factory
//!
//! [`DeleteMutation`] describes a mutation deleting one or several records of a
//! sea-orm entity. Naming follows the model:
//!
//! | | single | multiple |
//! |---|---|---|
//! | mutation type | `Delete<Model>Mutation` | `Delete<Model>sMutation` |
//! | identifier key | `<model>_id` | `<model>_ids` |
//!
//! Unless permissions are given, the mutation requires an authenticated user
//! holding `<app_label>.delete_<model>`. The object-level checks of those
//! permissions are applied to every record before it is deleted, unless a
//! custom [`CheckPermissions`] hook replaces them.
//!
//! The mutation can be executed directly ([`DeleteMutation::execute`]) from a
//! static resolver, or exposed as a synthesized field of a dynamic schema
//! through [`super::MutationRegistry`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, Iterable, PrimaryKeyToColumn, QueryFilter,
};
use serde_json::Value;
use tracing::info;

use super::MutationPayload;
use crate::arguments::Arguments;
use crate::auth::RequestContext;
use crate::errors::{MutationError, MutationResult};
use crate::orm::{get_object_or_404, parse_primary_key, PrimaryKeyValue};
use crate::permissions::{IsAuthenticated, ModelPermission, PermissionSet};
use crate::pipeline::{MutationPipeline, MutationScope};
use crate::utils::{lower_camel, underscore};

/// Entities that can be deleted through a synthesized mutation
pub trait DeletableModel: EntityTrait {
    /// Model name in CamelCase, e.g. `DeliveryNote`
    const MODEL_NAME: &'static str;
    /// Application the model belongs to, prefix of its permission codenames
    const APP_LABEL: &'static str;
    /// Human readable description of the model
    const DESCRIPTION: &'static str;
}

/// Replaces the object-level permission checks for each record
pub type CheckPermissions<E> =
    Arc<dyn Fn(&RequestContext, &<E as EntityTrait>::Model) -> MutationResult<()> + Send + Sync>;

/// Side effect run on each record right before deletion
pub type AdditionalActions<E> =
    Arc<dyn Fn(&<E as EntityTrait>::Model) -> MutationResult<()> + Send + Sync>;

/// Identifiers sent to a delete mutation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteTarget {
    One(String),
    Many(Vec<String>),
}

impl DeleteTarget {
    fn to_value(&self) -> Value {
        match self {
            DeleteTarget::One(id) => Value::from(id.as_str()),
            DeleteTarget::Many(ids) => Value::from(ids.clone()),
        }
    }
}

#[derive(Clone)]
pub struct DeleteMutation<E: EntityTrait> {
    db: DatabaseConnection,
    permissions: Option<PermissionSet>,
    is_global_id: bool,
    is_multiple: bool,
    key: Option<String>,
    doc: Option<String>,
    description: Option<String>,
    field_name: Option<String>,
    check_permissions: Option<CheckPermissions<E>>,
    additional_actions: Option<AdditionalActions<E>>,
}

impl<E: DeletableModel> DeleteMutation<E> {
    /// Deletion of a single record
    pub fn single(db: DatabaseConnection) -> Self {
        Self {
            db,
            permissions: None,
            is_global_id: false,
            is_multiple: false,
            key: None,
            doc: None,
            description: None,
            field_name: None,
            check_permissions: None,
            additional_actions: None,
        }
    }

    /// Deletion of several records at once
    pub fn multiple(db: DatabaseConnection) -> Self {
        Self {
            is_multiple: true,
            ..Self::single(db)
        }
    }

    pub fn permissions(mut self, permissions: PermissionSet) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Identifiers are global ids
    pub fn global_id(mut self) -> Self {
        self.is_global_id = true;
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Name of the synthesized mutation field
    pub fn field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = Some(name.into());
        self
    }

    pub fn check_permissions<F>(mut self, check: F) -> Self
    where
        F: Fn(&RequestContext, &E::Model) -> MutationResult<()> + Send + Sync + 'static,
    {
        self.check_permissions = Some(Arc::new(check));
        self
    }

    pub fn additional_actions<F>(mut self, actions: F) -> Self
    where
        F: Fn(&E::Model) -> MutationResult<()> + Send + Sync + 'static,
    {
        self.additional_actions = Some(Arc::new(actions));
        self
    }

    pub fn is_multiple(&self) -> bool {
        self.is_multiple
    }

    pub fn is_global_id(&self) -> bool {
        self.is_global_id
    }

    /// `Delete<Model>Mutation` or `Delete<Model>sMutation`
    pub fn type_name(&self) -> String {
        if self.is_multiple {
            format!("Delete{}sMutation", E::MODEL_NAME)
        } else {
            format!("Delete{}Mutation", E::MODEL_NAME)
        }
    }

    /// Input key of the identifier field
    pub fn identifier_key(&self) -> String {
        if let Some(key) = &self.key {
            return key.clone();
        }
        let name = underscore(E::MODEL_NAME);
        if self.is_multiple {
            format!("{}_ids", name)
        } else {
            format!("{}_id", name)
        }
    }

    /// The identifier key as exposed in GraphQL
    pub fn graphql_key(&self) -> String {
        lower_camel(&self.identifier_key())
    }

    pub fn graphql_field_name(&self) -> String {
        self.field_name.clone().unwrap_or_else(|| {
            let name = self.type_name();
            lower_camel(name.strip_suffix("Mutation").unwrap_or(&name))
        })
    }

    pub fn doc_text(&self) -> String {
        self.doc.clone().unwrap_or_else(|| {
            if self.is_multiple {
                format!("Delete records of model \"{}\"", E::MODEL_NAME)
            } else {
                format!("Delete a record of model \"{}\"", E::MODEL_NAME)
            }
        })
    }

    pub fn description_text(&self) -> String {
        self.description.clone().unwrap_or_else(|| {
            if self.is_multiple {
                format!("Identifiers of model \"{}\"", E::DESCRIPTION)
            } else {
                format!("Identifier of model \"{}\"", E::DESCRIPTION)
            }
        })
    }

    /// Explicit permissions, or an authenticated user holding the model's
    /// delete permission
    pub fn effective_permissions(&self) -> PermissionSet {
        self.permissions.clone().unwrap_or_else(|| {
            PermissionSet::new().with(IsAuthenticated).with(ModelPermission::new(format!(
                "{}.delete_{}",
                E::APP_LABEL,
                E::MODEL_NAME.to_lowercase()
            )))
        })
    }
}

impl<E> DeleteMutation<E>
where
    E: DeletableModel,
    E::Model: Sync + 'static,
    PrimaryKeyValue<E>: FromStr + Clone + Into<sea_orm::Value>,
{
    /// Check permissions, resolve the target record(s), run the hooks and delete.
    ///
    /// `success` is true when at least one row was removed.
    pub async fn execute(&self, ctx: &RequestContext, target: DeleteTarget) -> MutationResult<MutationPayload> {
        let key = self.identifier_key();
        let args = Arguments::new().with(key.clone(), target.to_value());

        MutationPipeline::new()
            .permissions(self.effective_permissions())
            .run(ctx, args, |scope| async move {
                match (self.is_multiple, target) {
                    (false, DeleteTarget::One(id)) => self.delete_one(&scope, &id).await,
                    (true, DeleteTarget::Many(ids)) => self.delete_many(&scope, &ids).await,
                    (true, DeleteTarget::One(_)) => Err(MutationError::invalid_argument(
                        key,
                        "expected a list of identifiers",
                    )),
                    (false, DeleteTarget::Many(_)) => Err(MutationError::invalid_argument(
                        key,
                        "expected a single identifier",
                    )),
                }
            })
            .await
    }

    fn authorize(&self, scope: &MutationScope, record: &E::Model) -> MutationResult<()> {
        match &self.check_permissions {
            Some(check) => check(scope.context(), record),
            None => scope.check_object(record),
        }
    }

    fn run_actions(&self, record: &E::Model) -> MutationResult<()> {
        match &self.additional_actions {
            Some(actions) => actions(record),
            None => Ok(()),
        }
    }

    async fn delete_one(&self, scope: &MutationScope, raw_id: &str) -> MutationResult<MutationPayload> {
        let id = parse_primary_key::<E>(raw_id, self.is_global_id)?;
        let record = get_object_or_404::<E, _>(&self.db, id.clone()).await?;

        self.authorize(scope, &record)?;
        self.run_actions(&record)?;

        let result = E::delete_by_id(id).exec(&self.db).await?;
        info!(
            model = E::MODEL_NAME,
            id = raw_id,
            rows = result.rows_affected,
            "deleted record"
        );
        Ok(MutationPayload::from_success(result.rows_affected > 0))
    }

    async fn delete_many(&self, scope: &MutationScope, raw_ids: &[String]) -> MutationResult<MutationPayload> {
        let mut ids: Vec<PrimaryKeyValue<E>> = Vec::with_capacity(raw_ids.len());
        for raw in raw_ids {
            let id = parse_primary_key::<E>(raw, self.is_global_id)?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let column = primary_key_column::<E>()?;
        let records = E::find()
            .filter(column.is_in(ids.iter().cloned()))
            .all(&self.db)
            .await?;
        if records.len() != ids.len() {
            return Err(MutationError::not_found_multiple());
        }

        for record in &records {
            self.authorize(scope, record)?;
        }
        for record in &records {
            self.run_actions(record)?;
        }

        let result = E::delete_many()
            .filter(column.is_in(ids))
            .exec(&self.db)
            .await?;
        info!(
            model = E::MODEL_NAME,
            requested = raw_ids.len(),
            rows = result.rows_affected,
            "deleted records"
        );
        Ok(MutationPayload::from_success(result.rows_affected > 0))
    }
}

impl<E: DeletableModel> fmt::Debug for DeleteMutation<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeleteMutation")
            .field("type_name", &self.type_name())
            .field("key", &self.identifier_key())
            .field("is_global_id", &self.is_global_id)
            .field("permissions", &self.effective_permissions())
            .finish()
    }
}

fn primary_key_column<E: EntityTrait>() -> MutationResult<E::Column> {
    let mut keys = E::PrimaryKey::iter();
    match (keys.next(), keys.next()) {
        (Some(key), None) => Ok(key.into_column()),
        _ => Err(MutationError::invalid_argument(
            "id",
            "bulk deletion needs a single-column primary key",
        )),
    }
}
