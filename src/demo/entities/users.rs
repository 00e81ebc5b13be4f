use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

use crate::files::{FileField, FileModel};
use crate::mutations::DeletableModel;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::notes::Entity")]
    Notes,
}

impl Related<super::notes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new() -> Self {
        Self {
            id: ActiveValue::NotSet,
            username: ActiveValue::NotSet,
            email: ActiveValue::NotSet,
            avatar: Set(None),
            created_at: Set(chrono::Utc::now()),
        }
    }
}

impl DeletableModel for Entity {
    const MODEL_NAME: &'static str = "User";
    const APP_LABEL: &'static str = "accounts";
    const DESCRIPTION: &'static str = "User account";
}

impl FileModel for Entity {
    const MODEL_NAME: &'static str = "User";

    fn file_fields() -> Vec<FileField<Self>> {
        vec![FileField::new(Column::Avatar, "avatars")]
    }
}
