use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

use crate::files::{FileField, FileModel};
use crate::mutations::DeletableModel;
use crate::permissions::Owned;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub author_id: Option<i32>,
    pub attachment: Option<String>,
    pub cover: Option<String>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AuthorId",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    Author,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new() -> Self {
        Self {
            id: ActiveValue::NotSet,
            title: ActiveValue::NotSet,
            body: Set(String::new()),
            author_id: ActiveValue::NotSet,
            attachment: Set(None),
            cover: Set(None),
            created_at: Set(chrono::Utc::now()),
            updated_at: Set(chrono::Utc::now()),
        }
    }

    pub fn set_updated_at(mut self) -> Self {
        self.updated_at = Set(chrono::Utc::now());
        self
    }
}

impl Owned for Model {
    fn owner_id(&self) -> Option<i32> {
        self.author_id
    }
}

impl DeletableModel for Entity {
    const MODEL_NAME: &'static str = "Note";
    const APP_LABEL: &'static str = "notes";
    const DESCRIPTION: &'static str = "Note";
}

impl FileModel for Entity {
    const MODEL_NAME: &'static str = "Note";

    fn file_fields() -> Vec<FileField<Self>> {
        vec![
            FileField::new(Column::Attachment, "notes/attachments"),
            FileField::new(Column::Cover, "notes/covers"),
        ]
    }
}
