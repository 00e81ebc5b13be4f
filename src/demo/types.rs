use async_graphql::{InputObject, SimpleObject, Upload, ID};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::entities::{notes, users};
use crate::pipeline::Payload;
use crate::utils::to_global_id;
use crate::validation::ErrorField;

pub const NOTE_TYPE: &str = "NoteType";

#[derive(SimpleObject, Clone, Debug)]
pub struct Note {
    /// Global id
    pub id: ID,
    pub title: String,
    pub body: String,
    pub author_id: Option<i32>,
    pub attachment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<notes::Model> for Note {
    fn from(model: notes::Model) -> Self {
        Self {
            id: ID(to_global_id(NOTE_TYPE, model.id)),
            title: model.title,
            body: model.body,
            author_id: model.author_id,
            attachment: model.attachment,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            created_at: model.created_at,
        }
    }
}

#[derive(InputObject)]
pub struct AddNoteInput {
    pub title: String,
    pub body: String,
    pub attachment: Option<Upload>,
}

#[derive(InputObject, Serialize)]
pub struct ChangeNoteInput {
    /// Global id of the note
    pub note_id: ID,
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(InputObject, Serialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
}

#[derive(SimpleObject, Clone, Debug, Default)]
pub struct NotePayload {
    pub success: bool,
    pub errors: Vec<ErrorField>,
    pub note: Option<Note>,
}

impl NotePayload {
    pub fn saved(note: notes::Model) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            note: Some(note.into()),
        }
    }
}

impl Payload for NotePayload {
    fn failure(errors: Vec<ErrorField>) -> Self {
        Self {
            success: false,
            errors,
            note: None,
        }
    }
}

#[derive(SimpleObject, Clone, Debug, Default)]
pub struct UserPayload {
    pub success: bool,
    pub errors: Vec<ErrorField>,
    pub user: Option<User>,
}

impl Payload for UserPayload {
    fn failure(errors: Vec<ErrorField>) -> Self {
        Self {
            success: false,
            errors,
            user: None,
        }
    }
}
