use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::info;

use super::entities::{notes, users};
use crate::auth::RequestContext;
use crate::cache::UserRegistry;
use crate::errors::MutationError;
use crate::mutations::{DeleteMutation, MutationRegistry};
use crate::permissions::{IsAuthenticated, IsOwner, PermissionSet};

#[derive(Clone)]
pub struct DemoContext {
    pub db: DatabaseConnection,
    pub registry: UserRegistry,
    pub registration_key: String,
    pub media_root: PathBuf,
    pub delete_note: Arc<DeleteMutation<notes::Entity>>,
    pub delete_notes: Arc<DeleteMutation<notes::Entity>>,
    pub delete_user: Arc<DeleteMutation<users::Entity>>,
}

impl DemoContext {
    pub fn new(
        db: DatabaseConnection,
        registry: UserRegistry,
        registration_key: impl Into<String>,
        media_root: impl Into<PathBuf>,
    ) -> Self {
        let media_root = media_root.into();
        Self {
            delete_note: Arc::new(delete_note(db.clone())),
            delete_notes: Arc::new(delete_notes(db.clone(), media_root.clone())),
            delete_user: Arc::new(delete_user(db.clone())),
            db,
            registry,
            registration_key: registration_key.into(),
            media_root,
        }
    }

    /// The delete mutations as fields of a dynamic schema
    pub fn dynamic_mutations(&self) -> MutationRegistry {
        MutationRegistry::new()
            .with(self.delete_note.as_ref().clone())
            .with(self.delete_notes.as_ref().clone())
            .with(self.delete_user.as_ref().clone())
    }
}

/// Authors delete their own notes by global id
fn delete_note(db: DatabaseConnection) -> DeleteMutation<notes::Entity> {
    DeleteMutation::single(db)
        .global_id()
        .permissions(
            PermissionSet::new()
                .with(IsAuthenticated)
                .with(IsOwner::<notes::Model>::new()),
        )
}

/// Bulk deletion with the default `notes.delete_note` permission, removing
/// the attachments along with the records
fn delete_notes(db: DatabaseConnection, media_root: PathBuf) -> DeleteMutation<notes::Entity> {
    DeleteMutation::multiple(db)
        .global_id()
        .additional_actions(move |note: &notes::Model| {
            for path in [&note.attachment, &note.cover].into_iter().flatten() {
                remove_media_file(&media_root, path)?;
            }
            Ok(())
        })
}

/// Account removal: holders of `accounts.delete_user` may only remove
/// themselves unless they are superusers
fn delete_user(db: DatabaseConnection) -> DeleteMutation<users::Entity> {
    DeleteMutation::single(db)
        .doc("Delete a user account")
        .check_permissions(|ctx: &RequestContext, user: &users::Model| {
            if ctx.actor.is_superuser() || ctx.user_id() == Some(user.id) {
                Ok(())
            } else {
                Err(MutationError::permission_denied())
            }
        })
}

fn remove_media_file(media_root: &Path, path: &str) -> Result<(), MutationError> {
    match std::fs::remove_file(media_root.join(path)) {
        Ok(()) => {
            info!(path, "removed media file");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
