use std::path::{Path, PathBuf};

use async_graphql::{Context, Object, Result, Upload, ID};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use tracing::info;

use crate::arguments::{Arguments, UploadedFile};
use crate::auth::RequestContext;
use crate::demo::context::DemoContext;
use crate::demo::entities::notes;
use crate::demo::types::{AddNoteInput, ChangeNoteInput, NotePayload};
use crate::errors::{MutationError, MutationResult, ToGraphQLError};
use crate::mutations::{DeleteTarget, MutationPayload};
use crate::permissions::{IsAuthenticated, IsOwner};
use crate::pipeline::MutationPipeline;
use crate::resolve::EntityResolver;
use crate::validation::{RuleValidator, ValidationData};

const ATTACHMENT_DIR: &str = "notes/attachments";

fn note_rules() -> MutationResult<RuleValidator> {
    RuleValidator::new()
        .rule("title", "required|min_length:3|max_length:120")
        .and_then(|rules| rules.rule("body", "max_length:5000"))
        .map_err(|err| MutationError::invalid_argument("rules", err.to_string()))
}

#[derive(Default)]
pub struct NoteMutation;

#[Object]
impl NoteMutation {
    /// Create a note owned by the current user
    async fn add_note(&self, ctx: &Context<'_>, input: AddNoteInput) -> Result<NotePayload> {
        let context = ctx.data::<DemoContext>()?;
        let mut args = Arguments::new()
            .with("title", json!(input.title))
            .with("body", json!(input.body));
        if let Some(upload) = &input.attachment {
            let file = UploadedFile::from_upload(ctx, upload)
                .map_err(|err| MutationError::from(err).to_graphql_error())?;
            args.insert("attachment", file);
        }

        MutationPipeline::new()
            .permission(IsAuthenticated)
            .validator(note_rules().map_err(|err| err.to_graphql_error())?)
            .run_graphql(ctx, args, |scope| async move {
                let attachment = match &input.attachment {
                    Some(upload) => Some(store_upload(ctx, &context.media_root, upload).await?),
                    None => None,
                };
                let mut note = notes::ActiveModel::new();
                note.title = Set(scope.args().parse("title")?);
                note.body = Set(scope.args().parse("body")?);
                note.author_id = Set(scope.context().user_id());
                note.attachment = Set(attachment);

                let note = note.insert(&context.db).await?;
                info!(note = note.id, "created note");
                Ok(NotePayload::saved(note))
            })
            .await
    }

    /// Update title or body of an own note. Validation runs on the merged
    /// values.
    async fn change_note(&self, ctx: &Context<'_>, input: ChangeNoteInput) -> Result<NotePayload> {
        let context = ctx.data::<DemoContext>()?;
        let args = Arguments::from_input(&input).map_err(|err| err.to_graphql_error())?;

        MutationPipeline::new()
            .permission(IsAuthenticated)
            .permission(IsOwner::<notes::Model>::new())
            .resolve(EntityResolver::<notes::Entity>::new(context.db.clone(), "note_id").global())
            .validator(note_rules().map_err(|err| err.to_graphql_error())?)
            .deferred()
            .run_graphql(ctx, args, |scope| async move {
                let note: notes::Model = scope.args().parse("note")?;
                scope.check_object(&note)?;

                let title = changed(scope.args().value("title"), &note.title);
                let body = changed(scope.args().value("body"), &note.body);
                let mut data = ValidationData::new();
                data.insert("title".to_string(), Value::from(title.clone()));
                data.insert("body".to_string(), Value::from(body.clone()));
                scope.validate_data(&data)?;

                let mut active: notes::ActiveModel = note.into();
                active.title = Set(title);
                active.body = Set(body);
                let note = active.set_updated_at().update(&context.db).await?;
                info!(note = note.id, "changed note");
                Ok(NotePayload::saved(note))
            })
            .await
    }

    /// Delete an own note
    async fn delete_note(&self, ctx: &Context<'_>, note_id: ID) -> Result<MutationPayload> {
        let context = ctx.data::<DemoContext>()?;
        let request = RequestContext::from_graphql(ctx);
        Ok(context
            .delete_note
            .execute(&request, DeleteTarget::One(note_id.to_string()))
            .await
            .map_err(|err| err.to_graphql_error())?)
    }

    /// Delete several notes along with their files
    async fn delete_notes(&self, ctx: &Context<'_>, note_ids: Vec<ID>) -> Result<MutationPayload> {
        let context = ctx.data::<DemoContext>()?;
        let request = RequestContext::from_graphql(ctx);
        let ids = note_ids.into_iter().map(|id| id.to_string()).collect();
        Ok(context
            .delete_notes
            .execute(&request, DeleteTarget::Many(ids))
            .await
            .map_err(|err| err.to_graphql_error())?)
    }
}

/// The submitted value, or the current one when absent
fn changed(value: Option<&Value>, current: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        _ => current.to_string(),
    }
}

/// Copy an upload below the media root, returning its relative path
async fn store_upload(ctx: &Context<'_>, media_root: &Path, upload: &Upload) -> MutationResult<String> {
    let value = upload.value(ctx)?;
    let name = Path::new(&value.filename)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| MutationError::invalid_argument("attachment", "missing file name"))?;
    let relative = format!(
        "{}/{}_{}",
        ATTACHMENT_DIR,
        chrono::Utc::now().timestamp_millis(),
        name
    );
    let target: PathBuf = media_root.join(&relative);

    let mut content = value.content;
    tokio::task::spawn_blocking(move || -> std::io::Result<u64> {
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(&target)?;
        std::io::copy(&mut content, &mut file)
    })
    .await
    .map_err(std::io::Error::other)??;

    Ok(relative)
}
