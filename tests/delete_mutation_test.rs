//! Delete mutation factory tests
//!
//! Naming, permission defaults, single and multiple deletion against SQLite,
//! and the synthesized fields of a dynamic schema.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_graphql::dynamic::{Field, FieldFuture, Object, Schema, TypeRef};
use async_graphql::{Request, Value};
use common::*;
use mutation_guard::auth::{Actor, RequestContext};
use mutation_guard::demo::entities::{notes, users};
use mutation_guard::errors::MutationError;
use mutation_guard::mutations::{DeleteMutation, DeleteTarget, MutationRegistry};
use mutation_guard::permissions::{AllowAny, IsAuthenticated, IsOwner, PermissionSet};
use mutation_guard::utils::to_global_id;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use serde_json::json;

fn gid(note: &notes::Model) -> String {
    to_global_id("NoteType", note.id)
}

async fn note_count(db: &DatabaseConnection) -> Result<u64> {
    Ok(notes::Entity::find().count(db).await?)
}

#[tokio::test]
async fn test_naming_defaults() -> Result<()> {
    let (db, _temp) = setup_test_db().await?;

    let single = DeleteMutation::<notes::Entity>::single(db.clone());
    assert_eq!(single.type_name(), "DeleteNoteMutation");
    assert_eq!(single.identifier_key(), "note_id");
    assert_eq!(single.graphql_key(), "noteId");
    assert_eq!(single.graphql_field_name(), "deleteNote");

    let multiple = DeleteMutation::<notes::Entity>::multiple(db.clone());
    assert_eq!(multiple.type_name(), "DeleteNotesMutation");
    assert_eq!(multiple.identifier_key(), "note_ids");
    assert_eq!(multiple.graphql_field_name(), "deleteNotes");

    let custom = DeleteMutation::<users::Entity>::single(db)
        .key("account_id")
        .field_name("removeAccount");
    assert_eq!(custom.graphql_key(), "accountId");
    assert_eq!(custom.graphql_field_name(), "removeAccount");
    assert_eq!(
        custom.effective_permissions().names(),
        vec!["IsAuthenticated", "accounts.delete_user"]
    );
    Ok(())
}

#[tokio::test]
async fn test_default_permissions_require_codename() -> Result<()> {
    let (db, _temp) = setup_test_db().await?;
    let user = create_user(&db, "alice").await?;
    let note = create_note(&db, Some(&user), "First").await?;
    let mutation = DeleteMutation::<notes::Entity>::single(db.clone());

    let anonymous = mutation
        .execute(&RequestContext::anonymous(), DeleteTarget::One(note.id.to_string()))
        .await;
    assert!(matches!(anonymous, Err(MutationError::PermissionDenied(_))));

    let no_scope = mutation
        .execute(&as_user(&user), DeleteTarget::One(note.id.to_string()))
        .await;
    assert!(matches!(no_scope, Err(MutationError::PermissionDenied(_))));
    assert_eq!(note_count(&db).await?, 1);

    let payload = mutation
        .execute(
            &with_scopes(&user, &["notes.delete_note"]),
            DeleteTarget::One(note.id.to_string()),
        )
        .await?;
    assert!(payload.success);
    assert!(payload.errors.is_empty());
    assert_eq!(note_count(&db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_single_delete_by_global_id_owner_only() -> Result<()> {
    let app = setup_test_app().await?;
    let alice = create_user(&app.db, "alice").await?;
    let bob = create_user(&app.db, "bob").await?;
    let note = create_note(&app.db, Some(&alice), "Alice's").await?;

    let denied = app
        .context
        .delete_note
        .execute(&as_user(&bob), DeleteTarget::One(gid(&note)))
        .await;
    assert!(matches!(denied, Err(MutationError::PermissionDenied(_))));
    assert_eq!(note_count(&app.db).await?, 1);

    let payload = app
        .context
        .delete_note
        .execute(&as_user(&alice), DeleteTarget::One(gid(&note)))
        .await?;
    assert!(payload.success);
    assert_eq!(note_count(&app.db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_superuser_may_delete_any_note() -> Result<()> {
    let app = setup_test_app().await?;
    let alice = create_user(&app.db, "alice").await?;
    let note = create_note(&app.db, Some(&alice), "Alice's").await?;
    let admin = RequestContext::new(Actor::user(999).with_role("admin"));

    let payload = app
        .context
        .delete_note
        .execute(&admin, DeleteTarget::One(gid(&note)))
        .await?;
    assert!(payload.success);
    Ok(())
}

#[tokio::test]
async fn test_single_delete_missing_and_malformed() -> Result<()> {
    let app = setup_test_app().await?;
    let alice = create_user(&app.db, "alice").await?;

    let missing = app
        .context
        .delete_note
        .execute(&as_user(&alice), DeleteTarget::One(to_global_id("NoteType", 404)))
        .await;
    assert!(matches!(missing, Err(MutationError::NotFound(_))));

    let malformed = app
        .context
        .delete_note
        .execute(&as_user(&alice), DeleteTarget::One("not base64!".to_string()))
        .await;
    assert!(matches!(malformed, Err(MutationError::InvalidGlobalId(_))));

    let wrong_shape = app
        .context
        .delete_note
        .execute(&as_user(&alice), DeleteTarget::Many(vec![]))
        .await;
    assert!(matches!(wrong_shape, Err(MutationError::InvalidArgument { .. })));
    Ok(())
}

#[tokio::test]
async fn test_multiple_delete() -> Result<()> {
    let app = setup_test_app().await?;
    let alice = create_user(&app.db, "alice").await?;
    let first = create_note(&app.db, Some(&alice), "First").await?;
    let second = create_note(&app.db, Some(&alice), "Second").await?;
    let kept = create_note(&app.db, Some(&alice), "Kept").await?;
    let ctx = with_scopes(&alice, &["notes.delete_note"]);

    let payload = app
        .context
        .delete_notes
        .execute(
            &ctx,
            DeleteTarget::Many(vec![gid(&first), gid(&second), gid(&first)]),
        )
        .await?;
    assert!(payload.success);

    let remaining = notes::Entity::find().all(&app.db).await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, kept.id);
    Ok(())
}

#[tokio::test]
async fn test_multiple_delete_is_all_or_nothing() -> Result<()> {
    let app = setup_test_app().await?;
    let alice = create_user(&app.db, "alice").await?;
    let note = create_note(&app.db, Some(&alice), "Present").await?;
    let ctx = with_scopes(&alice, &["notes.delete_note"]);

    let result = app
        .context
        .delete_notes
        .execute(
            &ctx,
            DeleteTarget::Many(vec![gid(&note), to_global_id("NoteType", 12345)]),
        )
        .await;

    assert!(matches!(result, Err(MutationError::NotFoundMultiple(_))));
    assert_eq!(note_count(&app.db).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_multiple_delete_checks_every_record() -> Result<()> {
    let app = setup_test_app().await?;
    let alice = create_user(&app.db, "alice").await?;
    let bob = create_user(&app.db, "bob").await?;
    let own = create_note(&app.db, Some(&alice), "Alice's").await?;
    let other = create_note(&app.db, Some(&bob), "Bob's").await?;
    let mutation = DeleteMutation::<notes::Entity>::multiple(app.db.clone())
        .global_id()
        .permissions(
            PermissionSet::new()
                .with(IsAuthenticated)
                .with(IsOwner::<notes::Model>::new()),
        );

    let result = mutation
        .execute(&as_user(&alice), DeleteTarget::Many(vec![gid(&own), gid(&other)]))
        .await;
    assert!(matches!(result, Err(MutationError::PermissionDenied(_))));
    assert_eq!(note_count(&app.db).await?, 2);

    let payload = mutation
        .execute(&as_user(&alice), DeleteTarget::Many(vec![gid(&own)]))
        .await?;
    assert!(payload.success);
    assert_eq!(note_count(&app.db).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_multiple_delete_without_ids() -> Result<()> {
    let app = setup_test_app().await?;
    let alice = create_user(&app.db, "alice").await?;
    create_note(&app.db, Some(&alice), "Kept").await?;
    let ctx = with_scopes(&alice, &["notes.delete_note"]);

    let payload = app
        .context
        .delete_notes
        .execute(&ctx, DeleteTarget::Many(vec![]))
        .await?;
    assert!(!payload.success);
    assert!(payload.errors.is_empty());
    assert_eq!(note_count(&app.db).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_multiple_delete_removes_attachments() -> Result<()> {
    let app = setup_test_app().await?;
    let alice = create_user(&app.db, "alice").await?;
    let note = create_note(&app.db, Some(&alice), "With file").await?;

    let relative = "notes/attachments/report.txt";
    std::fs::create_dir_all(app.media.path().join("notes/attachments"))?;
    std::fs::write(app.media.path().join(relative), b"report")?;
    let mut active: notes::ActiveModel = note.clone().into();
    active.attachment = sea_orm::Set(Some(relative.to_string()));
    sea_orm::ActiveModelTrait::update(active, &app.db).await?;

    let payload = app
        .context
        .delete_notes
        .execute(
            &with_scopes(&alice, &["notes.delete_note"]),
            DeleteTarget::Many(vec![gid(&note)]),
        )
        .await?;

    assert!(payload.success);
    assert!(!app.media.path().join(relative).exists());
    Ok(())
}

#[tokio::test]
async fn test_custom_hooks() -> Result<()> {
    let (db, _temp) = setup_test_db().await?;
    let alice = create_user(&db, "alice").await?;
    let note = create_note(&db, Some(&alice), "Hooked").await?;
    let calls = Arc::new(AtomicUsize::new(0));

    let mutation = DeleteMutation::<notes::Entity>::single(db.clone())
        .permissions(PermissionSet::new().with(AllowAny))
        .check_permissions(|_ctx: &RequestContext, note: &notes::Model| {
            if note.title == "Locked" {
                Err(MutationError::permission_denied())
            } else {
                Ok(())
            }
        })
        .additional_actions({
            let calls = calls.clone();
            move |_note: &notes::Model| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

    let locked = create_note(&db, None, "Locked").await?;
    let denied = mutation
        .execute(&RequestContext::anonymous(), DeleteTarget::One(locked.id.to_string()))
        .await;
    assert!(matches!(denied, Err(MutationError::PermissionDenied(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let payload = mutation
        .execute(&RequestContext::anonymous(), DeleteTarget::One(note.id.to_string()))
        .await?;
    assert!(payload.success);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_failing_action_aborts_deletion() -> Result<()> {
    let (db, _temp) = setup_test_db().await?;
    let note = create_note(&db, None, "Stays").await?;

    let mutation = DeleteMutation::<notes::Entity>::single(db.clone())
        .permissions(PermissionSet::new().with(AllowAny))
        .additional_actions(|_note: &notes::Model| {
            Err(MutationError::invalid_argument("note_id", "note is archived"))
        });

    let result = mutation
        .execute(&RequestContext::anonymous(), DeleteTarget::One(note.id.to_string()))
        .await;
    assert!(matches!(result, Err(MutationError::InvalidArgument { .. })));
    assert_eq!(note_count(&db).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_delete_user_only_self() -> Result<()> {
    let app = setup_test_app().await?;
    let alice = create_user(&app.db, "alice").await?;
    let bob = create_user(&app.db, "bob").await?;

    let denied = app
        .context
        .delete_user
        .execute(
            &with_scopes(&alice, &["accounts.delete_user"]),
            DeleteTarget::One(bob.id.to_string()),
        )
        .await;
    assert!(matches!(denied, Err(MutationError::PermissionDenied(_))));

    let payload = app
        .context
        .delete_user
        .execute(
            &with_scopes(&alice, &["accounts.delete_user"]),
            DeleteTarget::One(alice.id.to_string()),
        )
        .await?;
    assert!(payload.success);
    assert_eq!(users::Entity::find().count(&app.db).await?, 1);
    Ok(())
}

fn dynamic_schema(registry: &MutationRegistry) -> Result<Schema> {
    let query = Object::new("Query").field(Field::new(
        "version",
        TypeRef::named_nn(TypeRef::STRING),
        |_| FieldFuture::new(async { Ok(Some(Value::from("1"))) }),
    ));
    let (builder, mutation) = registry.install(
        Schema::build("Query", Some("Mutation"), None),
        Object::new("Mutation"),
    );
    Ok(builder.register(query).register(mutation).finish()?)
}

#[tokio::test]
async fn test_dynamic_schema_fields() -> Result<()> {
    let app = setup_test_app().await?;
    let registry = app.context.dynamic_mutations();
    assert_eq!(
        registry.field_names(),
        vec!["deleteNote", "deleteNotes", "deleteUser"]
    );

    let schema = dynamic_schema(&registry)?;
    let sdl = schema.sdl();
    assert!(sdl.contains("input DeleteNoteMutationInput"));
    assert!(sdl.contains("type DeleteNotesMutationPayload"));
    assert!(sdl.contains("type ErrorFieldType"));
    Ok(())
}

#[tokio::test]
async fn test_dynamic_schema_execution() -> Result<()> {
    let app = setup_test_app().await?;
    let alice = create_user(&app.db, "alice").await?;
    let bob = create_user(&app.db, "bob").await?;
    let note = create_note(&app.db, Some(&alice), "Dynamic").await?;
    let schema = dynamic_schema(&app.context.dynamic_mutations())?;
    let query = format!(
        r#"mutation {{ deleteNote(input: {{ noteId: "{}" }}) {{ success errors {{ field messages }} }} }}"#,
        gid(&note)
    );

    let denied = schema
        .execute(Request::new(query.clone()).data(as_user(&bob)))
        .await;
    assert_eq!(denied.errors.len(), 1);
    assert_eq!(
        denied.errors[0].message,
        "You do not have permission to perform this action"
    );

    let response = schema
        .execute(Request::new(query).data(as_user(&alice)))
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json()?,
        json!({ "deleteNote": { "success": true, "errors": [] } })
    );
    assert_eq!(note_count(&app.db).await?, 0);
    Ok(())
}
