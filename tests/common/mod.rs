#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use mutation_guard::auth::{Actor, RequestContext};
use mutation_guard::cache::{MemoryCounterStore, UserRegistry};
use mutation_guard::demo::entities::{notes, users};
use mutation_guard::demo::migrations::Migrator;
use mutation_guard::demo::DemoContext;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use tempfile::{NamedTempFile, TempDir};

pub const REGISTRATION_KEY: &str = "registered_users";

/// Create a test database connection with migrations
pub async fn setup_test_db() -> Result<(DatabaseConnection, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let db_url = format!("sqlite://{}?mode=rwc", temp_file.path().display());

    let db = Database::connect(&db_url).await?;
    Migrator::up(&db, None).await?;

    Ok((db, temp_file))
}

pub struct TestApp {
    pub db: DatabaseConnection,
    pub context: DemoContext,
    pub store: Arc<MemoryCounterStore>,
    pub media: TempDir,
    _db_file: NamedTempFile,
}

pub async fn setup_test_app() -> Result<TestApp> {
    let (db, db_file) = setup_test_db().await?;
    let media = TempDir::new()?;
    let store = Arc::new(MemoryCounterStore::new());
    let context = DemoContext::new(
        db.clone(),
        UserRegistry::new(store.clone()),
        REGISTRATION_KEY,
        media.path(),
    );
    Ok(TestApp {
        db,
        context,
        store,
        media,
        _db_file: db_file,
    })
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> Result<users::Model> {
    let mut user = users::ActiveModel::new();
    user.username = Set(username.to_string());
    user.email = Set(format!("{}@example.com", username));
    Ok(user.insert(db).await?)
}

pub async fn create_note(
    db: &DatabaseConnection,
    author: Option<&users::Model>,
    title: &str,
) -> Result<notes::Model> {
    let mut note = notes::ActiveModel::new();
    note.title = Set(title.to_string());
    note.body = Set(format!("Body of {}", title));
    note.author_id = Set(author.map(|user| user.id));
    Ok(note.insert(db).await?)
}

pub fn as_user(user: &users::Model) -> RequestContext {
    RequestContext::new(Actor::user(user.id))
}

pub fn with_scopes(user: &users::Model, scopes: &[&str]) -> RequestContext {
    let actor = scopes
        .iter()
        .fold(Actor::user(user.id), |actor, scope| actor.with_scope(*scope));
    RequestContext::new(actor)
}
