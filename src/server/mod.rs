pub mod app;

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;
use sea_orm::DatabaseConnection;
use sea_orm_migration::prelude::*;
use tracing::info;

use crate::cache::{connect_counter_store, UserRegistry};
use crate::config::Config;
use crate::demo::{self, migrations::Migrator, DemoContext};
use crate::files::clear_models_files;
use crate::orm::establish_connection;

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

async fn connect(config: &Config) -> Result<DatabaseConnection> {
    let db = establish_connection(&config.database_url).await?;
    info!(url = %config.database_url, "connected to database");
    Ok(db)
}

pub async fn start_server(config: &Config) -> Result<()> {
    let db = connect(config).await?;

    Migrator::up(&db, None).await?;
    info!("Database migrations completed");

    let registry = UserRegistry::from_store(connect_counter_store(&config.redis).await);
    let context = DemoContext::new(
        db,
        registry,
        config.registration_key.clone(),
        config.media_root.clone(),
    );
    let app = app::create_app(demo::build_schema(context), config.cors_origin.as_deref())?;

    log_routes(config.port);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("Server running on http://0.0.0.0:{}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_routes(port: u16) {
    info!("API Endpoints:");
    info!("  /health                     - Health check");
    info!("  /graphql                    - GraphQL API (POST) & Playground (GET)");
    info!("Identity headers: x-user-id, x-user-roles, x-user-permissions (port {})", port);
}

pub async fn migrate_database(config: &Config, direction: MigrateDirection) -> Result<()> {
    let db = connect(config).await?;

    match direction {
        MigrateDirection::Up => {
            info!("Running migrations up");
            Migrator::up(&db, None).await?;
        }
        MigrateDirection::Down => {
            info!("Running migrations down");
            Migrator::down(&db, None).await?;
        }
        MigrateDirection::Fresh => {
            info!("Running fresh migrations (down then up)");
            Migrator::down(&db, None).await?;
            Migrator::up(&db, None).await?;
        }
    }

    info!("Database migration completed");
    Ok(())
}

/// Remove uploaded files no record refers to anymore
pub async fn clean_files(config: &Config, media_root: Option<&Path>) -> Result<usize> {
    let db = connect(config).await?;
    let media_root = media_root.unwrap_or(config.media_root.as_path());

    let summaries = clear_models_files(&db, media_root, &demo::file_models(), |deleted| {
        info!(
            "[{}.{}] removed {} ({}/{})",
            deleted.files_info.model,
            deleted.files_info.field,
            deleted.path,
            deleted.index + 1,
            deleted.files_info.delete_count
        );
    })
    .await?;

    let total = summaries.iter().map(|summary| summary.delete_count).sum();
    info!(total, "File cleanup completed");
    Ok(total)
}
