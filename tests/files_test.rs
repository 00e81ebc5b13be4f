//! Orphaned file cleanup tests

mod common;

use std::fs;
use std::path::Path;

use anyhow::Result;
use common::*;
use mutation_guard::demo::entities::notes;
use mutation_guard::demo::file_models;
use mutation_guard::errors::MutationError;
use mutation_guard::files::{
    clear_model_field_files, clear_model_files, clear_models_files, EntityFiles, ModelFiles,
};
use sea_orm::{ActiveModelTrait, Set};
use tempfile::TempDir;

fn touch(root: &Path, relative: &str) -> Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, relative.as_bytes())?;
    Ok(())
}

#[tokio::test]
async fn test_field_names() {
    let files = EntityFiles::<notes::Entity>::new();
    let names: Vec<String> = files.fields().into_iter().map(|field| field.name).collect();
    assert_eq!(files.model_name(), "Note");
    assert_eq!(names, vec!["attachment", "cover"]);
}

#[tokio::test]
async fn test_clear_model_files_keeps_referenced() -> Result<()> {
    let (db, _temp) = setup_test_db().await?;
    let media = TempDir::new()?;
    let note = create_note(&db, None, "Files").await?;
    let mut active: notes::ActiveModel = note.into();
    active.attachment = Set(Some("notes/attachments/kept.txt".to_string()));
    active.cover = Set(Some("notes/covers/2024/cover.png".to_string()));
    active.update(&db).await?;

    touch(media.path(), "notes/attachments/kept.txt")?;
    touch(media.path(), "notes/attachments/orphan.txt")?;
    touch(media.path(), "notes/covers/2024/cover.png")?;
    touch(media.path(), "notes/covers/2023/old.png")?;

    let mut removed = Vec::new();
    let summaries = clear_model_files(
        &db,
        media.path(),
        &EntityFiles::<notes::Entity>::new(),
        |deleted| removed.push(deleted.path.clone()),
    )
    .await?;

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].field, "attachment");
    assert_eq!(summaries[0].delete_count, 1);
    assert_eq!(summaries[1].field, "cover");
    assert_eq!(summaries[1].delete_count, 1);
    assert_eq!(
        removed,
        vec![
            "notes/attachments/orphan.txt".to_string(),
            "notes/covers/2023/old.png".to_string()
        ]
    );
    assert!(media.path().join("notes/attachments/kept.txt").exists());
    assert!(media.path().join("notes/covers/2024/cover.png").exists());
    Ok(())
}

#[tokio::test]
async fn test_clear_single_field() -> Result<()> {
    let (db, _temp) = setup_test_db().await?;
    let media = TempDir::new()?;
    touch(media.path(), "notes/attachments/orphan.txt")?;
    touch(media.path(), "notes/covers/orphan.png")?;

    let files = EntityFiles::<notes::Entity>::new();
    let summary = clear_model_field_files(&db, media.path(), &files, "attachment", |_| {}).await?;
    assert_eq!(summary.delete_count, 1);
    assert!(media.path().join("notes/covers/orphan.png").exists());

    let unknown = clear_model_field_files(&db, media.path(), &files, "title", |_| {}).await;
    assert!(matches!(unknown, Err(MutationError::InvalidArgument { .. })));
    Ok(())
}

#[tokio::test]
async fn test_clear_all_models_with_missing_directories() -> Result<()> {
    let (db, _temp) = setup_test_db().await?;
    let media = TempDir::new()?;
    touch(media.path(), "avatars/ghost.png")?;

    let mut indices = Vec::new();
    let summaries = clear_models_files(&db, media.path(), &file_models(), |deleted| {
        indices.push((deleted.files_info.model.clone(), deleted.index));
    })
    .await?;

    let total: usize = summaries.iter().map(|summary| summary.delete_count).sum();
    assert_eq!(summaries.len(), 3);
    assert_eq!(total, 1);
    assert_eq!(indices, vec![("User".to_string(), 0)]);
    assert!(!media.path().join("avatars/ghost.png").exists());
    Ok(())
}
