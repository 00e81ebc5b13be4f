//! Removal of stored files no database record refers to
//!
//! File columns hold paths relative to a media root. A cleanup pass lists the
//! files under a column's upload directory, subtracts every path referenced by
//! any file column of the same model and deletes the rest.

use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, IdenStatic, QuerySelect};
use tracing::info;

use crate::errors::{MutationError, MutationResult};

/// A column storing file paths
#[derive(Clone, Debug)]
pub struct FileField<E: EntityTrait> {
    pub column: E::Column,
    /// Directory under the media root the files are uploaded to
    pub upload_to: PathBuf,
}

impl<E: EntityTrait> FileField<E> {
    pub fn new(column: E::Column, upload_to: impl Into<PathBuf>) -> Self {
        Self {
            column,
            upload_to: upload_to.into(),
        }
    }
}

/// Entities with file columns
pub trait FileModel: EntityTrait {
    const MODEL_NAME: &'static str;

    fn file_fields() -> Vec<FileField<Self>>;
}

/// Name and upload directory of a file column
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileFieldInfo {
    pub name: String,
    pub upload_to: PathBuf,
}

/// Summary of the files to remove for one model field
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteModelFilesInfo {
    pub model: String,
    pub field: String,
    pub delete_count: usize,
}

/// A removed file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletedFileInfo {
    pub files_info: DeleteModelFilesInfo,
    /// Path relative to the media root
    pub path: String,
    /// Position of the file within its field's removal batch
    pub index: usize,
}

/// Type-erased view on the file columns of a model
#[async_trait]
pub trait ModelFiles: Send + Sync {
    fn model_name(&self) -> &str;

    fn fields(&self) -> Vec<FileFieldInfo>;

    /// Paths referenced by any file column of the model
    async fn referenced_paths(&self, db: &DatabaseConnection) -> MutationResult<BTreeSet<String>>;
}

pub struct EntityFiles<E> {
    _entity: PhantomData<fn() -> E>,
}

impl<E> EntityFiles<E> {
    pub fn new() -> Self {
        Self {
            _entity: PhantomData,
        }
    }
}

impl<E> Default for EntityFiles<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: FileModel> ModelFiles for EntityFiles<E> {
    fn model_name(&self) -> &str {
        E::MODEL_NAME
    }

    fn fields(&self) -> Vec<FileFieldInfo> {
        E::file_fields()
            .into_iter()
            .map(|field| FileFieldInfo {
                name: field.column.as_str().to_string(),
                upload_to: field.upload_to,
            })
            .collect()
    }

    async fn referenced_paths(&self, db: &DatabaseConnection) -> MutationResult<BTreeSet<String>> {
        let mut paths = BTreeSet::new();
        for field in E::file_fields() {
            let values: Vec<Option<String>> = E::find()
                .select_only()
                .column(field.column)
                .into_tuple()
                .all(db)
                .await?;
            paths.extend(values.into_iter().flatten().filter(|path| !path.is_empty()));
        }
        Ok(paths)
    }
}

/// Remove the orphaned files of one file column
pub async fn clear_model_field_files<F>(
    db: &DatabaseConnection,
    media_root: &Path,
    model: &dyn ModelFiles,
    field_name: &str,
    mut callback: F,
) -> MutationResult<DeleteModelFilesInfo>
where
    F: FnMut(&DeletedFileInfo),
{
    let field = model
        .fields()
        .into_iter()
        .find(|field| field.name == field_name)
        .ok_or_else(|| {
            MutationError::invalid_argument(
                field_name,
                format!("not a file field of {}", model.model_name()),
            )
        })?;
    let referenced = model.referenced_paths(db).await?;
    clear_field(media_root, model.model_name(), &field, &referenced, &mut callback).await
}

/// Remove the orphaned files of every file column of a model
pub async fn clear_model_files<F>(
    db: &DatabaseConnection,
    media_root: &Path,
    model: &dyn ModelFiles,
    mut callback: F,
) -> MutationResult<Vec<DeleteModelFilesInfo>>
where
    F: FnMut(&DeletedFileInfo),
{
    let referenced = model.referenced_paths(db).await?;
    let mut summaries = Vec::new();
    for field in model.fields() {
        summaries.push(clear_field(media_root, model.model_name(), &field, &referenced, &mut callback).await?);
    }
    Ok(summaries)
}

/// Remove the orphaned files of several models
pub async fn clear_models_files<F>(
    db: &DatabaseConnection,
    media_root: &Path,
    models: &[Box<dyn ModelFiles>],
    mut callback: F,
) -> MutationResult<Vec<DeleteModelFilesInfo>>
where
    F: FnMut(&DeletedFileInfo),
{
    let mut summaries = Vec::new();
    for model in models {
        summaries.extend(clear_model_files(db, media_root, model.as_ref(), &mut callback).await?);
    }
    Ok(summaries)
}

async fn clear_field(
    media_root: &Path,
    model_name: &str,
    field: &FileFieldInfo,
    referenced: &BTreeSet<String>,
    callback: &mut dyn FnMut(&DeletedFileInfo),
) -> MutationResult<DeleteModelFilesInfo> {
    let existing = existing_paths(media_root, &field.upload_to).await?;
    let orphaned: Vec<String> = existing.difference(referenced).cloned().collect();

    let files_info = DeleteModelFilesInfo {
        model: model_name.to_string(),
        field: field.name.clone(),
        delete_count: orphaned.len(),
    };

    for (index, path) in orphaned.into_iter().enumerate() {
        tokio::fs::remove_file(media_root.join(&path)).await?;
        info!(model = model_name, field = %field.name, path = %path, "removed orphaned file");
        callback(&DeletedFileInfo {
            files_info: files_info.clone(),
            path,
            index,
        });
    }

    Ok(files_info)
}

/// Files under `media_root/upload_to`, as `/`-separated paths relative to the
/// media root
async fn existing_paths(media_root: &Path, upload_to: &Path) -> MutationResult<BTreeSet<String>> {
    let mut paths = BTreeSet::new();
    let base = media_root.join(upload_to);
    if !tokio::fs::try_exists(&base).await? {
        return Ok(paths);
    }

    let mut pending = vec![base];
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if let Ok(relative) = path.strip_prefix(media_root) {
                let parts: Vec<String> = relative
                    .components()
                    .map(|part| part.as_os_str().to_string_lossy().into_owned())
                    .collect();
                paths.insert(parts.join("/"));
            }
        }
    }
    Ok(paths)
}
