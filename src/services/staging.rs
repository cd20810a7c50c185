use crate::utils::hash::content_digest;
use async_trait::async_trait;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("failed to create staging directory {}: {}", .path.display(), .source)]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to remove {}: {}", .path.display(), .source)]
    Remove { path: PathBuf, source: io::Error },

    #[error("failed to list {}: {}", .path.display(), .source)]
    List { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {}", .path.display(), .source)]
    Write { path: PathBuf, source: io::Error },
}

/// The document currently held in the staging area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StagedFile {
    pub filename: String,
    #[schema(value_type = String)]
    pub path: PathBuf,
    pub size: u64,
    pub sha256: String,
}

/// Outcome of clearing the staging area. Failures are per entry and never abort the reset.
#[derive(Debug, Default)]
pub struct ResetReport {
    pub removed: usize,
    pub failures: Vec<StagingError>,
}

impl ResetReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Trait for the staging area backing one analysis session
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Directory the store writes into
    fn root(&self) -> &Path;

    /// Create the staging directory if needed and delete everything under it
    async fn reset(&self) -> ResetReport;

    /// Write `content` to `<root>/<filename>`, replacing any file of the same name
    async fn store(&self, filename: &str, content: &[u8]) -> Result<StagedFile, StagingError>;

    /// Regular files directly under the root, in directory-listing order
    async fn list_files(&self) -> Result<Vec<PathBuf>, StagingError>;
}

/// Staging area on the local filesystem
pub struct LocalStaging {
    root: PathBuf,
}

impl LocalStaging {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn ensure_root(&self) -> Result<(), StagingError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StagingError::CreateDir {
                path: self.root.clone(),
                source,
            })
    }
}

/// Removes one directory entry without following symlinks
async fn remove_entry(path: &Path) -> io::Result<()> {
    let metadata = tokio::fs::symlink_metadata(path).await?;
    if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    }
}

#[async_trait]
impl StagingStore for LocalStaging {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn reset(&self) -> ResetReport {
        let mut report = ResetReport::default();

        if let Err(e) = self.ensure_root().await {
            report.failures.push(e);
            return report;
        }

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(source) => {
                report.failures.push(StagingError::List {
                    path: self.root.clone(),
                    source,
                });
                return report;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => {
                    report.failures.push(StagingError::List {
                        path: self.root.clone(),
                        source,
                    });
                    break;
                }
            };

            let path = entry.path();
            match remove_entry(&path).await {
                Ok(()) => report.removed += 1,
                Err(source) => {
                    tracing::warn!("Could not remove staged entry {}: {}", path.display(), source);
                    report.failures.push(StagingError::Remove { path, source });
                }
            }
        }

        tracing::debug!(
            "Staging reset in {}: removed {}, failed {}",
            self.root.display(),
            report.removed,
            report.failures.len()
        );
        report
    }

    async fn store(&self, filename: &str, content: &[u8]) -> Result<StagedFile, StagingError> {
        self.ensure_root().await?;

        let root = self.root.clone();
        let target = self.root.join(filename);
        let data = content.to_vec();

        let write_target = target.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StagingError> {
            let write_err = |source: io::Error| StagingError::Write {
                path: write_target.clone(),
                source,
            };

            // Written beside the target and renamed over it, so readers never see a partial file
            let mut temp_file = NamedTempFile::new_in(&root).map_err(write_err)?;
            temp_file.write_all(&data).map_err(write_err)?;
            temp_file.as_file().sync_all().map_err(write_err)?;
            temp_file
                .persist(&write_target)
                .map_err(|e| write_err(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| StagingError::Write {
            path: target.clone(),
            source: io::Error::other(e),
        })??;

        let staged = StagedFile {
            filename: filename.to_string(),
            path: target,
            size: content.len() as u64,
            sha256: content_digest(content),
        };

        tracing::info!(
            "Staged {} ({} bytes, sha256 {})",
            staged.path.display(),
            staged.size,
            staged.sha256
        );
        Ok(staged)
    }

    async fn list_files(&self) -> Result<Vec<PathBuf>, StagingError> {
        let list_err = |source: io::Error| StagingError::List {
            path: self.root.clone(),
            source,
        };

        if !tokio::fs::try_exists(&self.root).await.map_err(list_err)? {
            return Ok(Vec::new());
        }

        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(list_err)?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
            let path = entry.path();
            // Follows symlinks; a dangling link is not a regular file
            if tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false)
            {
                files.push(path);
            }
        }

        Ok(files)
    }
}
