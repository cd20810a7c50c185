use crate::config::AppConfig;
use crate::services::dispatcher::QueryDispatcher;
use crate::services::qa::{QaService, ServiceError};
use crate::services::staging::{StagedFile, StagingError, StagingStore};
use crate::utils::validation::validate_document;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use utoipa::ToSchema;

pub const SAVED_MESSAGE: &str = "File successfully saved";

/// A document received from the upload form
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A banner shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub enum StageResult {
    /// The session carried no document
    NoUpload,
    /// The document failed validation
    Rejected(String),
    /// The document could not be written to the staging area
    WriteFailed(StagingError),
    Staged(StagedFile),
}

#[derive(Debug)]
pub struct SessionOutcome {
    pub notices: Vec<Notice>,
    pub stage: StageResult,
    /// Present only when a query was sent
    pub answer: Option<Result<String, ServiceError>>,
}

impl SessionOutcome {
    fn stopped(notices: Vec<Notice>, stage: StageResult) -> Self {
        Self {
            notices,
            stage,
            answer: None,
        }
    }

    pub fn staged(&self) -> Option<&StagedFile> {
        match &self.stage {
            StageResult::Staged(file) => Some(file),
            _ => None,
        }
    }
}

/// Runs one upload-and-query interaction at a time against the staging area
pub struct AnalysisService {
    staging: Arc<dyn StagingStore>,
    dispatcher: QueryDispatcher,
    max_file_size: usize,
    allowed_extensions: Vec<String>,
    // Held for a whole session; sessions never interleave on the staging directory
    current: Mutex<Option<StagedFile>>,
}

impl AnalysisService {
    pub fn new(
        staging: Arc<dyn StagingStore>,
        qa: Arc<dyn QaService>,
        config: &AppConfig,
    ) -> Self {
        Self {
            staging,
            dispatcher: QueryDispatcher::new(qa, config.qa.model.clone()),
            max_file_size: config.max_file_size,
            allowed_extensions: config.allowed_extensions.clone(),
            current: Mutex::new(None),
        }
    }

    pub fn dispatcher(&self) -> &QueryDispatcher {
        &self.dispatcher
    }

    /// Clears the staging area, reporting each failure as a warning notice
    async fn reset_staging(&self) -> Vec<Notice> {
        let report = self.staging.reset().await;
        report
            .failures
            .iter()
            .map(|e| Notice::warning(format!("Error while removing existing files: {}", e)))
            .collect()
    }

    /// Start a new session: reset, then stage and query the upload if there is one
    pub async fn analyze(&self, upload: Option<Upload>) -> SessionOutcome {
        let mut current = self.current.lock().await;
        *current = None;

        let mut notices = self.reset_staging().await;

        let Some(upload) = upload else {
            return SessionOutcome::stopped(notices, StageResult::NoUpload);
        };

        let filename = match validate_document(
            &upload.filename,
            &upload.content,
            self.max_file_size,
            &self.allowed_extensions,
        ) {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!("Rejected upload {}: {}", upload.filename, e);
                notices.push(Notice::error(e.message.clone()));
                return SessionOutcome::stopped(notices, StageResult::Rejected(e.message));
            }
        };

        let staged = match self.staging.store(&filename, &upload.content).await {
            Ok(staged) => staged,
            Err(e) => {
                tracing::error!("Staging write failed: {}", e);
                notices.push(Notice::error(format!("Could not save the file: {}", e)));
                return SessionOutcome::stopped(notices, StageResult::WriteFailed(e));
            }
        };

        notices.push(Notice::success(SAVED_MESSAGE));
        *current = Some(staged.clone());

        let answer = self.dispatch(&staged, &mut notices).await;

        SessionOutcome {
            notices,
            stage: StageResult::Staged(staged),
            answer: Some(answer),
        }
    }

    /// Query again for the document left staged by the last session
    pub async fn retry(&self) -> SessionOutcome {
        let current = self.current.lock().await;
        let mut notices = Vec::new();

        let Some(staged) = current.clone() else {
            notices.push(Notice::warning("No document is staged. Upload a file first."));
            return SessionOutcome::stopped(notices, StageResult::NoUpload);
        };

        if !tokio::fs::try_exists(&staged.path).await.unwrap_or(false) {
            notices.push(Notice::warning(format!(
                "{} is no longer staged. Upload it again.",
                staged.filename
            )));
            return SessionOutcome::stopped(notices, StageResult::NoUpload);
        }

        let answer = self.dispatch(&staged, &mut notices).await;

        SessionOutcome {
            notices,
            stage: StageResult::Staged(staged),
            answer: Some(answer),
        }
    }

    /// Staged documents, for inspection
    pub async fn staged_files(&self) -> Result<Vec<PathBuf>, StagingError> {
        let _current = self.current.lock().await;
        self.staging.list_files().await
    }

    /// Startup cleanup of whatever a previous process left behind
    pub async fn clear_staging(&self) -> Vec<Notice> {
        let mut current = self.current.lock().await;
        *current = None;
        self.reset_staging().await
    }

    async fn dispatch(
        &self,
        staged: &StagedFile,
        notices: &mut Vec<Notice>,
    ) -> Result<String, ServiceError> {
        let query = self.dispatcher.build_query(staged);
        let answer = self.dispatcher.submit(&query).await;
        if let Err(e) = &answer {
            notices.push(Notice::error(format!(
                "The analysis service failed: {}. Your file is still staged; you can retry.",
                e
            )));
        }
        answer
    }
}
