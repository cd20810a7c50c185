use crate::AppState;
use crate::api::error::AppError;
use crate::api::extract::read_upload;
use crate::services::session::{Notice, SessionOutcome, StageResult};
use crate::services::staging::StagedFile;
use axum::{
    Json,
    extract::{Multipart, State},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct AnalysisResponse {
    pub document: StagedFile,
    /// Text returned by the QA service, unmodified
    pub response: String,
    pub model: String,
    pub notices: Vec<Notice>,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct StagedFilesResponse {
    pub files: Vec<String>,
}

/// Multipart form accepted by the analyze endpoint
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadRequest {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// `no_upload` is the 400 message for a session that staged nothing; when absent the
/// session's last notice explains why
fn into_response(
    state: &AppState,
    outcome: SessionOutcome,
    no_upload: Option<&str>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let SessionOutcome {
        notices,
        stage,
        answer,
    } = outcome;

    let document = match stage {
        StageResult::Staged(file) => file,
        StageResult::NoUpload => {
            let message = no_upload
                .or_else(|| notices.last().map(|n| n.message.as_str()))
                .unwrap_or("No file provided");
            return Err(AppError::BadRequest(message.to_string()));
        }
        StageResult::Rejected(reason) => return Err(AppError::BadRequest(reason)),
        StageResult::WriteFailed(e) => return Err(e.into()),
    };

    let response = match answer {
        Some(Ok(text)) => text,
        Some(Err(e)) => return Err(e.into()),
        None => return Err(AppError::Internal("Session ended without a query".to_string())),
    };

    Ok(Json(AnalysisResponse {
        document,
        response,
        model: state.analysis.dispatcher().model().to_string(),
        notices,
        analyzed_at: Utc::now(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/analyze",
    request_body(content = UploadRequest, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Document staged and analyzed", body = AnalysisResponse),
        (status = 400, description = "No file provided or file rejected"),
        (status = 413, description = "Upload too large"),
        (status = 502, description = "QA service failed; the document stays staged for retry")
    ),
    tag = "analysis"
)]
pub async fn analyze_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let form = read_upload(multipart).await?;
    let ignored = form.ignored_notice();

    let mut outcome = state.analysis.analyze(form.upload).await;
    if let Some(message) = ignored {
        outcome.notices.push(Notice::warning(message));
    }

    into_response(&state, outcome, Some("No file provided"))
}

#[utoipa::path(
    post,
    path = "/api/analyze/retry",
    responses(
        (status = 200, description = "Staged document analyzed again", body = AnalysisResponse),
        (status = 400, description = "Nothing is staged"),
        (status = 502, description = "QA service failed again")
    ),
    tag = "analysis"
)]
pub async fn retry_analysis(
    State(state): State<AppState>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let outcome = state.analysis.retry().await;
    into_response(&state, outcome, None)
}

#[utoipa::path(
    get,
    path = "/api/staged",
    responses(
        (status = 200, description = "Files currently in the staging area", body = StagedFilesResponse)
    ),
    tag = "analysis"
)]
pub async fn list_staged(
    State(state): State<AppState>,
) -> Result<Json<StagedFilesResponse>, AppError> {
    let files = state
        .analysis
        .staged_files()
        .await?
        .into_iter()
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();

    Ok(Json(StagedFilesResponse { files }))
}
