use crate::AppState;
use crate::api::error::AppError;
use crate::api::extract::read_upload;
use crate::services::session::{Notice, SessionOutcome, StageResult};
use crate::ui::{PageView, render_page};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

fn render(state: &AppState, status: StatusCode, view: &PageView<'_>) -> Response {
    let html = render_page(
        &state.config.ui,
        &state.config.allowed_extensions,
        view,
    );
    (status, Html(html)).into_response()
}

fn render_outcome(state: &AppState, outcome: &SessionOutcome) -> Response {
    let (answer, can_retry, status) = match &outcome.answer {
        Some(Ok(text)) => (Some(text.as_str()), false, StatusCode::OK),
        Some(Err(_)) => (None, true, StatusCode::BAD_GATEWAY),
        None => {
            let status = match outcome.stage {
                StageResult::Rejected(_) => StatusCode::BAD_REQUEST,
                StageResult::WriteFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::OK,
            };
            (None, false, status)
        }
    };

    let view = PageView {
        notices: &outcome.notices,
        filename: outcome.staged().map(|f| f.filename.as_str()),
        answer,
        can_retry,
    };
    render(state, status, &view)
}

pub async fn index(State(state): State<AppState>) -> Response {
    render(&state, StatusCode::OK, &PageView::default())
}

/// Form submission: a new session for whatever file was chosen
pub async fn submit(State(state): State<AppState>, multipart: Multipart) -> Response {
    let form = match read_upload(multipart).await {
        Ok(form) => form,
        Err(e) => {
            let status = match e {
                AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            let notices = [Notice::error(e.to_string())];
            let view = PageView {
                notices: &notices,
                ..PageView::default()
            };
            return render(&state, status, &view);
        }
    };
    let ignored = form.ignored_notice();

    let mut outcome = state.analysis.analyze(form.upload).await;
    if let Some(message) = ignored {
        outcome.notices.push(Notice::warning(message));
    }

    render_outcome(&state, &outcome)
}

pub async fn retry(State(state): State<AppState>) -> Response {
    let outcome = state.analysis.retry().await;
    render_outcome(&state, &outcome)
}
