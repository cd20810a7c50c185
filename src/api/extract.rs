use crate::api::error::AppError;
use crate::services::session::Upload;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;

/// The parts of an upload form the session cares about
#[derive(Debug, Default)]
pub struct UploadForm {
    pub upload: Option<Upload>,
    /// Extra `file` fields beyond the first, which are not staged
    pub ignored_files: usize,
}

impl UploadForm {
    pub fn ignored_notice(&self) -> Option<String> {
        (self.ignored_files > 0).then(|| {
            format!(
                "Only one document is analyzed per upload; {} additional file(s) ignored",
                self.ignored_files
            )
        })
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// Reads the first `file` field of a multipart form. A file field with no filename
/// (the browser's "nothing selected") counts as no upload.
pub async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            continue;
        }

        if form.upload.is_some() {
            tracing::warn!("Ignoring additional uploaded file {}", filename);
            form.ignored_files += 1;
            continue;
        }

        let content = field.bytes().await.map_err(multipart_error)?;
        form.upload = Some(Upload {
            filename,
            content: content.to_vec(),
        });
    }

    Ok(form)
}
