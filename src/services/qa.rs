use crate::config::QaConfig;
use crate::services::dispatcher::Query;
use crate::utils::validation::DOCX_MIME_TYPE;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("QA service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("QA service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("QA service response could not be decoded: {0}")]
    Decode(String),

    #[error("QA service returned an empty response")]
    EmptyResponse,

    #[error("failed to read staged document {}: {}", .path.display(), .source)]
    ReadDocument {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Trait for the external question-answering service
#[async_trait]
pub trait QaService: Send + Sync {
    /// Ask the service about a document. Returns the service's text verbatim.
    async fn query(&self, query: &Query) -> Result<String, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct QaResponseBody {
    response: Option<String>,
}

/// QA service reached over HTTP with a multipart document upload
pub struct HttpQaService {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

impl HttpQaService {
    pub fn new(config: &QaConfig) -> Result<Self, ServiceError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl QaService for HttpQaService {
    async fn query(&self, query: &Query) -> Result<String, ServiceError> {
        let content = tokio::fs::read(&query.document.path)
            .await
            .map_err(|source| ServiceError::ReadDocument {
                path: query.document.path.clone(),
                source,
            })?;

        let document = Part::bytes(content)
            .file_name(query.document.filename.clone())
            .mime_str(DOCX_MIME_TYPE)?;

        let form = Form::new()
            .part("file", document)
            .text("instruction", query.instruction.clone())
            .text("model", query.model.clone());

        let mut request = self.client.post(&self.api_url).multipart(form);
        if let Some(ref api_key) = self.api_key {
            request = request.bearer_auth(api_key);
        }

        tracing::debug!(
            "Querying QA service at {} with model {} for {}",
            self.api_url,
            query.model,
            query.document.filename
        );

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        let body: QaResponseBody =
            serde_json::from_slice(&bytes).map_err(|e| ServiceError::Decode(e.to_string()))?;

        body.response.ok_or(ServiceError::EmptyResponse)
    }
}
