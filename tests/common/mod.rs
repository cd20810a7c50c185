#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use grammar_analyzer::config::AppConfig;
use grammar_analyzer::services::dispatcher::Query;
use grammar_analyzer::services::qa::{QaService, ServiceError};
use grammar_analyzer::services::session::AnalysisService;
use grammar_analyzer::services::staging::{
    LocalStaging, ResetReport, StagedFile, StagingError, StagingStore,
};
use grammar_analyzer::{AppState, create_app};
use http_body_util::BodyExt;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";

/// QA service stand-in that records every query and replays scripted answers
pub struct StubQaService {
    calls: Mutex<Vec<Query>>,
    replies: Mutex<VecDeque<Result<String, ServiceError>>>,
    fallback: String,
}

impl StubQaService {
    pub fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            fallback: text.to_string(),
        })
    }

    /// Next reply comes from `reply`; later ones fall back to the default answer
    pub fn push_reply(&self, reply: Result<String, ServiceError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<Query> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QaService for StubQaService {
    async fn query(&self, query: &Query) -> Result<String, ServiceError> {
        self.calls.lock().unwrap().push(query.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

/// Local staging whose first `failing_resets` resets report a permission error on one entry
pub struct FlakyStaging {
    inner: LocalStaging,
    failing_resets: Mutex<usize>,
}

impl FlakyStaging {
    pub fn new(root: impl Into<PathBuf>, failing_resets: usize) -> Self {
        Self {
            inner: LocalStaging::new(root),
            failing_resets: Mutex::new(failing_resets),
        }
    }
}

#[async_trait]
impl StagingStore for FlakyStaging {
    fn root(&self) -> &Path {
        self.inner.root()
    }

    async fn reset(&self) -> ResetReport {
        let mut report = self.inner.reset().await;
        let mut remaining = self.failing_resets.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            report.failures.push(StagingError::Remove {
                path: self.inner.root().join("locked.docx"),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            });
        }
        report
    }

    async fn store(&self, filename: &str, content: &[u8]) -> Result<StagedFile, StagingError> {
        self.inner.store(filename, content).await
    }

    async fn list_files(&self) -> Result<Vec<PathBuf>, StagingError> {
        self.inner.list_files().await
    }
}

pub struct TestApp {
    pub router: Router,
    pub qa: Arc<StubQaService>,
    pub staging_dir: PathBuf,
    // Keeps the directory alive for the test's duration
    _tmp: TempDir,
}

pub fn test_config(staging_dir: &Path) -> AppConfig {
    AppConfig {
        staging_dir: staging_dir.to_path_buf(),
        ..AppConfig::development()
    }
}

pub fn spawn_app_with(
    answer: &str,
    make_staging: impl FnOnce(&Path) -> Arc<dyn StagingStore>,
) -> TestApp {
    let tmp = TempDir::new().unwrap();
    let staging_dir = tmp.path().join("data");
    let config = test_config(&staging_dir);

    let staging = make_staging(&staging_dir);
    let qa = StubQaService::answering(answer);
    let analysis = Arc::new(AnalysisService::new(staging.clone(), qa.clone(), &config));

    let router = create_app(AppState {
        staging,
        analysis,
        config,
    });

    TestApp {
        router,
        qa,
        staging_dir,
        _tmp: tmp,
    }
}

pub fn spawn_app(answer: &str) -> TestApp {
    spawn_app_with(answer, |dir| -> Arc<dyn StagingStore> {
        Arc::new(LocalStaging::new(dir))
    })
}

/// A ZIP-signed payload standing in for a .docx containing `text`
pub fn docx_bytes(text: &str) -> Vec<u8> {
    let mut bytes = vec![0x50, 0x4B, 0x03, 0x04, 0x14, 0x00, 0x06, 0x00];
    bytes.extend_from_slice(b"word/document.xml");
    bytes.extend_from_slice(text.as_bytes());
    bytes
}

pub fn multipart_body(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (filename, content) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/vnd.openxmlformats-officedocument.wordprocessingml.document\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(uri: &str, filename: &str, content: &[u8]) -> Request<Body> {
    upload_many_request(uri, &[(filename, content.to_vec())])
}

pub fn upload_many_request(uri: &str, files: &[(&str, Vec<u8>)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(files)))
        .unwrap()
}

pub fn text_field_request(uri: &str, name: &str, value: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{name}\"\r\n\r\n\
         {value}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn empty_post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn staged_names(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}
