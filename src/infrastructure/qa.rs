use crate::config::QaConfig;
use crate::services::qa::HttpQaService;
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

pub fn setup_qa_service(config: &QaConfig) -> anyhow::Result<Arc<HttpQaService>> {
    info!("🤖 QA service: {} (model: {})", config.api_url, config.model);

    if config.api_key.is_none() {
        warn!("⚠️  QA_API_KEY is not set; queries are sent without credentials");
    }
    if let Some(secs) = config.timeout_secs {
        info!("⏱️  QA request timeout: {}s", secs);
    }

    let service = HttpQaService::new(config).context("Failed to build QA HTTP client")?;
    Ok(Arc::new(service))
}
