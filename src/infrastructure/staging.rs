use crate::config::AppConfig;
use crate::services::staging::LocalStaging;
use std::sync::Arc;
use tracing::info;

pub fn setup_staging(config: &AppConfig) -> Arc<LocalStaging> {
    info!("📂 Staging directory: {}", config.staging_dir.display());
    Arc::new(LocalStaging::new(config.staging_dir.clone()))
}
