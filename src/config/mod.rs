use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Settings for the external question-answering service
#[derive(Debug, Clone)]
pub struct QaConfig {
    /// Endpoint receiving the multipart document query
    pub api_url: String,

    /// Bearer token sent with every query (default: none)
    pub api_key: Option<String>,

    /// Model identifier forwarded with the query (default: "gpt-3.5-turbo")
    pub model: String,

    /// Request timeout in seconds (default: none, client default applies)
    pub timeout_secs: Option<u64>,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.lyzr.ai/v1/qa/docx".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            timeout_secs: None,
        }
    }
}

/// A static link rendered in the page's "About" section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoLink {
    pub label: String,
    pub url: String,
}

/// Page text shown around the upload form
#[derive(Debug, Clone)]
pub struct UiConfig {
    pub title: String,
    pub tagline: String,
    pub info_links: Vec<InfoLink>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "Grammar Analyzer".to_string(),
            tagline: "Upload a Word document and get back a proofread, corrected version \
                      along with the list of errors that were fixed."
                .to_string(),
            info_links: Vec::new(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to (default: 127.0.0.1:3000)
    pub bind_addr: SocketAddr,

    /// Directory holding the staged document (default: "data")
    pub staging_dir: PathBuf,

    /// Maximum upload size in bytes (default: 25 MB)
    pub max_file_size: usize,

    /// Accepted file extensions, lowercase without dot (default: ["docx"])
    pub allowed_extensions: Vec<String>,

    pub qa: QaConfig,

    pub ui: UiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
            staging_dir: PathBuf::from("data"),
            max_file_size: 25 * 1024 * 1024, // 25 MB
            allowed_extensions: vec!["docx".to_string()],
            qa: QaConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        let host = env::var("HOST")
            .ok()
            .and_then(|v| v.parse::<IpAddr>().ok())
            .unwrap_or(default.bind_addr.ip());
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(default.bind_addr.port());

        Self {
            bind_addr: SocketAddr::new(host, port),

            staging_dir: env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.staging_dir),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            allowed_extensions: env::var("ALLOWED_EXTENSIONS")
                .ok()
                .map(|v| parse_extensions(&v))
                .filter(|exts| !exts.is_empty())
                .unwrap_or(default.allowed_extensions),

            qa: QaConfig {
                api_url: env::var("QA_API_URL").unwrap_or(default.qa.api_url),
                api_key: env::var("QA_API_KEY").ok().filter(|v| !v.trim().is_empty()),
                model: env::var("QA_MODEL").unwrap_or(default.qa.model),
                timeout_secs: env::var("QA_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|secs| *secs > 0),
            },

            ui: UiConfig {
                title: env::var("APP_TITLE").unwrap_or(default.ui.title),
                tagline: env::var("APP_TAGLINE").unwrap_or(default.ui.tagline),
                info_links: env::var("INFO_LINKS")
                    .map(|v| parse_info_links(&v))
                    .unwrap_or(default.ui.info_links),
            },
        }
    }

    /// Config for local development: staging under the system temp dir, local QA mock
    pub fn development() -> Self {
        Self {
            staging_dir: env::temp_dir().join("grammar-analyzer-staging"),
            qa: QaConfig {
                api_url: "http://127.0.0.1:8080/v1/qa/docx".to_string(),
                ..QaConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Parses "docx, .DOC" into ["docx", "doc"]
fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

/// Parses "Label|https://a,Other|https://b". Malformed pairs are skipped.
fn parse_info_links(raw: &str) -> Vec<InfoLink> {
    raw.split(',')
        .filter_map(|pair| {
            let (label, url) = pair.split_once('|')?;
            let (label, url) = (label.trim(), url.trim());
            if label.is_empty() || url.is_empty() {
                return None;
            }
            Some(InfoLink {
                label: label.to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.staging_dir, PathBuf::from("data"));
        assert_eq!(config.max_file_size, 25 * 1024 * 1024);
        assert_eq!(config.allowed_extensions, vec!["docx".to_string()]);
        assert_eq!(config.qa.model, "gpt-3.5-turbo");
        assert!(config.qa.api_key.is_none());
        assert!(config.qa.timeout_secs.is_none());
    }

    #[test]
    fn test_development_config() {
        let config = AppConfig::development();
        assert!(config.staging_dir.ends_with("grammar-analyzer-staging"));
        assert!(config.qa.api_url.starts_with("http://127.0.0.1"));
    }

    #[test]
    fn test_parse_extensions() {
        assert_eq!(
            parse_extensions("docx, .DOC ,,"),
            vec!["docx".to_string(), "doc".to_string()]
        );
        assert!(parse_extensions(" , ").is_empty());
    }

    #[test]
    fn test_parse_info_links() {
        let links = parse_info_links("Docs|https://example.com/docs, broken ,Chat | https://chat.example.com");
        assert_eq!(
            links,
            vec![
                InfoLink {
                    label: "Docs".to_string(),
                    url: "https://example.com/docs".to_string(),
                },
                InfoLink {
                    label: "Chat".to_string(),
                    url: "https://chat.example.com".to_string(),
                },
            ]
        );
    }
}
