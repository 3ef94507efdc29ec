use std::path::PathBuf;

/// SnapLens runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the persisted state file
    pub state_dir: PathBuf,
    /// Directory for rolling log files; console-only when unset
    pub log_dir: Option<PathBuf>,
    /// Log level fallback when RUST_LOG is unset
    pub log_level: String,
    /// OpenAI API key; mocks are wired when absent
    pub openai_api_key: Option<String>,
    /// Entitlement service base URL; activations are accepted locally when absent
    pub entitlement_url: Option<String>,
    /// Seconds between background subscription revalidations
    pub revalidate_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: snaplens_store::state_dir(),
            log_dir: None,
            log_level: "info".to_string(),
            openai_api_key: None,
            entitlement_url: None,
            revalidate_secs: 3600,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self {
            state_dir: snaplens_store::state_dir(),
            log_dir: std::env::var("SNAPLENS_LOG_DIR").ok().map(PathBuf::from),
            log_level: std::env::var("SNAPLENS_LOG_LEVEL")
                .unwrap_or_else(|_| "info".to_string()),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            entitlement_url: std::env::var("SNAPLENS_ENTITLEMENT_URL").ok(),
            revalidate_secs: std::env::var("SNAPLENS_REVALIDATE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600),
        }
    }
}
