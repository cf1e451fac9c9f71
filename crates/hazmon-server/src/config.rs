use hazmon_alert::RefirePolicy;
use hazmon_feeds::FeedEndpoints;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub feeds: FeedEndpoints,
    #[serde(default)]
    pub alerting: AlertingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL, e.g. `sqlite://data/hazmon.db?mode=rwc`.
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret. A random one is generated (and logged as a
    /// warning) when unset, which invalidates tokens on restart.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_token_expire_secs")]
    pub token_expire_secs: u64,
    #[serde(default = "default_admin_email")]
    pub default_admin_email: String,
    #[serde(default = "default_admin_password")]
    pub default_admin_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_expire_secs: default_token_expire_secs(),
            default_admin_email: default_admin_email(),
            default_admin_password: default_admin_password(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_poller_enabled")]
    pub weather_enabled: bool,
    #[serde(default = "default_poller_enabled")]
    pub earthquake_enabled: bool,
    /// Cap on concurrent per-location weather fetches within one tick.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            weather_enabled: default_poller_enabled(),
            earthquake_enabled: default_poller_enabled(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertingConfig {
    /// What to do when a rule matches while an active alert for the same
    /// rule+location already exists.
    #[serde(default)]
    pub refire_policy: RefirePolicy,
}

fn default_http_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    "sqlite://data/hazmon.db?mode=rwc".to_string()
}

fn default_token_expire_secs() -> u64 {
    86400
}

fn default_admin_email() -> String {
    "admin@hazmon.local".to_string()
}

fn default_admin_password() -> String {
    "changeme".to_string()
}

fn default_poller_enabled() -> bool {
    true
}

fn default_max_concurrent_fetches() -> usize {
    5
}

impl ServerConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}
