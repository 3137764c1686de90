//! read client configuration from a file, the environment, or a secret

use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;
use serde::Deserialize;

use crate::errors::Error;
use crate::token::RefreshPolicy;

const ENV_PREFIX: &str = "DASHBOARD_API_";

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub base_url: String,
    #[serde(default = "default_csrf_path")]
    pub csrf_path: String,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_logout_path")]
    pub logout_path: String,
    /// Where callers should navigate once the session is torn down.
    #[serde(default = "default_login_page")]
    pub login_page: String,
    #[serde(default = "default_csrf_header")]
    pub csrf_header: String,
    #[serde(default = "default_client_id_header")]
    pub client_id_header: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub refresh_threshold_secs: Option<u64>,
    #[serde(default)]
    pub refresh_clock_skew_secs: Option<u64>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_csrf_path() -> String {
    "/auth/csrf-token".to_string()
}

fn default_refresh_path() -> String {
    "/auth/refresh-token".to_string()
}

fn default_login_path() -> String {
    "/auth/login".to_string()
}

fn default_logout_path() -> String {
    "/auth/logout".to_string()
}

fn default_login_page() -> String {
    "/login".to_string()
}

fn default_csrf_header() -> String {
    "X-CSRF-TOKEN".to_string()
}

fn default_client_id_header() -> String {
    "X-Client-Id".to_string()
}

fn default_user_agent() -> String {
    format!("dashboard-api-client/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Configuration with every endpoint and header at its default.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            csrf_path: default_csrf_path(),
            refresh_path: default_refresh_path(),
            login_path: default_login_path(),
            logout_path: default_logout_path(),
            login_page: default_login_page(),
            csrf_header: default_csrf_header(),
            client_id_header: default_client_id_header(),
            user_agent: default_user_agent(),
            refresh_threshold_secs: None,
            refresh_clock_skew_secs: None,
            timeout_secs: None,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Reads `DASHBOARD_API_BASE_URL` plus any optional `DASHBOARD_API_*` overrides.
    pub fn from_env() -> Result<Self, Error> {
        let base_url = env_var("BASE_URL")
            .ok_or_else(|| Error::Config(format!("Missing {ENV_PREFIX}BASE_URL env var")))?;
        let mut config = Self::new(base_url);
        if let Some(v) = env_var("CSRF_PATH") {
            config.csrf_path = v;
        }
        if let Some(v) = env_var("REFRESH_PATH") {
            config.refresh_path = v;
        }
        if let Some(v) = env_var("LOGIN_PATH") {
            config.login_path = v;
        }
        if let Some(v) = env_var("LOGOUT_PATH") {
            config.logout_path = v;
        }
        if let Some(v) = env_var("LOGIN_PAGE") {
            config.login_page = v;
        }
        if let Some(v) = env_var("CSRF_HEADER") {
            config.csrf_header = v;
        }
        if let Some(v) = env_var("CLIENT_ID_HEADER") {
            config.client_id_header = v;
        }
        config.refresh_threshold_secs = env_secs("REFRESH_THRESHOLD_SECS")?;
        config.refresh_clock_skew_secs = env_secs("REFRESH_CLOCK_SKEW_SECS")?;
        config.timeout_secs = env_secs("TIMEOUT_SECS")?;
        Ok(config)
    }

    /// Loads the JSON configuration stored in the secret named by `DASHBOARD_API_CONFIG_SECRET_ARN`.
    pub async fn from_secret() -> Result<Self, Error> {
        let secret_arn = env_var("CONFIG_SECRET_ARN").ok_or_else(|| {
            Error::Config(format!("Missing {ENV_PREFIX}CONFIG_SECRET_ARN env var"))
        })?;
        let client = aws_sdk_secretsmanager::Client::new(
            &aws_config::load_defaults(BehaviorVersion::latest()).await,
        );
        let resp = client
            .get_secret_value()
            .secret_id(secret_arn)
            .send()
            .await
            .map_err(|e| Error::Secret(format!("Failed to get secret: {}", e)))?;
        let secret = resp.secret_string().ok_or_else(|| {
            Error::Secret("Failed to get secret string, returned None".to_string())
        })?;
        Ok(serde_json::from_str(secret)?)
    }

    /// Proactive refresh policy, if a threshold is configured.
    pub fn refresh_policy(&self) -> Result<Option<RefreshPolicy>, Error> {
        match self.refresh_threshold_secs {
            None => Ok(None),
            Some(threshold) => RefreshPolicy::new(
                Duration::from_secs(threshold),
                Duration::from_secs(self.refresh_clock_skew_secs.unwrap_or(0)),
            )
            .map(Some),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{name}"))
        .ok()
        .filter(|v| !v.is_empty())
}

fn env_secs(name: &str) -> Result<Option<u64>, Error> {
    env_var(name)
        .map(|raw| {
            raw.parse::<u64>().map_err(|e| {
                Error::Config(format!("Invalid {ENV_PREFIX}{name} value '{raw}': {e}"))
            })
        })
        .transpose()
}
