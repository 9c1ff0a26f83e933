use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub access: AccessSettings,
    #[serde(default)]
    pub guardian: GuardianSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    /// Connection string of the hosted Postgres instance.
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Upper bound on waiting for a pooled connection. This is the only
    /// timeout applied to entitlement lookups.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AuthSettings {
    /// HS256 secret the hosted auth provider signs session tokens with.
    pub jwt_secret: Secret<String>,
    #[serde(default = "default_audience")]
    pub audience: String,
    /// Cookie carrying the session token when no bearer header is sent.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AccessSettings {
    /// Literal path prefixes that require a passing access decision.
    #[serde(default = "default_protected_prefixes")]
    pub protected_prefixes: Vec<String>,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_pricing_path")]
    pub pricing_path: String,
    #[serde(default = "default_verify_email_path")]
    pub verify_email_path: String,
    #[serde(default)]
    pub require_confirmed_email: bool,
    /// Requests under this prefix get JSON status codes instead of redirects.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            protected_prefixes: default_protected_prefixes(),
            login_path: default_login_path(),
            pricing_path: default_pricing_path(),
            verify_email_path: default_verify_email_path(),
            require_confirmed_email: false,
            api_prefix: default_api_prefix(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct GuardianSettings {
    #[serde(default = "default_guardian_cookie")]
    pub cookie_name: String,
    #[serde(default = "default_guardian_cookie_path")]
    pub cookie_path: String,
    #[serde(default = "default_guardian_login_path")]
    pub login_path: String,
    /// Only disable for plain-http local development.
    #[serde(default = "default_true")]
    pub secure_cookie: bool,
}

impl Default for GuardianSettings {
    fn default() -> Self {
        Self {
            cookie_name: default_guardian_cookie(),
            cookie_path: default_guardian_cookie_path(),
            login_path: default_guardian_login_path(),
            secure_cookie: true,
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct TelemetrySettings {
    /// OTLP gRPC endpoint, e.g. http://tempo:4317. Spans are not exported
    /// when unset.
    pub otlp_endpoint: Option<String>,
}

fn default_service_name() -> String {
    "learning-portal".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

fn default_audience() -> String {
    "authenticated".to_string()
}

fn default_session_cookie() -> String {
    "sb-access-token".to_string()
}

fn default_protected_prefixes() -> Vec<String> {
    ["/practice", "/progress", "/mastery", "/api/progress"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_pricing_path() -> String {
    "/pricing".to_string()
}

fn default_verify_email_path() -> String {
    "/verify-email".to_string()
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_guardian_cookie() -> String {
    "guardian_session".to_string()
}

fn default_guardian_cookie_path() -> String {
    "/guardian".to_string()
}

fn default_guardian_login_path() -> String {
    "/guardian/login".to_string()
}

fn default_true() -> bool {
    true
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path =
        std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;

    // Check if we're already in learning-portal directory or need to navigate to it
    let configuration_directory = if base_path.ends_with("learning-portal") {
        base_path.join("config")
    } else {
        base_path.join("learning-portal").join("config")
    };

    load_from(&configuration_directory)
}

/// Load `base.yaml` from `directory`, then apply `APP_` environment overrides
/// (`APP_DATABASE__URL`, `APP_ACCESS__PROTECTED_PREFIXES=/a,/b`, ...).
pub fn load_from(directory: &Path) -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("access.protected_prefixes")
                .try_parsing(true),
        )
        .build()?;

    from_config(settings)
}

fn from_config(config: config::Config) -> Result<Settings, config::ConfigError> {
    let settings = config.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    /// Reject settings that would let forged session tokens through.
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.auth.jwt_secret.expose_secret().trim().is_empty() {
            return Err(config::ConfigError::Message(
                "auth.jwt_secret must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
