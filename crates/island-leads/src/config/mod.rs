use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Fixed origin recorded on every stored lead.
pub const SITE_SOURCE: &str = "dubaiislandhouse.com";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration, read once at process start. Handlers receive the
/// relevant sub-structs; nothing looks at the environment mid-request.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub store: Option<StoreConfig>,
    pub email: Option<EmailConfig>,
    pub sheets: Option<SheetsConfig>,
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            store: StoreConfig::from_env(),
            email: EmailConfig::from_env(),
            sheets: SheetsConfig::from_env(),
            export: ExportConfig::from_env(),
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Supabase REST credentials for the key-value lead table.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub service_role_key: String,
    pub table: String,
}

impl StoreConfig {
    fn from_env() -> Option<Self> {
        let url = non_empty_var("SUPABASE_URL")?;
        let service_role_key = non_empty_var("SUPABASE_SERVICE_ROLE_KEY")?;
        let table = env::var("SUPABASE_KV_TABLE").unwrap_or_else(|_| "kv_store".to_string());
        Some(Self {
            url,
            service_role_key,
            table,
        })
    }
}

/// Resend credentials and addressing for lead notification mail. Absent when
/// no API key is configured; intake then records a fixed diagnostic string.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_key: String,
    pub from: String,
    pub to: String,
}

impl EmailConfig {
    fn from_env() -> Option<Self> {
        let api_key = non_empty_var("RESEND_API_KEY")?;
        let from = env::var("RESEND_FROM_EMAIL")
            .unwrap_or_else(|_| "Dubai Island House <onboarding@resend.dev>".to_string());
        let to = env::var("LEAD_NOTIFICATION_EMAIL")
            .unwrap_or_else(|_| "info@dubaiislandhouse.com".to_string());
        Some(Self { api_key, from, to })
    }
}

/// Google Sheets credentials for the append mirror and the range export.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub api_key: String,
    pub sheet_id: String,
    pub range: String,
}

impl SheetsConfig {
    fn from_env() -> Option<Self> {
        let api_key = non_empty_var("GOOGLE_API_KEY")?;
        let sheet_id = non_empty_var("GOOGLE_SHEET_ID")?;
        let range = env::var("GOOGLE_SHEET_RANGE").unwrap_or_else(|_| "Sheet1!A:Z".to_string());
        Some(Self {
            api_key,
            sheet_id,
            range,
        })
    }
}

/// Shared-secret tokens gating the CSV export endpoints. Either may be
/// absent, in which case the corresponding endpoint fails closed.
#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    pub admin_token: Option<String>,
    pub download_token: Option<String>,
}

impl ExportConfig {
    fn from_env() -> Self {
        Self {
            admin_token: non_empty_var("ADMIN_EXPORT_TOKEN"),
            download_token: non_empty_var("DOWNLOAD_TOKEN"),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "SUPABASE_URL",
            "SUPABASE_SERVICE_ROLE_KEY",
            "SUPABASE_KV_TABLE",
            "RESEND_API_KEY",
            "RESEND_FROM_EMAIL",
            "LEAD_NOTIFICATION_EMAIL",
            "GOOGLE_API_KEY",
            "GOOGLE_SHEET_ID",
            "GOOGLE_SHEET_RANGE",
            "ADMIN_EXPORT_TOKEN",
            "DOWNLOAD_TOKEN",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.store.is_none());
        assert!(config.email.is_none());
        assert!(config.sheets.is_none());
        assert!(config.export.admin_token.is_none());
        assert!(config.export.download_token.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn optional_integrations_require_their_credentials() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("GOOGLE_API_KEY", "key-only");
        let config = AppConfig::load().expect("config loads");
        assert!(config.sheets.is_none(), "sheet id still missing");

        env::set_var("GOOGLE_SHEET_ID", "sheet-123");
        let config = AppConfig::load().expect("config loads");
        let sheets = config.sheets.expect("sheets configured");
        assert_eq!(sheets.sheet_id, "sheet-123");
        assert_eq!(sheets.range, "Sheet1!A:Z");
        reset_env();
    }

    #[test]
    fn email_defaults_apply_when_only_key_is_set() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RESEND_API_KEY", "re_test");
        let config = AppConfig::load().expect("config loads");
        let email = config.email.expect("email configured");
        assert_eq!(email.to, "info@dubaiislandhouse.com");
        assert!(email.from.contains("onboarding@resend.dev"));
        reset_env();
    }
}
