use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::assessment::SessionRetention;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub assessment: AssessmentConfig,
    pub integrations: IntegrationConfig,
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
            assessment: AssessmentConfig::from_env()?,
            integrations: IntegrationConfig::from_env(),
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

const DEFAULT_FINISHED_SESSION_TTL_MINUTES: u32 = 360;
const DEFAULT_FINISHED_SESSION_LIMIT: usize = 256;

/// Questionnaire, pricing and admin settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentConfig {
    /// JSON catalog to load instead of the built-in one.
    pub catalog_path: Option<PathBuf>,
    pub admin_emails: Vec<String>,
    pub fee_minor_units: u32,
    pub currency: String,
    /// JSON-lines file backing the submission store; in-memory when unset.
    pub submissions_path: Option<PathBuf>,
    /// Minutes a finished submission stays available for status and PDF download.
    pub finished_session_ttl_minutes: u32,
    pub finished_session_limit: usize,
}

impl AssessmentConfig {
    pub fn session_retention(&self) -> SessionRetention {
        SessionRetention {
            finished_ttl: chrono::Duration::minutes(i64::from(self.finished_session_ttl_minutes)),
            max_finished: self.finished_session_limit,
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        let fee_minor_units = match optional_var("APP_REPORT_FEE_MINOR_UNITS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|fee| *fee > 0)
                .ok_or(ConfigError::InvalidFee(raw))?,
            None => 19_900,
        };

        let currency = optional_var("APP_REPORT_CURRENCY")
            .map(|currency| currency.to_ascii_uppercase())
            .unwrap_or_else(|| "INR".to_string());
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidCurrency(currency));
        }

        let finished_session_ttl_minutes = match optional_var("APP_FINISHED_SESSION_TTL_MINUTES") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidSessionRetention(raw))?,
            None => DEFAULT_FINISHED_SESSION_TTL_MINUTES,
        };
        let finished_session_limit = match optional_var("APP_FINISHED_SESSION_LIMIT") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or(ConfigError::InvalidSessionRetention(raw))?,
            None => DEFAULT_FINISHED_SESSION_LIMIT,
        };

        Ok(Self {
            catalog_path: optional_var("APP_CATALOG_PATH").map(PathBuf::from),
            admin_emails: optional_var("APP_ADMIN_EMAILS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            fee_minor_units,
            currency,
            submissions_path: optional_var("APP_SUBMISSIONS_PATH").map(PathBuf::from),
            finished_session_ttl_minutes,
            finished_session_limit,
        })
    }
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            admin_emails: Vec::new(),
            fee_minor_units: 19_900,
            currency: "INR".to_string(),
            submissions_path: None,
            finished_session_ttl_minutes: DEFAULT_FINISHED_SESSION_TTL_MINUTES,
            finished_session_limit: DEFAULT_FINISHED_SESSION_LIMIT,
        }
    }
}

/// Credentials for external collaborators. `None` wires an unconfigured adapter.
#[derive(Clone, Default)]
pub struct IntegrationConfig {
    pub gemini: Option<GeminiConfig>,
    pub razorpay: Option<RazorpayConfig>,
    pub sendgrid: Option<SendGridConfig>,
    pub storage: Option<StorageConfig>,
}

impl IntegrationConfig {
    fn from_env() -> Self {
        let gemini = optional_var("GEMINI_API_KEY").map(|api_key| GeminiConfig {
            api_key,
            model: optional_var("GEMINI_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string()),
        });

        let razorpay = match (
            optional_var("RAZORPAY_KEY_ID"),
            optional_var("RAZORPAY_KEY_SECRET"),
        ) {
            (Some(key_id), Some(key_secret)) => Some(RazorpayConfig { key_id, key_secret }),
            _ => None,
        };

        let sendgrid = optional_var("SENDGRID_API_KEY").map(|api_key| SendGridConfig {
            api_key,
            sender: optional_var("APP_REPORT_SENDER")
                .unwrap_or_else(|| "reports@taicc.co".to_string()),
        });

        let storage = match (
            optional_var("STORAGE_BUCKET"),
            optional_var("STORAGE_ACCESS_TOKEN"),
        ) {
            (Some(bucket), Some(access_token)) => Some(StorageConfig {
                bucket,
                access_token,
            }),
            _ => None,
        };

        Self {
            gemini,
            razorpay,
            sendgrid,
            storage,
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for IntegrationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationConfig")
            .field("gemini", &self.gemini.as_ref().map(|cfg| &cfg.model))
            .field("razorpay", &self.razorpay.as_ref().map(|cfg| &cfg.key_id))
            .field("sendgrid", &self.sendgrid.as_ref().map(|cfg| &cfg.sender))
            .field("storage", &self.storage.as_ref().map(|cfg| &cfg.bucket))
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct SendGridConfig {
    pub api_key: String,
    pub sender: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub bucket: String,
    pub access_token: String,
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFee(String),
    InvalidCurrency(String),
    InvalidSessionRetention(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFee(value) => write!(
                f,
                "APP_REPORT_FEE_MINOR_UNITS must be a positive integer, got '{value}'"
            ),
            ConfigError::InvalidCurrency(value) => write!(
                f,
                "APP_REPORT_CURRENCY must be a three-letter ISO code, got '{value}'"
            ),
            ConfigError::InvalidSessionRetention(value) => write!(
                f,
                "finished session retention must be a whole number (limit at least 1), got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidFee(_)
            | ConfigError::InvalidCurrency(_)
            | ConfigError::InvalidSessionRetention(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    const VARS: [&str; 19] = [
        "APP_ENV",
        "APP_HOST",
        "APP_PORT",
        "APP_LOG_LEVEL",
        "APP_CATALOG_PATH",
        "APP_ADMIN_EMAILS",
        "APP_REPORT_FEE_MINOR_UNITS",
        "APP_REPORT_CURRENCY",
        "APP_SUBMISSIONS_PATH",
        "APP_FINISHED_SESSION_TTL_MINUTES",
        "APP_FINISHED_SESSION_LIMIT",
        "GEMINI_API_KEY",
        "GEMINI_MODEL",
        "RAZORPAY_KEY_ID",
        "RAZORPAY_KEY_SECRET",
        "SENDGRID_API_KEY",
        "APP_REPORT_SENDER",
        "STORAGE_BUCKET",
        "STORAGE_ACCESS_TOKEN",
    ];

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in VARS {
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
        assert_eq!(config.assessment, AssessmentConfig::default());
        assert!(config.integrations.gemini.is_none());
        assert!(config.integrations.storage.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn reads_assessment_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ADMIN_EMAILS", "ops@taicc.co, ceo@taicc.co ,,");
        env::set_var("APP_REPORT_FEE_MINOR_UNITS", "49900");
        env::set_var("APP_REPORT_CURRENCY", "usd");
        env::set_var("APP_SUBMISSIONS_PATH", "/var/lib/taicc/submissions.jsonl");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(
            config.assessment.admin_emails,
            vec!["ops@taicc.co".to_string(), "ceo@taicc.co".to_string()]
        );
        assert_eq!(config.assessment.fee_minor_units, 49_900);
        assert_eq!(config.assessment.currency, "USD");
        assert_eq!(
            config.assessment.submissions_path,
            Some(PathBuf::from("/var/lib/taicc/submissions.jsonl"))
        );
    }

    #[test]
    fn rejects_invalid_fee_and_currency() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_REPORT_FEE_MINOR_UNITS", "0");
        assert!(matches!(AppConfig::load(), Err(ConfigError::InvalidFee(_))));

        reset_env();
        env::set_var("APP_REPORT_CURRENCY", "rupees");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidCurrency(_))
        ));
        reset_env();
    }

    #[test]
    fn reads_finished_session_retention() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_FINISHED_SESSION_TTL_MINUTES", "30");
        env::set_var("APP_FINISHED_SESSION_LIMIT", "12");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.assessment.finished_session_ttl_minutes, 30);
        assert_eq!(config.assessment.finished_session_limit, 12);
        let retention = config.assessment.session_retention();
        assert_eq!(retention.finished_ttl, chrono::Duration::minutes(30));
        assert_eq!(retention.max_finished, 12);

        env::set_var("APP_FINISHED_SESSION_LIMIT", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidSessionRetention(_))
        ));

        reset_env();
        env::set_var("APP_FINISHED_SESSION_TTL_MINUTES", "soon");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidSessionRetention(_))
        ));
        reset_env();
    }

    #[test]
    fn integrations_require_complete_credentials() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("GEMINI_API_KEY", "gm-key");
        env::set_var("RAZORPAY_KEY_ID", "rzp_test");
        env::set_var("STORAGE_BUCKET", "taicc-reports");
        env::set_var("STORAGE_ACCESS_TOKEN", "ya29.token");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        let gemini = config.integrations.gemini.expect("gemini configured");
        assert_eq!(gemini.model, "gemini-1.5-flash");
        assert!(config.integrations.razorpay.is_none());
        assert!(config.integrations.sendgrid.is_none());
        assert_eq!(
            config.integrations.storage.map(|storage| storage.bucket),
            Some("taicc-reports".to_string())
        );

        let debug = format!("{:?}", IntegrationConfig::default());
        assert!(!debug.contains("token"));
    }
}
