use std::env;
use std::path::PathBuf;

use crate::analysis::CoordinatePolicy;
use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub insights: InsightsConfig,
}

/// Backend API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix
    pub base_url: String,
}

/// Session store configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
}

/// Discussion insight options
#[derive(Debug, Clone, Default)]
pub struct InsightsConfig {
    /// Substitute the demo fixture when the backend has no analysis yet
    pub offline_fixtures: bool,
    /// How perspective coordinates outside [0, 1] are treated
    pub coordinate_policy: CoordinatePolicy,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = env::var("CI_API_URL")
            .unwrap_or_else(|_| "http://localhost:5000/api".to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::Config {
                message: format!("CI_API_URL must be an http(s) URL, got '{}'", base_url),
            });
        }
        let api = ApiConfig { base_url };

        let session = SessionConfig {
            path: PathBuf::from(
                env::var("CI_SESSION_DB").unwrap_or_else(|_| "./data/session.db".to_string()),
            ),
            max_connections: env::var("CI_SESSION_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30000),
        };

        let coordinate_policy = match env::var("CI_COORDINATE_POLICY") {
            Ok(value) => value.parse().map_err(|e: String| AppError::Config { message: e })?,
            Err(_) => CoordinatePolicy::default(),
        };

        let insights = InsightsConfig {
            offline_fixtures: env::var("CI_OFFLINE_FIXTURES")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            coordinate_policy,
        };

        Ok(Config {
            api,
            session,
            logging,
            request,
            insights,
        })
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { timeout_ms: 30000 }
    }
}
