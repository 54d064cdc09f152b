use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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
    pub catalog: CatalogConfig,
    pub identity: Option<IdentityConfig>,
    pub session: SessionConfig,
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

        let listings_csv = non_empty_var("LISTINGS_CSV").map(PathBuf::from);

        let ttl_secs = match non_empty_var("SESSION_TTL_SECS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidSessionTtl)?,
            None => DEFAULT_SESSION_TTL_SECS,
        };

        let identity = match (non_empty_var("IDENTITY_URL"), non_empty_var("IDENTITY_API_KEY")) {
            (Some(raw_url), Some(api_key)) => {
                let base_url = url::Url::parse(&raw_url)
                    .map_err(|source| ConfigError::InvalidIdentityUrl { source })?;
                Some(IdentityConfig { base_url, api_key })
            }
            (Some(_), None) => return Err(ConfigError::MissingIdentityKey),
            _ => None,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            catalog: CatalogConfig { listings_csv },
            identity,
            session: SessionConfig { ttl_secs },
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
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

/// Where the listing catalog is loaded from. `None` means the built-in seed.
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub listings_csv: Option<PathBuf>,
}

/// Hosted identity/profile backend. Absent in local development.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub base_url: url::Url,
    pub api_key: String,
}

const DEFAULT_SESSION_TTL_SECS: u32 = 3600;

/// Upper bound on how long a signed-in session is honoured.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub ttl_secs: u32,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidIdentityUrl { source: url::ParseError },
    MissingIdentityKey,
    InvalidSessionTtl,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidIdentityUrl { .. } => {
                write!(f, "IDENTITY_URL must be an absolute URL")
            }
            ConfigError::MissingIdentityKey => {
                write!(f, "IDENTITY_API_KEY is required when IDENTITY_URL is set")
            }
            ConfigError::InvalidSessionTtl => {
                write!(f, "SESSION_TTL_SECS must be a positive number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::MissingIdentityKey
            | ConfigError::InvalidSessionTtl => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidIdentityUrl { source } => Some(source),
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
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("LISTINGS_CSV");
        env::remove_var("IDENTITY_URL");
        env::remove_var("IDENTITY_API_KEY");
        env::remove_var("SESSION_TTL_SECS");
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
        assert!(config.catalog.listings_csv.is_none());
        assert!(config.identity.is_none());
        assert_eq!(config.session.ttl_secs, 3600);
    }

    #[test]
    fn session_ttl_must_be_positive() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SESSION_TTL_SECS", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidSessionTtl)
        ));

        env::set_var("SESSION_TTL_SECS", "900");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.session.ttl_secs, 900);
        reset_env();
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
    fn rejects_non_numeric_port() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PORT", "eighty");
        assert!(matches!(AppConfig::load(), Err(ConfigError::InvalidPort)));
        reset_env();
    }

    #[test]
    fn identity_backend_requires_both_url_and_key() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("IDENTITY_URL", "https://project.example.co");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::MissingIdentityKey)
        ));

        env::set_var("IDENTITY_API_KEY", "anon-key");
        let config = AppConfig::load().expect("identity config loads");
        let identity = config.identity.expect("identity configured");
        assert_eq!(identity.base_url.host_str(), Some("project.example.co"));
        assert_eq!(identity.api_key, "anon-key");
        reset_env();
    }
}
