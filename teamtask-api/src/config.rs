//! Configuration management for the API server
//!
//! Loaded from environment variables, with `.env` support for development.
//!
//! # Environment Variables
//!
//! - `API_HOST` (default `0.0.0.0`), `API_PORT` (default `5000`)
//! - `CORS_ORIGINS`: comma-separated origins, `*` for any (default `*`)
//! - `BODY_LIMIT_MB`: request body cap, sized for base64 photos (default `50`)
//! - `DATABASE_URL` (required), `DATABASE_MAX_CONNECTIONS` (default `10`)
//! - `JWT_SECRET` (required, at least 32 characters), `JWT_EXPIRATION_HOURS` (default `1`)
//! - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET` (required)
//! - `CLOUDINARY_API_BASE` (default `https://api.cloudinary.com/v1_1`)
//! - `CLOUDINARY_SIGNATURE_ALGORITHM`: `sha1` or `sha256` (default `sha1`)
//! - `UPLOAD_TIMEOUT_SECS` (default `30`)
//! - `TASKS_REQUIRE_START_BEFORE_SUBMIT` (default `false`)
//! - `LOG_FORMAT`: `json` for JSON logs, anything else for plain text
//!
//! # Example
//!
//! ```no_run
//! use teamtask_api::config::Config;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! println!("Server will listen on {}", config.bind_address());
//! # Ok(())
//! # }
//! ```

use anyhow::Context;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use teamtask_shared::upload::cloudinary::{CloudinaryConfig, SignatureAlgorithm, DEFAULT_API_BASE};

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub upload: UploadConfig,
    pub tasks: TaskConfig,
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any
    pub cors_origins: Vec<String>,

    /// Maximum request body in bytes
    pub body_limit_bytes: usize,
}

/// Database settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// JWT settings
#[derive(Clone)]
pub struct JwtConfig {
    /// HS256 signing secret, at least 32 characters
    pub secret: String,
    pub expiration_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

/// Object store settings
#[derive(Clone)]
pub struct UploadConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
    pub signature_algorithm: SignatureAlgorithm,
    pub timeout: Duration,
}

impl std::fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_base", &self.api_base)
            .field("signature_algorithm", &self.signature_algorithm)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl UploadConfig {
    pub fn cloudinary(&self) -> CloudinaryConfig {
        CloudinaryConfig {
            cloud_name: self.cloud_name.clone(),
            api_key: self.api_key.clone(),
            api_secret: self.api_secret.clone(),
            api_base: self.api_base.clone(),
            timeout: self.timeout,
            signature_algorithm: self.signature_algorithm,
        }
    }
}

/// Task lifecycle settings
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskConfig {
    pub require_start_before_submit: bool,
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<String> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("{key} environment variable is required"))
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from any key-value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let body_limit_mb: usize = parse_or(&lookup, "BODY_LIMIT_MB", 50)?;

        let jwt_secret = required(&lookup, "JWT_SECRET")?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }
        let expiration_hours: i64 = parse_or(&lookup, "JWT_EXPIRATION_HOURS", 1)?;
        if expiration_hours <= 0 {
            anyhow::bail!("JWT_EXPIRATION_HOURS must be positive");
        }

        Ok(Self {
            api: ApiConfig {
                host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "API_PORT", 5000)?,
                cors_origins,
                body_limit_bytes: body_limit_mb * 1024 * 1024,
            },
            database: DatabaseConfig {
                url: required(&lookup, "DATABASE_URL")?,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_hours,
            },
            upload: UploadConfig {
                cloud_name: required(&lookup, "CLOUDINARY_CLOUD_NAME")?,
                api_key: required(&lookup, "CLOUDINARY_API_KEY")?,
                api_secret: required(&lookup, "CLOUDINARY_API_SECRET")?,
                api_base: lookup("CLOUDINARY_API_BASE")
                    .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                signature_algorithm: parse_or(
                    &lookup,
                    "CLOUDINARY_SIGNATURE_ALGORITHM",
                    SignatureAlgorithm::default(),
                )?,
                timeout: Duration::from_secs(parse_or(&lookup, "UPLOAD_TIMEOUT_SECS", 30)?),
            },
            tasks: TaskConfig {
                require_start_before_submit: parse_or(
                    &lookup,
                    "TASKS_REQUIRE_START_BEFORE_SUBMIT",
                    false,
                )?,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Lifetime of issued tokens
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.jwt.expiration_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgresql://localhost/teamtask"),
            ("JWT_SECRET", "test-secret-key-at-least-32-bytes-long"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "key"),
            ("CLOUDINARY_API_SECRET", "secret"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> anyhow::Result<Config> {
        Config::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_env()).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.api.cors_origins, vec!["*".to_string()]);
        assert_eq!(config.api.body_limit_bytes, 50 * 1024 * 1024);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.token_ttl(), chrono::Duration::hours(1));
        assert_eq!(config.upload.api_base, DEFAULT_API_BASE);
        assert_eq!(config.upload.timeout, Duration::from_secs(30));
        assert_eq!(config.upload.signature_algorithm, SignatureAlgorithm::Sha1);
        assert!(!config.tasks.require_start_before_submit);
    }

    #[test]
    fn test_overrides() {
        let mut env = base_env();
        env.insert("API_PORT", "8080");
        env.insert("CORS_ORIGINS", "https://a.example, https://b.example");
        env.insert("TASKS_REQUIRE_START_BEFORE_SUBMIT", "true");
        env.insert("JWT_EXPIRATION_HOURS", "12");

        let config = load(&env).unwrap();
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.api.cors_origins.len(), 2);
        assert!(config.tasks.require_start_before_submit);
        assert_eq!(config.token_ttl(), chrono::Duration::hours(12));
    }

    #[test]
    fn test_missing_required() {
        let mut env = base_env();
        env.remove("DATABASE_URL");
        assert!(load(&env).is_err());

        let mut env = base_env();
        env.remove("CLOUDINARY_API_SECRET");
        assert!(load(&env).is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut env = base_env();
        env.insert("JWT_SECRET", "too-short");
        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn test_bad_number_rejected() {
        let mut env = base_env();
        env.insert("API_PORT", "eighty");
        assert!(load(&env).is_err());
    }

    #[test]
    fn test_signature_algorithm_override() {
        let mut env = base_env();
        env.insert("CLOUDINARY_SIGNATURE_ALGORITHM", "sha256");
        let config = load(&env).unwrap();
        assert_eq!(
            config.upload.cloudinary().signature_algorithm,
            SignatureAlgorithm::Sha256
        );

        env.insert("CLOUDINARY_SIGNATURE_ALGORITHM", "md5");
        assert!(load(&env).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&base_env()).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("test-secret-key"));
    }
}
