use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub reset: ResetLinkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/crescendo.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 6700,
            cors_allowed_origins: vec![
                "http://localhost:6700".to_string(),
                "http://127.0.0.1:6700".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HMAC secret for signing session tokens.
    /// Overridable via the CRESCENDO_JWT_SECRET environment variable.
    pub jwt_secret: String,

    /// Session token lifetime in minutes.
    pub token_ttl_minutes: i64,

    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    pub password: PasswordPolicyConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "crescendo-dev-secret-change-me".to_string(),
            token_ttl_minutes: 60,
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            password: PasswordPolicyConfig::default(),
        }
    }
}

/// Password format policy applied at registration and password reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicyConfig {
    pub min_length: usize,

    pub max_length: usize,

    pub require_uppercase: bool,

    pub require_lowercase: bool,

    pub require_digit: bool,

    pub require_special: bool,

    /// Message surfaced to clients when a password fails the policy.
    pub invalid_message: String,
}

impl Default for PasswordPolicyConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 16,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: false,
            invalid_message:
                "Password must be 8-16 characters with at least one uppercase letter, \
                 one lowercase letter and one digit"
                    .to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetLinkConfig {
    /// Validity window for password reset links, in hours.
    pub link_ttl_hours: i64,
}

impl Default for ResetLinkConfig {
    fn default() -> Self {
        Self {
            link_ttl_hours: crate::constants::reset::LINK_TTL_HOURS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            reset: ResetLinkConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });

        if let Ok(secret) = std::env::var("CRESCENDO_JWT_SECRET") {
            config.security.jwt_secret = secret;
        }

        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("crescendo").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".crescendo").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.security.jwt_secret.is_empty() {
            anyhow::bail!("JWT secret cannot be empty");
        }

        if self.security.password.min_length == 0
            || self.security.password.min_length > self.security.password.max_length
        {
            anyhow::bail!("Password policy length bounds are inconsistent");
        }

        if self.reset.link_ttl_hours <= 0 {
            anyhow::bail!("Reset link TTL must be positive");
        }

        Ok(())
    }
}
