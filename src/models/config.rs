use crate::models::auth::{MAX_PASSWORD_LEN, MAX_USERNAME_LEN};
use anyhow::{bail, Context, Result};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub provider: ProviderConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Layers defaults, `config.toml`, `APP__*` variables and the plain
    /// deployment variables (`PORT`, `GEMINI_API_KEY`, ...) in that order.
    pub fn load() -> Result<Self> {
        // A missing .env is normal outside local development
        let _ = dotenvy::dotenv();

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .set_override_option("server.port", env::var("PORT").ok())?
            .set_override_option("server.static_dir", env::var("STATIC_DIR").ok())?
            .set_override_option("server.trust_proxy", env::var("TRUST_PROXY").ok())?
            .set_override_option("server.proxy_hops", env::var("PROXY_HOPS").ok())?
            .set_override_option("auth.enabled", env::var("AUTH_ENABLED").ok())?
            .set_override_option("auth.username", env::var("ADMIN_USERNAME").ok())?
            .set_override_option("auth.password", env::var("ADMIN_PASSWORD").ok())?
            .set_override_option("auth.session_secret", env::var("SESSION_SECRET").ok())?
            .set_override_option(
                "auth.production",
                env::var("NODE_ENV").ok().map(|v| v == "production"),
            )?
            .set_override_option("provider.api_key", env::var("GEMINI_API_KEY").ok())?
            .set_override_option("provider.model", env::var("GEMINI_MODEL").ok())?
            .build()
            .context("Failed to assemble configuration sources")?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Checks cross-field requirements and fills in generated values. Run
    /// after logging is up so the generated-secret warning is recorded.
    pub fn finalize(&mut self) -> Result<()> {
        if self.auth.enabled {
            if self.auth.username.as_deref().map_or(true, str::is_empty)
                || self.auth.password.as_deref().map_or(true, str::is_empty)
            {
                bail!("ADMIN_USERNAME and ADMIN_PASSWORD must be set when authentication is enabled");
            }

            if self.auth.username.as_deref().map_or(0, str::len) > MAX_USERNAME_LEN {
                bail!("ADMIN_USERNAME must be at most {MAX_USERNAME_LEN} bytes");
            }
            if self.auth.password.as_deref().map_or(0, str::len) > MAX_PASSWORD_LEN {
                bail!("ADMIN_PASSWORD must be at most {MAX_PASSWORD_LEN} bytes");
            }

            if self.auth.session_secret.as_deref().map_or(true, str::is_empty) {
                warn!("SESSION_SECRET not set; generated a random one, sessions will not survive restarts");
                self.auth.session_secret = Some(random_secret());
            }
        }

        if self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0 {
            bail!("rate_limit.max_requests and rate_limit.window_secs must be positive");
        }

        Ok(())
    }
}

fn random_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: String,
    pub trust_proxy: bool,
    /// Number of trusted proxies in front of the service when `trust_proxy`
    /// is on.
    pub proxy_hops: usize,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            static_dir: "dist".to_string(),
            trust_proxy: false,
            proxy_hops: 1,
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub enabled: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub session_secret: Option<String>,
    pub production: bool,
    pub session_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            username: None,
            password: None,
            session_secret: None,
            production: false,
            session_days: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub timeout_secs: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash-image".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window_secs: 60,
            sweep_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: "logs".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_contract() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.body_limit_bytes, 10 * 1024 * 1024);
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.auth.session_days, 7);
        assert!(!config.auth.enabled);
        assert!(config.provider.timeout_secs.is_none());
    }

    #[test]
    fn auth_variant_requires_credentials() {
        let mut config = AppConfig::default();
        config.auth.enabled = true;
        config.auth.username = Some("admin".to_string());
        assert!(config.finalize().is_err());
    }

    #[test]
    fn overlong_credentials_are_refused_at_startup() {
        let mut config = AppConfig::default();
        config.auth.enabled = true;
        config.auth.username = Some("admin".to_string());
        config.auth.password = Some("p".repeat(MAX_PASSWORD_LEN + 22));
        assert!(config.finalize().is_err());

        config.auth.password = Some("p".repeat(MAX_PASSWORD_LEN));
        config.auth.username = Some("u".repeat(MAX_USERNAME_LEN + 1));
        assert!(config.finalize().is_err());

        config.auth.username = Some("u".repeat(MAX_USERNAME_LEN));
        assert!(config.finalize().is_ok());
    }

    #[test]
    fn proxy_header_is_untrusted_by_default() {
        let config = AppConfig::default();
        assert!(!config.server.trust_proxy);
        assert_eq!(config.server.proxy_hops, 1);
    }

    #[test]
    fn missing_session_secret_is_generated() {
        let mut config = AppConfig::default();
        config.auth.enabled = true;
        config.auth.username = Some("admin".to_string());
        config.auth.password = Some("hunter2".to_string());

        config.finalize().unwrap();
        let secret = config.auth.session_secret.unwrap();
        assert_eq!(secret.len(), 64);
    }

    #[test]
    fn public_variant_needs_no_credentials() {
        let mut config = AppConfig::default();
        assert!(config.finalize().is_ok());
        assert!(config.auth.session_secret.is_none());
    }
}
