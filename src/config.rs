// Environment configuration
//
// All environment reads happen here, once, at startup; the rest of the code
// receives the resulting Config by value and never touches ambient state.

use std::env;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for environment variable {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Process-wide token signing secret
    pub jwt_secret: String,
    /// Mark session cookies Secure (on in production deployments)
    pub secure_cookies: bool,
    pub smtp: SmtpConfig,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn optional(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let smtp_user = required("EMAIL_USER")?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: optional("HOST", "0.0.0.0"),
            port: optional("PORT", "8080")
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT"))?,
            jwt_secret: required("JWT_SECRET")?,
            secure_cookies: optional("SECURE_COOKIES", "false")
                .parse()
                .map_err(|_| ConfigError::Invalid("SECURE_COOKIES"))?,
            smtp: SmtpConfig {
                host: required("EMAIL_HOST")?,
                port: optional("EMAIL_PORT", "587")
                    .parse()
                    .map_err(|_| ConfigError::Invalid("EMAIL_PORT"))?,
                from_address: optional("EMAIL_FROM", &smtp_user),
                password: required("EMAIL_PASS")?,
                username: smtp_user,
            },
        })
    }
}
