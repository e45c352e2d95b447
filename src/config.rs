use std::time::Duration;

use dotenvy::dotenv;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub secret: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub token_ttl_hours: i64,
    pub admin: Option<AdminSeed>,
}

/// Credentials of the admin account created on first start.
#[derive(Clone, Debug)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let database_url = required("DATABASE_URL")?;
        let secret = required("SECRET")?;

        let port = parse_or(&lookup, "PORT", 3000u16)?;
        let timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 10u64)?;
        let token_ttl_hours = parse_or(&lookup, "TOKEN_TTL_HOURS", 24i64)?;

        let admin = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminSeed { email, password })
            }
            _ => None,
        };

        Ok(Config {
            database_url,
            secret,
            port,
            request_timeout: Duration::from_secs(timeout_secs),
            token_ttl_hours,
            admin,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) if !value.is_empty() => value
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        _ => Ok(default),
    }
}
