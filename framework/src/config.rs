use dotenv::dotenv;
use log::debug;
use std::env;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum Env {
    Dev,
    Prod,
}

impl Env {
    /// Unset means production; anything not naming production is dev.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("prod" | "production") => Env::Prod,
            Some(_) => Env::Dev,
        }
    }

    /// Default `env_logger` filter when `RUST_LOG` is not set.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        match self {
            Env::Dev => "debug",
            Env::Prod => "info",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub env: Env,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub rate_limit_seconds: u64,
    pub rate_limit_burst: u32,
}

impl Config {
    /// # Errors
    ///
    /// Fails when `JWT_SECRET` is missing or a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Fails when `JWT_SECRET` is missing or a numeric variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env::parse(lookup("ENV").as_deref());

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Ok(Self {
            env,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            jwt_secret,
            rate_limit_seconds: parse_or(&lookup, "RATE_LIMIT_SECONDS", 1)?,
            rate_limit_burst: parse_or(&lookup, "RATE_LIMIT_BURST", 100)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some(value) = lookup(name) else {
        return Ok(default);
    };
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

/// Loads `.env` unless `ENV` explicitly names production.
pub fn load_env_file() {
    if !matches!(env::var("ENV").as_deref(), Ok("prod" | "production")) {
        dotenv().ok();
        debug!("Running in DEV mode, .env loaded.");
    } else {
        debug!("Running in PROD mode, skip loading .env file.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();

        assert_eq!(config.env, Env::Prod);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.rate_limit_seconds, 1);
        assert_eq!(config.rate_limit_burst, 100);
    }

    #[test]
    fn secret_is_required() {
        let err = Config::from_lookup(lookup(&[("PORT", "3000")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));

        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn bad_port_is_reported() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "x"), ("PORT", "eighty")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "PORT",
                value: "eighty".to_string()
            }
        );
    }

    #[test]
    fn env_names() {
        assert_eq!(Env::parse(None), Env::Prod);
        assert_eq!(Env::parse(Some("production")), Env::Prod);
        assert_eq!(Env::parse(Some("dev")), Env::Dev);
        assert_eq!(Env::parse(Some("staging")), Env::Dev);
        assert_eq!(Env::Dev.log_filter(), "debug");
        assert_eq!(Env::Prod.log_filter(), "info");
    }
}
