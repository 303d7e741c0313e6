use crate::error::{Error, Result};
use crate::services::workflow::EngineSettings;
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

/// `DATABASE_URL` value selecting the in-process store.
pub const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub database_max_connections: u32,
    pub strict_application_transitions: bool,
    pub seed_demo_users: bool,
    pub cors_permissive: bool,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            database_max_connections: get_env_or("DATABASE_MAX_CONNECTIONS", 20)?,
            strict_application_transitions: get_env_or("STRICT_APPLICATION_TRANSITIONS", false)?,
            seed_demo_users: get_env_or("SEED_DEMO_USERS", false)?,
            cors_permissive: get_env_or("CORS_PERMISSIVE", true)?,
            log_format: log_format_from_env(),
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            strict_application_transitions: self.strict_application_transitions,
        }
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }
}

/// Read before the rest of the configuration so logging is up first.
pub fn log_format_from_env() -> LogFormat {
    match env::var("LOG_FORMAT") {
        Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
        _ => LogFormat::Pretty,
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_values_fall_back_to_defaults() {
        let max: u32 = get_env_or("PLACEMENT_TEST_UNSET_MAX_CONNECTIONS", 20).unwrap();
        assert_eq!(max, 20);
    }

    #[test]
    fn unparsable_values_are_config_errors() {
        env::set_var("PLACEMENT_TEST_BAD_FLAG", "maybe");
        let err = get_env_or::<bool>("PLACEMENT_TEST_BAD_FLAG", false).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
