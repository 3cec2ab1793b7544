use crate::error::AppError;
use crate::storage::json_store;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "MEAL_PLANNER_CONFIG_PATH";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store_path: Option<PathBuf>,
    pub environment: String,
    pub seed: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            store_path: None,
            environment: DEFAULT_ENVIRONMENT.to_string(),
            seed: true,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Configured store location, or the per-user default.
    pub fn resolved_store_path(&self) -> Result<PathBuf, AppError> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => json_store::store_path(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub store_path: Option<PathBuf>,
    pub environment: Option<String>,
    pub seed: Option<bool>,
    pub log_level: Option<String>,
}

impl ConfigOverrides {
    /// Reads the deployment variables: `HOST`, `PORT`, `ENVIRONMENT`,
    /// `MEAL_PLANNER_STORE_PATH`, `MEAL_PLANNER_SEED` and `RUST_LOG`.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = read("PORT")
            .map(|value| parse_port(&value))
            .transpose()?;
        let seed = read("MEAL_PLANNER_SEED")
            .map(|value| parse_bool("MEAL_PLANNER_SEED", &value))
            .transpose()?;

        Ok(Self {
            host: read("HOST"),
            port,
            store_path: read(json_store::STORE_PATH_ENV_VAR).map(PathBuf::from),
            environment: read("ENVIRONMENT"),
            seed,
            log_level: read("RUST_LOG"),
        })
    }
}

pub fn parse_port(raw: &str) -> Result<u16, AppError> {
    raw.trim()
        .parse::<u16>()
        .map_err(|_| AppError::invalid_data(format!("port must be 0-65535 (got '{raw}')")))
}

pub fn parse_bool(field: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::invalid_data(format!(
            "{field} must be a boolean (got '{raw}')"
        ))),
    }
}

/// Normalises an environment label. Blank input is the default environment.
pub fn canonical_environment_name(raw: &str) -> String {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    match cleaned.trim_matches('_') {
        "" | "dev" | "develop" | "local" => DEFAULT_ENVIRONMENT.to_string(),
        "prod" | "live" => "production".to_string(),
        "stage" | "stg" => "staging".to_string(),
        "test" | "ci" => "testing".to_string(),
        other => other.to_string(),
    }
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("meal_planner")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("meal_planner")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    Ok(normalize_config(config))
}

fn normalize_config(mut config: Config) -> Config {
    config.environment = canonical_environment_name(&config.environment);
    config
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(host) = overrides.host.as_ref() {
        merged.host = host.trim().to_string();
    }
    if let Some(port) = overrides.port {
        merged.port = port;
    }
    if let Some(store_path) = overrides.store_path.as_ref() {
        merged.store_path = Some(store_path.clone());
    }
    if let Some(environment) = overrides.environment.as_ref() {
        merged.environment = canonical_environment_name(environment);
    }
    if let Some(seed) = overrides.seed {
        merged.seed = seed;
    }
    if let Some(log_level) = overrides.log_level.as_ref() {
        merged.log_level = log_level.trim().to_string();
    }

    merged
}
