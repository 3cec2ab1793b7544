use clap::{Parser, Subcommand};
use meal_core::config::{ConfigOverrides, parse_bool, parse_port};
use meal_core::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Meal planner task service", long_about = None)]
pub struct Cli {
    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log at the configured level instead of warnings only
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    ///
    /// Example: meal_planner serve --port 8080
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// List tasks ordered by priority
    ///
    /// Example: meal_planner list --status planned --category side
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Show details of a task
    ///
    /// Example: meal_planner show 2
    Show { id: u64 },
    /// Add a new task
    ///
    /// Example: meal_planner add "Gravy" --category side --priority 3
    Add {
        name: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        priority: Option<i64>,
    },
    /// Set the status of a task
    ///
    /// Example: meal_planner status 2 completed
    Status { id: u64, status: String },
    /// Apply a JSON patch to a task
    ///
    /// Example: meal_planner update 2 '{"priority": 5, "notes": "after the pie"}'
    Update { id: u64, patch: String },
    /// Show completion statistics
    ///
    /// Example: meal_planner stats
    Stats,
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Host,
    Port,
    StorePath,
    Environment,
    Seed,
    LogLevel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let canonical_field = canonicalize_flag_name(key_raw)
        .ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "host" => ConfigOverrideTarget::Host,
        "port" => ConfigOverrideTarget::Port,
        "store_path" | "store" => ConfigOverrideTarget::StorePath,
        "environment" | "env" => ConfigOverrideTarget::Environment,
        "seed" => ConfigOverrideTarget::Seed,
        "log_level" | "log" => ConfigOverrideTarget::LogLevel,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride {
        target,
        value: value_raw.trim().to_string(),
    })
}

/// Folds every `--config-override` value into one set of overrides; later
/// values win.
pub fn collect_config_overrides(raw_values: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();

    for raw in raw_values {
        let parsed = parse_config_override(raw)
            .map_err(|message| AppError::validation(format!("{CONFIG_OVERRIDE_FLAG}: {message}")))?;
        let value = parsed.value;
        match parsed.target {
            ConfigOverrideTarget::Host => overrides.host = Some(value),
            ConfigOverrideTarget::Port => {
                overrides.port = Some(parse_port(&value).map_err(as_validation)?)
            }
            ConfigOverrideTarget::StorePath => overrides.store_path = Some(PathBuf::from(value)),
            ConfigOverrideTarget::Environment => overrides.environment = Some(value),
            ConfigOverrideTarget::Seed => {
                overrides.seed = Some(parse_bool("seed", &value).map_err(as_validation)?)
            }
            ConfigOverrideTarget::LogLevel => overrides.log_level = Some(value),
        }
    }

    Ok(overrides)
}

fn as_validation(err: AppError) -> AppError {
    AppError::validation(format!("{CONFIG_OVERRIDE_FLAG}: {}", err.message()))
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
