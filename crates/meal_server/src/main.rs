use clap::Parser;
use clap::error::ErrorKind;
use meal_core::config::{self, Config, ConfigOverrides, merge_overrides};
use meal_core::error::AppError;
use meal_core::model::{Task, TaskStatus};
use meal_core::patch::{NewTask, TaskPatch};
use meal_core::store::{TaskFilter, TaskStore};
use meal_server::cli::{Cli, Command, collect_config_overrides};
use meal_server::http::{self, AppState};
use meal_server::render;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::validation(message)
}

/// Defaults, then the config file, then environment variables, then
/// `--config-override` values. The file error is returned separately so it
/// can be logged once tracing is up.
fn resolve_config(cli: &Cli) -> Result<(Config, Option<AppError>), AppError> {
    let loaded = config::load_config_with_fallback();
    let from_env = ConfigOverrides::from_env()?;
    let from_flags = collect_config_overrides(&cli.config_override)?;
    let config = merge_overrides(&merge_overrides(&loaded.config, &from_env), &from_flags);
    Ok((config, loaded.error))
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_task(task: &Task, json: bool, verb: &str) -> Result<(), AppError> {
    if json {
        println!("{}", render::to_json(task)?);
    } else {
        println!("{verb} task: {} ({}) [{}]", task.name, task.id, task.status);
    }
    Ok(())
}

fn serve(config: &Config, store: TaskStore) -> Result<(), AppError> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(Arc::new(store), config.environment.clone());
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(http::serve(&addr, state))
}

fn run_command(cli: Cli) -> Result<(), AppError> {
    let (mut config, config_error) = resolve_config(&cli)?;
    let command = cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    });

    let serving = matches!(command, Command::Serve { .. });
    init_tracing(if serving || cli.verbose {
        config.log_level.as_str()
    } else {
        "warn"
    });
    if let Some(err) = config_error {
        warn!(error = %err, "ignoring invalid config file; using defaults");
    }

    if let Command::Serve { host, port } = &command {
        if let Some(host) = host {
            config.host = host.clone();
        }
        if let Some(port) = port {
            config.port = *port;
        }
    }

    let store = TaskStore::open(&config.resolved_store_path()?, config.seed)?;

    match command {
        Command::Serve { .. } => serve(&config, store)?,
        Command::List { status, category } => {
            let filter = TaskFilter::parse(status.as_deref(), category.as_deref())?;
            let tasks = store.list_tasks(&filter);
            if cli.json {
                println!("{}", render::to_json(&tasks)?);
            } else {
                println!("{}", render::tasks_table(&tasks));
            }
        }
        Command::Show { id } => {
            let task = store.get_task(id)?;
            if cli.json {
                println!("{}", render::to_json(&task)?);
            } else {
                println!("{}", render::task_details(&task));
            }
        }
        Command::Add {
            name,
            category,
            priority,
        } => {
            let mut new_task = NewTask::new(name);
            if let Some(category) = category {
                new_task = new_task.with_category(category);
            }
            if let Some(priority) = priority {
                new_task = new_task.with_priority(priority);
            }
            let task = store.create_task(new_task)?;
            print_task(&task, cli.json, "Added")?;
        }
        Command::Status { id, status } => {
            let status: TaskStatus = status.trim().parse().map_err(AppError::validation)?;
            let task = store.update_task(id, &TaskPatch::status(status))?;
            print_task(&task, cli.json, "Updated")?;
        }
        Command::Update { id, patch } => {
            let body: serde_json::Value = serde_json::from_str(&patch)
                .map_err(|err| AppError::validation(format!("patch is not valid JSON: {err}")))?;
            let patch = TaskPatch::from_json(&body)?;
            let task = store.update_task(id, &patch)?;
            print_task(&task, cli.json, "Updated")?;
        }
        Command::Stats => {
            let stats = store.compute_statistics();
            if cli.json {
                println!("{}", render::to_json(&stats)?);
            } else {
                println!("{}", render::statistics_summary(&stats));
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
