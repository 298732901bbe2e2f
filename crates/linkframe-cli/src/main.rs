use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use linkframe_core::scripting::{register_rhai_api, ProjectHandle};
use linkframe_core::{LinkSession, NoticeLevel, SyncConfig};
use linkframe_data::model::Project;
use rhai::{Engine, Scope};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable naming a sync config file, used when `--config` is absent.
const CONFIG_ENV: &str = "LINKFRAME_CONFIG";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the project JSON
    #[arg(value_name = "PROJECT")]
    project: PathBuf,

    /// Rhai script to run against the project
    #[arg(long, value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// Where to write the edited project (stdout if omitted)
    #[arg(long, short, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Link same-named layers across ad sizes before running the script
    #[arg(long)]
    auto_link: bool,

    /// Sync config JSON
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogFormat {
    Pretty,
    Json,
}

fn main() {
    let cli = Cli::parse();

    // Initialize Logging
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(cli.log_level).into())
        .from_env_lossy();

    let subscriber_builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match cli.log_format {
        LogFormat::Json => subscriber_builder.json().init(),
        LogFormat::Pretty => subscriber_builder.pretty().init(),
    }

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>, project: &Project) -> Result<SyncConfig> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    let Some(path) = path else {
        return Ok(SyncConfig::default().with_mode(project.mode));
    };
    let text = fs::read_to_string(&path).with_context(|| format!("reading sync config {:?}", path))?;
    SyncConfig::from_json(&text).with_context(|| format!("parsing sync config {:?}", path))
}

fn run(cli: Cli) -> Result<()> {
    info!("Project: {:?}", cli.project);
    let text = fs::read_to_string(&cli.project).with_context(|| format!("reading project {:?}", cli.project))?;
    let mut project: Project =
        serde_json::from_str(&text).with_context(|| format!("parsing project {:?}", cli.project))?;

    let config = load_config(cli.config.as_deref(), &project)?;
    info!(mode = %config.mode, scope = ?config.scope, "Sync config loaded");

    let handle = ProjectHandle::new(LinkSession::new(config), &project.frames);

    if cli.auto_link {
        handle.run(|session, frames| session.auto_link(frames));
    }

    if let Some(script_path) = &cli.script {
        info!("Script: {:?}", script_path);
        let script =
            fs::read_to_string(script_path).with_context(|| format!("reading script {:?}", script_path))?;

        let mut engine = Engine::new();
        register_rhai_api(&mut engine);
        let mut scope = Scope::new();
        scope.push("project", handle.clone());

        engine
            .run_with_scope(&mut scope, &script)
            .map_err(|e| anyhow!("Script Error: {}", e))?;
        info!("Script evaluated successfully.");
    }

    for notice in handle.take_notices() {
        match notice.level {
            NoticeLevel::Info => info!("{}", notice.message),
            NoticeLevel::Warning => warn!("{}", notice.message),
            NoticeLevel::Error => error!("{}", notice.message),
        }
    }

    project.frames = handle.frames();
    let json = serde_json::to_string_pretty(&project).context("serializing project")?;
    match &cli.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {:?}", path))?;
            info!("Output: {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
