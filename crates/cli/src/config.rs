//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::{builder::BoolishValueParser, Args, Parser, Subcommand, ValueHint};
use config::{Config, Environment, File};
use render_controller::ViewerCommand;
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const LOCAL_CONFIG_BASENAME: &str = "dashdoc";
const DEFAULT_OUTPUT_DIR: &str = "out";
const DEFAULT_QUEUE_CAPACITY: u64 = 16;
const DEFAULT_UNMOUNT_GRACE_MS: u64 = 2_000;

/// Command-line arguments for the dashdoc binary.
#[derive(Debug, Parser)]
#[command(name = "dashdoc", version, about = "Render dashboard documents to PDF")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "DASHDOC_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render a template and download and/or show the result.
    Render(RenderArgs),
    /// List the known template identifiers.
    Templates,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Template identifier, e.g. ContractPDF.
    #[arg(value_name = "TEMPLATE")]
    pub template: String,

    /// JSON props, or an API response envelope of contracts.
    #[arg(value_name = "PROPS_FILE", value_hint = ValueHint::FilePath)]
    pub props_file: PathBuf,

    /// Open the rendered document in the configured viewer.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub show: bool,

    /// Skip writing the document to the output directory.
    #[arg(long = "no-download", action = clap::ArgAction::SetTrue)]
    pub no_download: bool,

    #[command(flatten)]
    pub overrides: RenderOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RenderOverrides {
    /// Override the directory downloads are written to.
    #[arg(long = "output-dir", value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Override the viewer command used by --show.
    #[arg(long = "viewer", value_name = "COMMAND")]
    pub viewer: Option<String>,

    /// Override the unmount grace window in milliseconds.
    #[arg(long = "unmount-grace-ms", value_name = "MILLIS")]
    pub unmount_grace_ms: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub worker: WorkerSettings,
    pub controller: ControllerSettings,
    pub output: OutputSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logging: LoggingSettings {
                level: LevelFilter::INFO,
                format: LogFormat::Compact,
            },
            worker: WorkerSettings {
                queue_capacity: DEFAULT_QUEUE_CAPACITY as usize,
                origin: render_worker::DEFAULT_ORIGIN.to_string(),
            },
            controller: ControllerSettings {
                unmount_grace: Duration::from_millis(DEFAULT_UNMOUNT_GRACE_MS),
            },
            output: OutputSettings {
                directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
                viewer: None,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub queue_capacity: usize,
    pub origin: String,
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub unmount_grace: Duration,
}

#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub directory: PathBuf,
    pub viewer: Option<ViewerCommand>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder =
        Config::builder().add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("DASHDOC").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    if let Command::Render(args) = &cli.command {
        raw.apply_render_overrides(&args.overrides);
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    worker: RawWorkerSettings,
    controller: RawControllerSettings,
    output: RawOutputSettings,
}

impl RawSettings {
    fn apply_render_overrides(&mut self, overrides: &RenderOverrides) {
        if let Some(dir) = overrides.output_dir.as_ref() {
            self.output.directory = Some(dir.clone());
        }
        if let Some(viewer) = overrides.viewer.as_ref() {
            self.output.viewer = Some(viewer.clone());
        }
        if let Some(ms) = overrides.unmount_grace_ms {
            self.controller.unmount_grace_ms = Some(ms);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            worker,
            controller,
            output,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            worker: build_worker_settings(worker)?,
            controller: build_controller_settings(controller),
            output: build_output_settings(output),
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_worker_settings(worker: RawWorkerSettings) -> Result<WorkerSettings, LoadError> {
    let capacity = worker.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY);
    if capacity == 0 {
        return Err(LoadError::invalid(
            "worker.queue_capacity",
            "must be greater than zero",
        ));
    }
    let queue_capacity = usize::try_from(capacity).map_err(|_| {
        LoadError::invalid("worker.queue_capacity", "value exceeds supported range")
    })?;

    let origin = match worker.origin {
        Some(origin) => {
            let trimmed = origin.trim();
            if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
                return Err(LoadError::invalid(
                    "worker.origin",
                    format!("`{origin}` is not a valid blob origin"),
                ));
            }
            trimmed.to_string()
        }
        None => render_worker::DEFAULT_ORIGIN.to_string(),
    };

    Ok(WorkerSettings {
        queue_capacity,
        origin,
    })
}

fn build_controller_settings(controller: RawControllerSettings) -> ControllerSettings {
    ControllerSettings {
        unmount_grace: Duration::from_millis(
            controller
                .unmount_grace_ms
                .unwrap_or(DEFAULT_UNMOUNT_GRACE_MS),
        ),
    }
}

fn build_output_settings(output: RawOutputSettings) -> OutputSettings {
    OutputSettings {
        directory: output
            .directory
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        viewer: output.viewer.as_deref().and_then(ViewerCommand::parse),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawWorkerSettings {
    queue_capacity: Option<u64>,
    origin: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawControllerSettings {
    unmount_grace_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawOutputSettings {
    directory: Option<PathBuf>,
    viewer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_applied() {
        let settings = Settings::from_raw(RawSettings::default()).unwrap();

        assert_eq!(settings.logging.level, LevelFilter::INFO);
        assert_eq!(settings.logging.format, LogFormat::Compact);
        assert_eq!(settings.worker.queue_capacity, 16);
        assert_eq!(settings.worker.origin, "dashdoc");
        assert_eq!(settings.controller.unmount_grace, Duration::from_secs(2));
        assert_eq!(settings.output.directory, PathBuf::from("out"));
        assert!(settings.output.viewer.is_none());
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.output.directory = Some(PathBuf::from("from-file"));
        raw.logging.level = Some("warn".to_string());

        let overrides = RenderOverrides {
            output_dir: Some(PathBuf::from("from-cli")),
            viewer: Some("xdg-open".to_string()),
            unmount_grace_ms: Some(250),
            log_level: Some("debug".to_string()),
            log_json: Some(true),
        };
        raw.apply_render_overrides(&overrides);

        let settings = Settings::from_raw(raw).unwrap();
        assert_eq!(settings.output.directory, PathBuf::from("from-cli"));
        assert_eq!(
            settings.output.viewer.map(|v| v.program),
            Some("xdg-open".to_string())
        );
        assert_eq!(settings.controller.unmount_grace, Duration::from_millis(250));
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut raw = RawSettings::default();
        raw.logging.level = Some("loud".to_string());

        let err = Settings::from_raw(raw).unwrap_err();
        assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));
    }

    #[test]
    fn zero_queue_capacity_is_rejected() {
        let mut raw = RawSettings::default();
        raw.worker.queue_capacity = Some(0);

        let err = Settings::from_raw(raw).unwrap_err();
        assert!(matches!(err, LoadError::Invalid { key: "worker.queue_capacity", .. }));
    }

    #[test]
    fn malformed_origin_is_rejected() {
        let mut raw = RawSettings::default();
        raw.worker.origin = Some("  ".to_string());
        assert!(Settings::from_raw(raw).is_err());

        let mut raw = RawSettings::default();
        raw.worker.origin = Some("local host".to_string());
        assert!(Settings::from_raw(raw).is_err());

        let mut raw = RawSettings::default();
        raw.worker.origin = Some("http://localhost:3000".to_string());
        let settings = Settings::from_raw(raw).unwrap();
        assert_eq!(settings.worker.origin, "http://localhost:3000");
    }

    #[test]
    fn file_source_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[output]\ndirectory = \"contracts\"\n\n[worker]\nqueue_capacity = 4\n",
        )
        .unwrap();

        let cli = CliArgs::parse_from([
            "dashdoc",
            "--config-file",
            path.to_str().unwrap(),
            "templates",
        ]);
        let settings = load(&cli).unwrap();
        assert_eq!(settings.output.directory, PathBuf::from("contracts"));
        assert_eq!(settings.worker.queue_capacity, 4);
    }

    #[test]
    fn render_command_parses() {
        let cli = CliArgs::parse_from([
            "dashdoc",
            "render",
            "ContractPDF",
            "contract.json",
            "--show",
            "--no-download",
            "--output-dir",
            "pdfs",
        ]);
        let Command::Render(args) = cli.command else {
            panic!("expected render command");
        };
        assert_eq!(args.template, "ContractPDF");
        assert!(args.show);
        assert!(args.no_download);
        assert_eq!(args.overrides.output_dir, Some(PathBuf::from("pdfs")));
    }
}
