use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use template_inspector::{Inspector, InspectorConfig, MiniJinjaEngine};

use crate::discovery::discover_templates;
use crate::observability::LogFormat;
use crate::report::build_report;

mod discovery;
mod observability;
mod report;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory containing the templates to inspect. Overrides `inspector.template_dir`.
    #[arg(long)]
    templates_dir: Option<PathBuf>,

    /// Path to an `inspector.toml` config file.
    #[arg(long)]
    config_file: Option<PathBuf>,

    /// Sets the log format used for all logs.
    #[arg(long)]
    #[arg(value_enum)]
    #[clap(default_value_t = LogFormat::default())]
    log_format: LogFormat,

    /// Log at debug level unless `RUST_LOG` is set.
    #[arg(long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();
    observability::setup_observability(args.log_format, args.debug)
        .expect_pretty("Failed to set up logs");

    let mut config = match &args.config_file {
        Some(path) => {
            InspectorConfig::load_from_path(path).expect_pretty("Failed to load config file")
        }
        None => InspectorConfig::default(),
    };
    if let Some(dir) = args.templates_dir {
        config.template_dir = Some(dir);
    }
    let templates_dir = config.template_dir.clone().expect_pretty(
        "No template directory: pass `--templates-dir` or set `inspector.template_dir`",
    );

    let sources = discover_templates(&templates_dir, &config.extensions)
        .expect_pretty("Failed to discover templates");
    tracing::info!(
        "Inspecting {} template(s) in {}",
        sources.len(),
        templates_dir.display()
    );

    let inspector = Inspector::new(MiniJinjaEngine::new(&config), &config);
    let report = build_report(&inspector, &sources);
    let failed = report.values().filter(|r| r.is_error()).count();

    let json = serde_json::to_string_pretty(&report).expect_pretty("Failed to serialize report");
    writeln!(std::io::stdout().lock(), "{json}").expect_pretty("Failed to write report");

    if failed > 0 {
        tracing::error!("{failed} template(s) failed inspection");
        std::process::exit(1);
    }
}

/// We don't allow panic, unwrap, or similar methods in the codebase,
/// except for the private `expect_pretty` method, which is to be used only in
/// main.rs during initialization.
///
/// `expect_pretty` logs an error message and exits with a status code of 1.
trait ExpectPretty<T> {
    fn expect_pretty(self, msg: &str) -> T;
}

impl<T, E: Display> ExpectPretty<T> for Result<T, E> {
    fn expect_pretty(self, msg: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::error!("{msg}: {err}");
                std::process::exit(1);
            }
        }
    }
}

impl<T> ExpectPretty<T> for Option<T> {
    fn expect_pretty(self, msg: &str) -> T {
        match self {
            Some(value) => value,
            None => {
                tracing::error!("{msg}");
                std::process::exit(1);
            }
        }
    }
}
