use clap::ValueEnum;
use template_inspector::{Error, ErrorDetails};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Clone, Debug, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// This is used when `--debug` is not passed and `RUST_LOG` is not set
const DEFAULT_NON_DEBUG_DIRECTIVES: &str = "warn,inspector_cli=info,template_inspector=info";
/// This is used when `--debug` is passed and `RUST_LOG` is not set
const DEFAULT_DEBUG_DIRECTIVES: &str = "warn,inspector_cli=debug,template_inspector=debug";

/// Set up logging to stderr, leaving stdout for the report.
///
/// If `RUST_LOG` is set it is used verbatim, ignoring `debug`.
pub fn setup_observability(log_format: LogFormat, debug: bool) -> Result<(), Error> {
    let env_var_name = "RUST_LOG";
    let filter = if std::env::var(env_var_name).is_ok() {
        EnvFilter::builder()
            .with_env_var(env_var_name)
            .from_env()
            .map_err(|e| {
                Error::new(ErrorDetails::Observability {
                    message: format!("Invalid `{env_var_name}` environment variable: {e}"),
                })
            })?
    } else {
        default_filter(debug)?
    };

    let log_layer = match log_format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(log_layer)
        .try_init()
        .map_err(|e| {
            Error::new(ErrorDetails::Observability {
                message: format!("Failed to install the log subscriber: {e}"),
            })
        })
}

fn default_filter(debug: bool) -> Result<EnvFilter, Error> {
    let directives = if debug {
        DEFAULT_DEBUG_DIRECTIVES
    } else {
        DEFAULT_NON_DEBUG_DIRECTIVES
    };
    EnvFilter::builder().parse(directives).map_err(|e| {
        Error::new(ErrorDetails::Observability {
            message: format!("Failed to parse default directives `{directives}`: {e}"),
        })
    })
}
