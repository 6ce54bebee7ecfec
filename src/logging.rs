use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Install the stderr subscriber once per process.
///
/// `RUST_LOG` wins when set; otherwise the level comes from `log_level`,
/// then `verbose`/`quiet`, then `XLS_HARNESS_LOG_LEVEL`, then `info`.
pub fn init_logging(log_level: Option<&str>, verbose: bool, quiet: bool) {
    INIT.call_once(|| {
        let level = resolve_level(log_level, verbose, quiet);

        let filter = if env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(format!("xls_harness={level},harness_lib={level}"))
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    });
}

fn resolve_level(log_level: Option<&str>, verbose: bool, quiet: bool) -> Level {
    if let Some(level_str) = log_level {
        parse_level(level_str)
    } else if verbose {
        Level::DEBUG
    } else if quiet {
        Level::ERROR
    } else {
        let level_str = env::var("XLS_HARNESS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    }
}

fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}
