//! Logging setup for the `phaseplan` binary.
//!
//! The filter comes from `--log-level` when given, otherwise from the
//! `PHASEPLAN_LOG` environment variable (full `EnvFilter` directives such as
//! `phaseplan=debug`), otherwise `info`. Output goes to stderr so stdout
//! carries only the schedule.

use clap::ValueEnum;
use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_ENV_VAR: &str = "PHASEPLAN_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    fmt()
        .with_env_filter(build_filter(cli_level, env_value.as_deref()))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(level.directive());
    }
    env_value
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
