//! Tracing subscriber setup for the `actor-link` binary.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT` override (`json`, `pretty`/`human`), if set and recognized.
    pub fn from_env() -> Option<LogFormat> {
        std::env::var("LOG_FORMAT").ok().and_then(|f| Self::parse(&f))
    }

    pub fn parse(value: &str) -> Option<LogFormat> {
        match value.trim().to_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" | "human" => Some(LogFormat::Pretty),
            _ => None,
        }
    }
}

/// Install the global subscriber.
///
/// A valid `RUST_LOG` replaces `level` (trace, debug, info, warn, error)
/// entirely. Logs go to stderr so stdout only carries the search result.
pub fn initialize(level: &str, format: LogFormat) {
    let env_filter = build_filter(std::env::var("RUST_LOG").ok().as_deref(), level);

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .init();
        }
    }
}

fn build_filter(rust_log: Option<&str>, level: &str) -> EnvFilter {
    if let Some(filter) = rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
    {
        return filter;
    }
    let log_level = level.parse().unwrap_or(tracing::Level::INFO);
    EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse_lossy("")
}
