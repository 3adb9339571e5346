//! Tracing subscriber setup for the CLI.
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Overrides the default filter, e.g. `FXCAST_LOG=fxcast::view=trace`.
pub const LOG_ENV: &str = "FXCAST_LOG";

pub fn init_logging(verbose: bool) {
    let (level_filter, level) = if verbose {
        (LevelFilter::DEBUG, "debug")
    } else {
        (LevelFilter::WARN, "warn")
    };
    // Dependencies (hyper, reqwest) stay at warn unless the env filter says otherwise
    let app_filter = Targets::new()
        .with_target("fxcast", level_filter)
        .with_default(LevelFilter::WARN);
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so rendered tables on stdout stay clean
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .without_time(),
        )
        .with(app_filter)
        .with(env_filter)
        .try_init();

    if let Err(e) = result {
        eprintln!("Logging already initialized: {e}");
    }
}
