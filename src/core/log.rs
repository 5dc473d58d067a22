use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Installs the global subscriber. Output goes to stderr so tables on stdout
/// stay clean; nothing is logged unless `verbose` or `RUST_LOG` is set.
pub fn init_logging(verbose: bool) {
    let from_env = std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();
    let (level_filter, level) = match (verbose, from_env) {
        (true, _) => (LevelFilter::DEBUG, "debug"),
        (false, true) => (LevelFilter::TRACE, "off"),
        (false, false) => (LevelFilter::OFF, "off"),
    };
    let app_filter = Targets::new().with_target("shadowfolio", level_filter);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .pretty()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(app_filter)
        .with(env_filter)
        .init();
}
