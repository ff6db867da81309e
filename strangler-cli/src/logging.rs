use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialises structured logging: `RUST_LOG` controls verbosity, `info` by
/// default.
///
/// Grounded on `barter::logging::init_logging`.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .init()
}
