//! Tracing initialization (fmt subscriber + `EnvFilter`).
//!
//! Log verbosity is controlled through the standard `RUST_LOG` environment
//! variable, e.g. `RUST_LOG=surgitrack=debug,sqlx=warn`. When the variable
//! is unset or unparsable the filter falls back to `info`.

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize tracing for the whole process.
///
/// Sets up tracing-subscriber with console output (fmt layer) filtered by
/// `RUST_LOG`. Call once at startup, before any request handling.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");

    Ok(())
}
