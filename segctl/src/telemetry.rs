//! Tracing initialization.
//!
//! Sets up a `tracing-subscriber` registry with console output. Log levels are
//! controlled through `RUST_LOG` (default `info`), for example:
//!
//! ```bash
//! RUST_LOG=segctl=debug,tower_http=debug,sqlx=warn
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default filter directive when `RUST_LOG` is unset or invalid
const DEFAULT_FILTER: &str = "info";

/// Initialize tracing with a console (fmt) layer filtered by `RUST_LOG`.
///
/// Fails if a global subscriber has already been installed.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");
    Ok(())
}
