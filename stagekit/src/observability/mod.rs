//! Logging setup.
//!
//! The crate logs through `tracing` macros and never installs a subscriber
//! itself. Hosts that have no subscriber of their own can call
//! [`init_tracing`].

use crate::config::LogConfig;
use tracing_subscriber::EnvFilter;

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over [`LogConfig::filter`]. Returns false if
/// a global subscriber was already installed, in which case nothing
/// changes.
pub fn init_tracing(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}
