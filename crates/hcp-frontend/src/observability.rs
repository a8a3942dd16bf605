//! Tracing subscriber with a log level that can change at runtime.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type FilterHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

static LOG_RELOAD_HANDLE: OnceLock<FilterHandle> = OnceLock::new();

pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Installs the global subscriber at `level`. `RUST_LOG` wins when set.
///
/// Once a subscriber is installed, later calls only change the level.
pub fn init_tracing_with_level(level: &str) {
    if LOG_RELOAD_HANDLE.get().is_some() {
        apply_logging_level(level);
        return;
    }

    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));
    let (reload_layer, handle) = reload::Layer::new(filter);

    let installed = tracing_subscriber::registry()
        .with(reload_layer)
        .with(fmt::layer())
        .try_init();
    match installed {
        Ok(()) => {
            if LOG_RELOAD_HANDLE.set(handle).is_err() {
                tracing::debug!("log level handle was registered concurrently");
            }
        }
        // Someone else owns the global subscriber; levels are theirs to set.
        Err(e) => tracing::debug!(error = %e, "tracing subscriber already installed"),
    }
}

/// Switches the log level of the installed subscriber.
///
/// Returns `false` if no reloadable subscriber is installed or the filter
/// could not be applied.
pub fn apply_logging_level(level: &str) -> bool {
    let Some(handle) = LOG_RELOAD_HANDLE.get() else {
        return false;
    };
    let filter = match EnvFilter::try_new(level) {
        Ok(filter) => filter,
        Err(e) => {
            tracing::warn!(level, error = %e, "ignoring invalid log level");
            return false;
        }
    };
    match handle.modify(|current| *current = filter) {
        Ok(()) => {
            tracing::debug!(level, "log level changed");
            true
        }
        Err(e) => {
            tracing::warn!(level, error = %e, "failed to change log level");
            false
        }
    }
}
