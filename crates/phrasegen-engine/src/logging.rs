//! Tracing setup for processes that compile modules.

use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;

/// Install a stderr fmt layer filtered by `RUST_LOG`.
///
/// Without `RUST_LOG` the filter is `info`, or `debug` when `debug` is set.
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(debug: bool) -> bool {
    let default_directive = if debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(env_filter);

    Registry::default().with(fmt_layer).try_init().is_ok()
}
