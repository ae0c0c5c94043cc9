//! Subscriber setup for the `strand` binary.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_DIRECTIVES: &str = "info";

/// Installs the global subscriber.
///
/// Run and node events are emitted under the `strand_runtime::*` targets and
/// pipeline progress under `strand_cli::*`, so either side can be tuned alone:
///
/// ```bash
/// RUST_LOG=strand_runtime::engine=debug strand --input words.txt
/// ```
///
/// Everything is written to stderr; stdout carries DOT output only.
pub(super) fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(stderr_layer())
        .with(filter()?)
        .try_init()
        .map_err(|e| anyhow::anyhow!("subscriber already installed: {e}"))
}

fn filter() -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(DEFAULT_DIRECTIVES)
            .map_err(|e| anyhow::anyhow!("invalid log filter {DEFAULT_DIRECTIVES:?}: {e}")),
    }
}

/// Human-readable lines with target and level, no thread ids.
fn stderr_layer() -> impl Layer<Registry> {
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
}
