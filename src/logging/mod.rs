//! Logging
//!
//! Two channels are kept apart:
//!
//! - **Narration** ([`CascadingLogger`]): what the bot tells its operator. Buffered
//!   per scope and only printed once something important happens in that scope.
//! - **Diagnostics** (`tracing`): developer output, filtered by `RUST_LOG` or
//!   `--verbose`, written to stderr.

pub mod cascade;
pub mod sink;

pub use cascade::CascadingLogger;
pub use sink::{LogSink, MemorySink, StdoutSink};

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects DEBUG over INFO.
pub fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")
}
