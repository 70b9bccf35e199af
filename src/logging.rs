//! Diagnostic logging for the binary.
//!
//! Library code logs through the `log` facade; records reach the subscriber
//! installed here through its `log` bridge. Test results and summaries are
//! printed by the terminal reporter and never go through this path.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the stderr subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`.
///
/// ```bash
/// RUST_LOG=rtest_session=debug rtest-session tests/
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
