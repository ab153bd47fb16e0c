//! Tracing subscriber setup.

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the filter passed to [`init`].
pub const LOG_ENV: &str = "CADSCENE_LOG";

/// Install a fmt subscriber filtered by `filter` (e.g. `"info"`,
/// `"cadscene=debug"`). Returns `false` if a global subscriber was already
/// set, which makes repeated calls harmless.
pub fn init(filter: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .is_ok()
}
