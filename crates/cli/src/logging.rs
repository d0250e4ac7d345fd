//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable with per-target log levels, e.g.
/// `DIOPH_LOG=dioph_core=debug`.
pub(crate) const LOG_ENV: &str = "DIOPH_LOG";

/// Install the stderr subscriber. Idempotent.
///
/// Falls back to `info` for this workspace's crates (`warn` with
/// `--quiet`) when `DIOPH_LOG` is unset or invalid.
pub(crate) fn init_tracing(quiet: bool) {
    INIT.call_once(|| {
        let default_level = if quiet { "warn" } else { "info" };
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "dioph={level},dioph_core={level}",
                level = default_level
            ))
        });

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .init();
    });
}
