use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `verbosity` is the number of `-v` flags: 0 = info, 1 = debug, 2+ = trace.
/// `RUST_LOG`, when set, wins over the flag. Output goes to stderr so the report on
/// stdout stays clean.
pub fn setup_tracing(verbosity: u8) -> Result<()> {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hv_scan={default_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("setting default subscriber failed: {e}"))
}
