//! Stderr diagnostics for recipe runs.
//!
//! A run writes its listing, banners and transcript reports into the sink
//! handed to `Runner::run` / `Module::run_main`; recipes print to stdout on
//! their own. The `debug!`/`warn!` events emitted while selecting, calling
//! and checking transcripts land on stderr instead, so they never mix with
//! what a transcript compares.

use std::io;

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber; `RUST_LOG=cookbook=debug` shows each
/// selection and call, unset means `warn` (transcript failures only).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // a second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init();
        tracing::debug!("still alive");
    }
}
