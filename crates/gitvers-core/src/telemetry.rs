//! Tracing setup for the `gitvers` binary.
//!
//! Log lines go to stderr; stdout is reserved for command output, which
//! `--json` turns into machine-readable records.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events follow `--verbose`. Everything else (reqwest, hyper)
/// stays at `warn`.
const GITVERS_TARGETS: &[&str] = &["gitvers", "gitvers_core", "gitvers_hosting"];

/// Filter directives used when `RUST_LOG` is not set.
pub fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    let mut directives = vec!["warn".to_string()];
    directives.extend(GITVERS_TARGETS.iter().map(|t| format!("{t}={level}")));
    directives.join(",")
}

/// Initialise the global subscriber from the `--verbose` and `--json`
/// flags. `RUST_LOG` overrides the level mapping. Only the first call in a
/// process takes effect.
pub fn init_tracing(verbose: bool, json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init()
            .ok();
    }
}
