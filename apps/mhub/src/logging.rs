//! Tracing subscriber setup
//!
//! Logs always go to stderr. Stdout carries command results only, since CI
//! pipes the reconciler's selection straight into the build matrix.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,mhub=info";
const DEBUG_FILTER: &str = "info,mhub=debug";

/// Filter directives used when `RUST_LOG` is not set
pub fn default_directives(debug: bool) -> &'static str {
    if debug {
        DEBUG_FILTER
    } else {
        DEFAULT_FILTER
    }
}

/// Install the global subscriber; `RUST_LOG` wins over `--debug`
pub fn init_tracing(json_mode: bool, debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(debug)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json_mode {
        builder.json().init();
    } else {
        builder.with_target(debug).init();
    }
}
