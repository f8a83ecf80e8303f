//! Tracing subscriber installation.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Filter directives read before `RUST_LOG`.
pub const LOG_VAR: &str = "BISC_LOG";
/// When set, events are rendered as an indented span tree.
pub const LOG_TREE_VAR: &str = "BISC_LOG_TREE";

/// Install the global subscriber. Does nothing unless `BISC_LOG` or
/// `RUST_LOG` is set; safe to call more than once.
///
/// `BISC_LOG=bis_types=debug` shows one event per pass, `trace` adds one
/// per lowered function.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = match std::env::var(LOG_VAR) {
            Ok(directives) => EnvFilter::new(directives),
            Err(_) if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
            Err(_) => return,
        };
        let registry = tracing_subscriber::registry().with(filter);
        // Another subscriber may already be installed by the host.
        let _ = if std::env::var(LOG_TREE_VAR).is_ok() {
            registry
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .try_init()
        } else {
            registry
                .with(fmt::layer().with_target(true).with_level(true))
                .try_init()
        };
    });
}
