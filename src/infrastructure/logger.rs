//! Logging
//!
//! `RUST_LOG` wins when set; otherwise `default_filter` applies.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter for the binary
pub const DEFAULT_FILTER: &str = "info,beanstack=info";

/// Initialize the global subscriber
pub fn init(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}
