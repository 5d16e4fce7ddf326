//! Log output setup.
//!
//! Development runs get pretty, multi-line events with source locations.
//! Production runs emit one JSON object per event for log shippers.
//! `RUST_LOG` overrides the default filter in both modes.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Environment;

const DEVELOPMENT_FILTER: &str = "debug,ivs_api=debug,tower_http=debug,sqlx=warn,hyper=info";
const PRODUCTION_FILTER: &str = "info,tower_http=info,sqlx=warn";

fn default_filter(env: &Environment) -> &'static str {
    if env.is_production() {
        PRODUCTION_FILTER
    } else {
        DEVELOPMENT_FILTER
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_tracing(env: &Environment) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(env)));

    let fmt_layer = if env.is_production() {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .flatten_event(true)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();

    tracing::info!(mode = ?env, "Tracing initialized");
}
