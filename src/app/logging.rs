// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub fn setup_logging(log_level: &str, json_format: bool) {
    // A bare level (e.g. "debug") gets the noisy transport crates pinned to
    // info. Directive strings (containing ',' or '=') and RUST_LOG pass
    // through as-is.
    let normalized = log_level.trim();
    let filter_spec = if let Ok(env_directives) = std::env::var("RUST_LOG")
        && !env_directives.trim().is_empty()
    {
        env_directives
    } else if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!(
            "{normalized},h2=info,hyper=info,hyper_util=info,reqwest=info,tokio_tungstenite=info,alloy_transport_http=info"
        )
    };

    let filter = EnvFilter::from_str(&filter_spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_target(false)
            .with_current_span(false);
        registry.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer().with_target(true).compact();
        registry.with(fmt_layer).init();
    }

    let base = filter_spec
        .split(',')
        .map(str::trim)
        .find(|part| !part.is_empty())
        .unwrap_or("info");
    tracing::info!(
        base,
        format = if json_format { "json" } else { "compact" },
        "Logging initialized"
    );
}
