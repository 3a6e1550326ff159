use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use crate::env::get_env_bool;

// Used when RUST_LOG is not set.
const DEFAULT_FILTER: &str = "info";

pub fn init(log_json: bool, log_perf: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    let builder = if log_perf {
        builder.with_span_events(FmtSpan::CLOSE)
    } else {
        builder
    };

    if log_json {
        builder.json().init();
    } else {
        builder.init();
    };
}

pub fn init_with_env() {
    init(
        get_env_bool("LOG_JSON").unwrap_or(false),
        get_env_bool("LOG_PERF").unwrap_or(false),
    );
}
