//! Shared startup code of the `accrual` and `mart` binaries

use std::env;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
///
/// `RUST_LOG` wins; otherwise the loyalty crates log at `LOG_LEVEL`
/// (default `info`).
pub fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "accrual={lvl},mart={lvl},loyalty_backend={lvl},loyalty_api={lvl},\
             loyalty_services={lvl},loyalty_db={lvl},loyalty_auth={lvl},\
             actix_web=info,sqlx=warn",
            lvl = log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}
