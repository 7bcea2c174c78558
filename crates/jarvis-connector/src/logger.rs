//! Console logging using env_logger
//!
//! The level comes from `RUST_LOG` and defaults to `info`. The connector runs
//! as a long-lived service, so everything goes to stderr where the container
//! runtime collects it.

use env_logger::{Builder, Env};

/// Initialize logging; calling it twice is harmless
pub fn init() {
    let env = Env::default().default_filter_or("info");

    let result = Builder::from_env(env)
        .format_timestamp_millis()
        .format_target(false)
        .try_init();

    if result.is_ok() {
        log::debug!("Logger initialized");
    }
}
