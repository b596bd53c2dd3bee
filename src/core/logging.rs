//! Logging initialization

/// Initialize env_logger for binaries and benches.
///
/// Default filter level is `info`; override with RUST_LOG. The library itself
/// only talks to the `log` facade and never calls this.
///
/// # Example
/// ```no_run
/// arbor::core::logging::init();
/// log::info!("Generating tree");
/// ```
pub fn init() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();
}

/// Like [`init`] but safe to call more than once (tests, benches).
pub fn try_init() {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn")
    ).is_test(true).try_init();
}
