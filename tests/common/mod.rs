//! Helpers shared by the integration tests.

/// Routes the kernel's log output through the test harness.
///
/// Defaults to WARN everywhere; override with `RUST_LOG`
/// (e.g. `RUST_LOG=geolis_subd=debug cargo test`). Safe to call from every
/// test; only the first call installs the subscriber.
pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}
