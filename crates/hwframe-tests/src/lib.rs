//! Integration test crate for hwframe.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on every hwframe crate to verify they work together.


#[cfg(test)]
mod teardown;

#[cfg(test)]
mod negotiation;

/// Route `tracing` output to the test harness. Filter with `RUST_LOG`.
#[cfg(test)]
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
