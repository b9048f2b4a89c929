//! Shared helpers for filemill's integration tests.
//!
//! - [`builders`]: scratch project trees on disk.
//! - [`fake_engine`]: a recording [`filemill::exec::TransformEngine`].
//! - [`recorder`]: a plugin that records every hook call.

pub mod builders;
pub mod fake_engine;
pub mod recorder;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

/// Upper bound for any single wait in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Long enough for the OS watcher to deliver pending notifications and for
/// the default settle window to pass.
pub const SETTLE_DELAY: Duration = Duration::from_millis(200);

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Output is captured per test and only shown when a test fails. `RUST_LOG`
/// overrides the default filter, e.g. `RUST_LOG=filemill=trace`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,filemill=debug"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Await `fut`, panicking after [`TEST_TIMEOUT`].
pub async fn with_timeout<F: Future>(fut: F) -> F::Output {
    match tokio::time::timeout(TEST_TIMEOUT, fut).await {
        Ok(output) => output,
        Err(_) => panic!("test step did not finish within {TEST_TIMEOUT:?}"),
    }
}

/// Sleep for [`SETTLE_DELAY`].
pub async fn settle() {
    tokio::time::sleep(SETTLE_DELAY).await;
}
