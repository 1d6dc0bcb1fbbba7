pub mod builders;
pub mod project;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use assetpipe::logging::LOG_ENV;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Output goes through `with_test_writer()`, so the harness only shows it
/// for failing tests (or with `-- --nocapture`). The filter is read from
/// `ASSETPIPE_LOG`, then `RUST_LOG`; by default only this crate logs, at
/// `info`:
///
/// `ASSETPIPE_LOG=assetpipe::watch=debug cargo test --test watch_session`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn,assetpipe=info"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Default deadline for [`with_timeout`]. Generous because image and Sass
/// steps run unoptimised in debug test builds.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Await `f`, panicking if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    with_deadline(TEST_TIMEOUT, f).await
}

pub async fn with_deadline<F, T>(deadline: Duration, f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(deadline, f)
        .await
        .unwrap_or_else(|_| panic!("test future did not finish within {deadline:?}"))
}
