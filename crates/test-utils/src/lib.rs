pub mod builders;
pub mod fake_backend;

use std::sync::Once;
use std::time::Duration;

use qahub::engine::StatusResolver;
use qahub::types::RunId;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Output is captured by the harness and only shown for failing tests.
/// `RUST_LOG` overrides the default of `qahub=debug,warn`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("qahub=debug,warn"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Poll the resolver until run `id` reaches a terminal status.
pub async fn wait_for_terminal(resolver: &StatusResolver, id: RunId) {
    with_timeout(async {
        loop {
            let view = resolver.status(id).expect("run should be resolvable");
            if view.status().is_terminal() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
}
