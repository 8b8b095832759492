use mockall::automock;
use tracing::info;

/// Fire-and-forget route navigation. No result is consumed by callers.
#[automock]
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, path: &str);
}

/// Navigator for the demo binary: routes only exist in the log.
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate_to(&self, path: &str) {
        info!(%path, "navigating");
    }
}
