use tokio::task::JoinHandle;

/// Owns the background tasks spawned for a view.
///
/// Dropping the handle aborts every task, so a torn-down view stops
/// reacting to notifications it subscribed to while alive.
#[derive(Default)]
pub struct Subscription {
    handles: Vec<JoinHandle<()>>,
}

impl Subscription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    /// Stop every task. Idempotent.
    pub fn unsubscribe(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
