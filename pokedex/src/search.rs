use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Debounces search input: a query is published once no newer query has
/// been submitted for the quiet period.
pub struct SearchRelay {
    input: watch::Sender<String>,
    settled: watch::Receiver<String>,
    task: JoinHandle<()>,
}

impl SearchRelay {
    /// Must be called from within a tokio runtime
    pub fn new(quiet_period: Duration) -> Self {
        let (input, mut pending) = watch::channel(String::new());
        let (publish, settled) = watch::channel(String::new());

        let task = tokio::spawn(async move {
            'outer: while pending.changed().await.is_ok() {
                loop {
                    tokio::select! {
                        changed = pending.changed() => {
                            if changed.is_err() {
                                break 'outer;
                            }
                            // newer input restarts the quiet period
                        }
                        _ = tokio::time::sleep(quiet_period) => {
                            let query = pending.borrow_and_update().clone();
                            log::debug!("Search settled on {:?}", query);
                            publish.send_replace(query);
                            break;
                        }
                    }
                }
            }
        });

        Self {
            input,
            settled,
            task,
        }
    }

    /// Record the latest raw query
    pub fn submit(&self, query: impl Into<String>) {
        self.input.send_replace(query.into());
    }

    /// Last settled query
    pub fn current(&self) -> String {
        self.settled.borrow().clone()
    }

    /// Receiver that only observes settled queries
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.settled.clone()
    }
}

impl Drop for SearchRelay {
    fn drop(&mut self) {
        self.task.abort();
    }
}
