//! Background committer thread: wakes on a timed deadline or an early
//! batch-size signal, observes a `running` flag, and exits cleanly
//! (spec §5).

use crate::Index;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub struct Committer {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Committer {
    /// Spawn the background committer for `index`. Calls `commit()` every
    /// time `wait_for_commit_signal` returns, whether that's because the
    /// deadline elapsed or a batch crossed `LSM_BATCH_SIZE`.
    pub fn spawn(index: Arc<Index>, interval: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let running_for_thread = running.clone();

        let handle = std::thread::Builder::new()
            .name("qfind-committer".into())
            .spawn(move || {
                while running_for_thread.load(Ordering::SeqCst) {
                    index.queue.wait_for_commit_signal(interval);
                    if !running_for_thread.load(Ordering::SeqCst) {
                        break;
                    }
                    if index.queue_is_empty() {
                        continue;
                    }
                    if let Err(err) = index.commit() {
                        tracing::error!(error = %err, "background commit failed");
                    }
                }
            })
            .expect("spawn committer thread");

        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Committer {
    fn drop(&mut self) {
        self.stop();
    }
}
