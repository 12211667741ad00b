//! qfind-watcher: notify-based file watcher that feeds events straight
//! into the engine's LSM update queue (spec §6).

use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};
use qfind_engine::Index;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Filesystem watcher. Owns nothing but the notify handle and channel; it
/// applies every event straight to the `Index` it's given rather than
/// handing events off to a daemon.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<Event>>,
    index: Arc<Index>,
}

impl FileWatcher {
    /// Create a new file watcher for the given paths, applying updates
    /// directly to `index`.
    pub fn new<P: AsRef<Path>>(paths: &[P], index: Arc<Index>) -> qfind_core::Result<Self> {
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(tx, NotifyConfig::default())
            .map_err(|e| qfind_core::Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

        for path in paths {
            info!("Watching path: {}", path.as_ref().display());
            watcher
                .watch(path.as_ref(), RecursiveMode::Recursive)
                .map_err(|e| {
                    qfind_core::Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
                })?;
        }

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            index,
        })
    }

    /// Drain every pending notify event and apply it to the index
    /// (non-blocking).
    pub fn poll_updates(&self) {
        while let Ok(Ok(event)) = self.receiver.try_recv() {
            debug!("File event: {:?}", event);
            Self::apply_event(&self.index, event);
        }
    }

    fn apply_event(index: &Index, event: Event) {
        use notify::event::{ModifyKind, RenameMode};
        use notify::EventKind;

        match event.kind {
            EventKind::Create(_) => {
                for path in &event.paths {
                    Self::upsert(index, path);
                }
            }
            EventKind::Modify(ModifyKind::Name(rename_mode)) => match rename_mode {
                RenameMode::From => {
                    for path in &event.paths {
                        Self::remove(index, path);
                    }
                }
                RenameMode::To => {
                    for path in &event.paths {
                        Self::upsert(index, path);
                    }
                }
                RenameMode::Both | RenameMode::Any | RenameMode::Other => {
                    let mut paths = event.paths;
                    if paths.len() == 2 {
                        let second = paths.pop().unwrap();
                        let first = paths.pop().unwrap();

                        let (from, to) = match (first.exists(), second.exists()) {
                            (false, true) => (first, second),
                            (true, false) => (second, first),
                            _ => (first, second),
                        };

                        Self::remove(index, &from);
                        Self::upsert(index, &to);
                    } else {
                        // Some backends emit a rename without both endpoints; best-effort
                        // upsert whatever paths we have.
                        for path in &paths {
                            Self::upsert(index, path);
                        }
                    }
                }
            },
            EventKind::Modify(_) => {
                for path in &event.paths {
                    Self::upsert(index, path);
                }
            }
            EventKind::Remove(_) => {
                for path in &event.paths {
                    Self::remove(index, path);
                }
            }
            _ => {}
        }
    }

    fn upsert(index: &Index, path: &Path) {
        let metadata = match std::fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) => {
                warn!("Failed to stat {} for watcher upsert: {}", path.display(), e);
                return;
            }
        };
        let path_str = path.to_string_lossy();
        if let Err(e) = index.enqueue_add(
            &path_str,
            metadata.mode(),
            metadata.uid(),
            metadata.gid(),
            metadata.mtime(),
        ) {
            warn!("Failed to enqueue add for {}: {}", path.display(), e);
        }
    }

    fn remove(index: &Index, path: &Path) {
        let path_str = path.to_string_lossy();
        if let Err(e) = index.enqueue_del(&path_str) {
            debug!("Failed to enqueue delete for {}: {}", path.display(), e);
        }
    }
}
