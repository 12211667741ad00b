//! qfind-walker: parallel-free filesystem walker producing `ScanEntry`
//! values for the engine's initial build (spec §6).

use qfind_core::Config;
use qfind_engine::ScanEntry;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Walker for the initial directory scan. Holds nothing but the config;
/// it has no index of its own, it only yields `ScanEntry` values for the
/// caller to feed into `Index::build`.
pub struct Walker {
    config: Config,
}

impl Walker {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Walk all configured roots and collect every entry that should be
    /// indexed. Unreadable entries are skipped with a warning, not fatal.
    pub fn scan(&self) -> Vec<ScanEntry> {
        info!("Starting filesystem scan");
        let mut entries = Vec::new();
        for root in &self.config.index_roots {
            info!("Scanning root: {}", root.display());
            self.scan_root(root, &mut entries);
        }
        info!("Scan complete: {} entries found", entries.len());
        entries
    }

    fn scan_root(&self, root: &Path, entries: &mut Vec<ScanEntry>) {
        let walked: Vec<_> = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| self.should_index(e.path()))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() || e.file_type().is_dir())
            .collect();

        debug!("Found {} entries in {}", walked.len(), root.display());

        for entry in walked {
            if let Some(scanned) = self.scan_entry(entry.path()) {
                entries.push(scanned);
            }
        }
    }

    fn should_index(&self, path: &Path) -> bool {
        qfind_core::filter::should_index_path(path, &self.config.exclusions)
    }

    fn scan_entry(&self, path: &Path) -> Option<ScanEntry> {
        let metadata = match std::fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) => {
                warn!("Failed to read metadata for {}: {}", path.display(), e);
                return None;
            }
        };

        let name = path.file_name()?;
        if name.is_empty() {
            return None;
        }

        Some(ScanEntry {
            path: path.to_string_lossy().into_owned(),
            mode: metadata.mode(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            mtime: metadata.mtime(),
        })
    }
}
