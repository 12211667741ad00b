//! The `Index` aggregate: file table, posting-list store, trie, Bloom pair,
//! and the reader/writer lock that guards the first three (spec §3, §5).

use crate::bloom::BloomPair;
use crate::file_table::{FileTable, ScanEntry};
use crate::posting::PostingListStore;
use crate::trie::PathTrie;
use crate::trigram::Trigram;
use crate::update_queue::{UpdateOp, UpdateQueue};
use qfind_core::config::EngineConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// `Empty -> Building -> Sealed -> Building' -> Sealed' -> ...` (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Empty,
    Building,
    Sealed,
}

pub(crate) struct IndexInner {
    pub(crate) state: IndexState,
    pub(crate) postings: PostingListStore,
    pub(crate) trie: PathTrie,
    pub(crate) file_table: FileTable,
    pub(crate) num_files: usize,
}

/// The engine aggregate. `inner` is the single reader/writer lock spec §5
/// mandates over the trigram/trie/file-table state; the Bloom filter lives
/// outside it (its own atomics prove safety per spec §5's exception), and
/// the `FileId` counter is a lock-free atomic.
pub struct Index {
    pub(crate) inner: RwLock<IndexInner>,
    pub(crate) bloom: BloomPair,
    next_id: AtomicU64,
    pub(crate) queue: UpdateQueue,
    pub(crate) config: EngineConfig,
}

impl Index {
    pub fn new(config: EngineConfig) -> Self {
        let bloom = BloomPair::new(
            config.bloom_primary_bits,
            config.bloom_secondary_bits,
            config.bloom_k_hashes,
        );
        Self {
            inner: RwLock::new(IndexInner {
                state: IndexState::Empty,
                postings: PostingListStore::new(),
                trie: PathTrie::new(),
                file_table: FileTable::new(),
                num_files: 0,
            }),
            bloom,
            next_id: AtomicU64::new(0),
            queue: UpdateQueue::new(config.lsm_batch_size),
            config,
        }
    }

    fn alloc_id(&self) -> crate::Result<crate::FileId> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if id == crate::FileId::INVALID.0 {
            return Err(crate::Error::OutOfMemory);
        }
        Ok(crate::FileId(id))
    }

    /// Synchronous add, used by the initial build and by `commit` when
    /// applying drained `Add` ops. Transitions `Empty -> Building`.
    pub fn add_file(
        &self,
        path: &str,
        mode: u32,
        uid: u32,
        gid: u32,
        mtime: i64,
    ) -> crate::Result<crate::FileId> {
        if path.is_empty() {
            return Err(crate::Error::InvalidArgument("empty path".into()));
        }
        let id = self.alloc_id()?;
        let mut inner = self.inner.write().unwrap();
        Self::insert_locked(&mut inner, &self.bloom, id, path, mode, uid, gid, mtime);
        if inner.state == IndexState::Empty {
            inner.state = IndexState::Building;
        }
        Ok(id)
    }

    #[allow(clippy::too_many_arguments)]
    fn insert_locked(
        inner: &mut IndexInner,
        bloom: &BloomPair,
        id: crate::FileId,
        path: &str,
        mode: u32,
        uid: u32,
        gid: u32,
        mtime: i64,
    ) {
        inner.file_table.insert(id, path, mode, uid, gid, mtime);
        inner.trie.insert_path(path.as_bytes(), id);

        let folded = path.to_ascii_lowercase();
        for trigram in Trigram::extract(&folded) {
            inner.postings.append(trigram, id);
            bloom.add(&trigram.hash_key());
        }
        inner.num_files += 1;
    }

    /// Build the index from a full directory scan, then commit.
    pub fn build<I: IntoIterator<Item = ScanEntry>>(&self, entries: I) -> crate::Result<usize> {
        let mut count = 0;
        for entry in entries {
            self.add_file(&entry.path, entry.mode, entry.uid, entry.gid, entry.mtime)?;
            count += 1;
        }
        self.commit()?;
        Ok(count)
    }

    /// Enqueue a filesystem `create`/`move-in` event. Transitions
    /// `Sealed -> Building'`.
    pub fn enqueue_add(
        &self,
        path: &str,
        mode: u32,
        uid: u32,
        gid: u32,
        mtime: i64,
    ) -> crate::Result<()> {
        if path.is_empty() {
            return Err(crate::Error::InvalidArgument("empty path".into()));
        }
        let id = self.alloc_id()?;
        self.queue.push_add(id, path.to_string(), mode, uid, gid, mtime);
        self.mark_dirty();
        Ok(())
    }

    /// Enqueue a filesystem `delete`/`move-out` event. Resolves the path's
    /// `FileId` via the path cache; `NotFound` if it was never indexed.
    pub fn enqueue_del(&self, path: &str) -> crate::Result<()> {
        let id = {
            let inner = self.inner.read().unwrap();
            inner
                .file_table
                .resolve_id(path)
                .ok_or_else(|| crate::Error::NotFound(path.to_string()))?
        };
        self.queue.push_del(id);
        self.mark_dirty();
        Ok(())
    }

    fn mark_dirty(&self) {
        let mut inner = self.inner.write().unwrap();
        if inner.state == IndexState::Sealed {
            inner.state = IndexState::Building;
        }
    }

    /// Drain pending adds/deletes, apply them, and rebuild the compressed
    /// blob. Transitions `Building* -> Sealed`.
    pub fn commit(&self) -> crate::Result<()> {
        let (adds, dels) = self.queue.drain();
        let mut inner = self.inner.write().unwrap();

        for op in adds {
            if let UpdateOp::Add {
                id,
                path,
                mode,
                uid,
                gid,
                mtime,
            } = op
            {
                Self::insert_locked(&mut inner, &self.bloom, id, &path, mode, uid, gid, mtime);
            }
        }
        for op in dels {
            if let UpdateOp::Del { id } = op {
                inner.file_table.tombstone(id);
            }
        }

        inner.postings.commit()?;
        inner.state = IndexState::Sealed;
        Ok(())
    }

    pub fn state(&self) -> IndexState {
        self.inner.read().unwrap().state
    }

    pub fn num_files(&self) -> usize {
        self.inner.read().unwrap().num_files
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EngineConfig {
        EngineConfig {
            bloom_primary_bits: 1 << 16,
            bloom_secondary_bits: 1 << 15,
            bloom_k_hashes: 8,
            lsm_batch_size: 5000,
            worker_threads: 2,
            results_per_thread: 512,
            score_threshold: 0.25,
            commit_interval_secs: 30,
        }
    }

    #[test]
    fn empty_index_starts_empty() {
        let index = Index::new(test_config());
        assert_eq!(index.state(), IndexState::Empty);
    }

    #[test]
    fn add_file_transitions_to_building_then_sealed_on_commit() {
        let index = Index::new(test_config());
        index.add_file("/a/notes.txt", 0o644, 0, 0, 0).unwrap();
        assert_eq!(index.state(), IndexState::Building);
        index.commit().unwrap();
        assert_eq!(index.state(), IndexState::Sealed);
        assert_eq!(index.num_files(), 1);
    }

    #[test]
    fn enqueue_del_requires_existing_path() {
        let index = Index::new(test_config());
        index.add_file("/a/notes.txt", 0o644, 0, 0, 0).unwrap();
        index.commit().unwrap();

        assert!(index.enqueue_del("/missing").is_err());
        assert!(index.enqueue_del("/a/notes.txt").is_ok());
        index.commit().unwrap();

        let inner = index.inner.read().unwrap();
        assert!(inner.file_table.is_tombstoned(crate::FileId(0)));
    }
}
