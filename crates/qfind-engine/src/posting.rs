//! Posting-list store: per-trigram file-id sets, delta + Golomb-Rice +
//! entropy coded at commit time into one contiguous blob (spec §4.4).

use crate::file_table::FileId;
use crate::gr;
use crate::trigram::Trigram;
use hashbrown::HashMap;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
struct TrigramDirectoryEntry {
    offset: usize,
    size: usize,
    file_count: usize,
    k: u32,
}

/// For each trigram, a growable ordered-by-insertion set of file ids during
/// build, and a compressed directory entry once committed.
pub struct PostingListStore {
    building: HashMap<Trigram, Vec<FileId>>,
    directory: HashMap<Trigram, TrigramDirectoryEntry>,
    blob: Vec<u8>,
}

impl PostingListStore {
    pub fn new() -> Self {
        Self {
            building: HashMap::new(),
            directory: HashMap::new(),
            blob: Vec::new(),
        }
    }

    /// Append `id` to the (unsorted, possibly-duplicated) building list for
    /// `trigram`. Growth is geometric via `Vec`'s own doubling.
    pub fn append(&mut self, trigram: Trigram, id: FileId) {
        self.building.entry(trigram).or_default().push(id);
    }

    /// Decode the committed posting list for `trigram`, if it has one.
    /// Returns `Err(Error::Corruption)` on a decode failure; callers should
    /// log and skip the trigram rather than fail the whole query (spec §7).
    pub fn decode(&self, trigram: Trigram) -> crate::Result<Option<Vec<FileId>>> {
        let Some(entry) = self.directory.get(&trigram) else {
            return Ok(None);
        };
        self.decode_entry(entry).map(Some)
    }

    fn decode_entry(&self, entry: &TrigramDirectoryEntry) -> crate::Result<Vec<FileId>> {
        let bytes = self
            .blob
            .get(entry.offset..entry.offset + entry.size)
            .ok_or_else(|| crate::Error::Corruption("posting blob range out of bounds".into()))?;

        let gr_bytes = zstd::stream::decode_all(bytes)
            .map_err(|e| crate::Error::Corruption(format!("zstd decode failed: {e}")))?;

        let deltas = gr::decode(&gr_bytes, entry.k, entry.file_count);

        let mut ids = Vec::with_capacity(deltas.len());
        let mut running = 0u64;
        for d in deltas {
            running += d;
            ids.push(FileId(running));
        }
        Ok(ids)
    }

    /// Rebuild the compressed blob for every dirty trigram (anything with
    /// pending `building` entries), carrying forward the compressed bytes
    /// of untouched trigrams unchanged. This is the "track dirty trigrams"
    /// variant spec §4.5 allows in place of recompressing everything.
    pub fn commit(&mut self) -> crate::Result<()> {
        let dirty: HashSet<Trigram> = self.building.keys().copied().collect();

        let mut new_blob = Vec::with_capacity(self.blob.len());
        let mut new_directory = HashMap::with_capacity(self.directory.len());

        for (trigram, entry) in self.directory.iter() {
            if dirty.contains(trigram) {
                continue;
            }
            let bytes = &self.blob[entry.offset..entry.offset + entry.size];
            let offset = new_blob.len();
            new_blob.extend_from_slice(bytes);
            new_directory.insert(
                *trigram,
                TrigramDirectoryEntry {
                    offset,
                    size: entry.size,
                    file_count: entry.file_count,
                    k: entry.k,
                },
            );
        }

        for trigram in dirty {
            let mut ids: Vec<FileId> = match self.directory.get(&trigram) {
                Some(entry) => self.decode_entry(entry)?,
                None => Vec::new(),
            };
            ids.extend(self.building.remove(&trigram).unwrap_or_default());
            ids.sort_unstable();
            ids.dedup();

            if ids.is_empty() {
                continue;
            }

            let deltas = deltas_from_sorted(&ids);
            let k = gr::choose_k(&deltas);
            let gr_bytes = gr::encode(&deltas, k);
            let compressed = zstd::stream::encode_all(&gr_bytes[..], 0)
                .map_err(|e| crate::Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

            let offset = new_blob.len();
            let size = compressed.len();
            new_blob.extend_from_slice(&compressed);
            new_directory.insert(
                trigram,
                TrigramDirectoryEntry {
                    offset,
                    size,
                    file_count: ids.len(),
                    k,
                },
            );
        }

        self.blob = new_blob;
        self.directory = new_directory;
        self.building.clear();
        Ok(())
    }

    pub fn trigram_count(&self) -> usize {
        self.directory.len()
    }

    pub fn blob_bytes(&self) -> usize {
        self.blob.len()
    }
}

impl Default for PostingListStore {
    fn default() -> Self {
        Self::new()
    }
}

fn deltas_from_sorted(ids: &[FileId]) -> Vec<u64> {
    let mut deltas = Vec::with_capacity(ids.len());
    let mut prev = 0u64;
    for id in ids {
        deltas.push(id.0 - prev);
        prev = id.0;
    }
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_then_commit_round_trips() {
        let mut store = PostingListStore::new();
        let t = Trigram::from_bytes(b'a', b'b', b'c');

        store.append(t, FileId(5));
        store.append(t, FileId(1));
        store.append(t, FileId(5)); // duplicate, dropped at commit
        store.append(t, FileId(3));

        store.commit().unwrap();

        let decoded = store.decode(t).unwrap().unwrap();
        assert_eq!(decoded, vec![FileId(1), FileId(3), FileId(5)]);
    }

    #[test]
    fn incremental_commit_merges_with_existing_list() {
        let mut store = PostingListStore::new();
        let t = Trigram::from_bytes(b'x', b'y', b'z');

        store.append(t, FileId(10));
        store.commit().unwrap();

        store.append(t, FileId(20));
        store.commit().unwrap();

        let decoded = store.decode(t).unwrap().unwrap();
        assert_eq!(decoded, vec![FileId(10), FileId(20)]);
    }

    #[test]
    fn unvisited_trigram_decodes_to_none() {
        let store = PostingListStore::new();
        let t = Trigram::from_bytes(b'q', b'q', b'q');
        assert!(store.decode(t).unwrap().is_none());
    }

    #[test]
    fn large_posting_list_round_trips_through_compression() {
        let mut store = PostingListStore::new();
        let t = Trigram::from_bytes(b'b', b'i', b'g');

        let ids: Vec<FileId> = (0..5000u64).map(|i| FileId(i * 3 + 1)).collect();
        for id in &ids {
            store.append(t, *id);
        }
        store.commit().unwrap();

        assert_eq!(store.decode(t).unwrap().unwrap(), ids);
    }

    #[test]
    fn untouched_lists_survive_unrelated_commits() {
        let mut store = PostingListStore::new();
        let a = Trigram::from_bytes(b'a', b'a', b'a');
        let b = Trigram::from_bytes(b'b', b'b', b'b');

        store.append(a, FileId(1));
        store.append(b, FileId(2));
        store.commit().unwrap();

        store.append(b, FileId(3));
        store.commit().unwrap();

        assert_eq!(store.decode(a).unwrap().unwrap(), vec![FileId(1)]);
        assert_eq!(
            store.decode(b).unwrap().unwrap(),
            vec![FileId(2), FileId(3)]
        );
    }
}
