//! qfind-engine: the indexing and query engine (trigram extractor, Bloom
//! pair, path trie, posting-list store, index aggregate, LSM update queue,
//! background committer, query resolver).

pub mod bloom;
pub mod committer;
pub mod file_table;
pub mod gr;
mod index;
pub mod posting;
pub mod query;
mod string_arena;
pub mod trie;
pub mod trigram;
pub mod update_queue;

pub use file_table::{may_read, FileId, FileMeta, ScanEntry};
pub use index::{Index, IndexState};
pub use qfind_core::{Error, Result};
pub use query::{search, QueryCtx, SearchResult};
pub use trigram::Trigram;
