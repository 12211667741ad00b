//! End-to-end scenarios from the engine's design document: build + search,
//! the short-query trie path, tombstoning, and concurrent query-during-add.

use qfind_core::config::EngineConfig;
use qfind_engine::{query, Index, QueryCtx};
use std::sync::Arc;

fn test_config() -> EngineConfig {
    EngineConfig {
        bloom_primary_bits: 1 << 18,
        bloom_secondary_bits: 1 << 17,
        bloom_k_hashes: 8,
        lsm_batch_size: 5000,
        worker_threads: 4,
        results_per_thread: 512,
        score_threshold: 0.25,
        commit_interval_secs: 30,
    }
}

fn ctx(query: &str) -> QueryCtx {
    QueryCtx {
        query_string: query.to_string(),
        case_sensitive: false,
        regex_enabled: false,
        uid: 0,
        gid: 0,
        max_results: 10,
    }
}

#[test]
fn build_and_search() {
    let index = Index::new(test_config());
    index.add_file("/a/notes.txt", 0o644, 0, 0, 0).unwrap();
    index.add_file("/b/notes.md", 0o644, 0, 0, 0).unwrap();
    index.add_file("/c/other.log", 0o644, 0, 0, 0).unwrap();
    index.commit().unwrap();

    let results = query::search(&index, &ctx("notes")).unwrap();
    let mut paths: Vec<&str> = results.iter().map(|r| r.path.as_str()).collect();
    paths.sort();
    assert_eq!(paths, vec!["/a/notes.txt", "/b/notes.md"]);

    assert!(query::search(&index, &ctx("xyz")).unwrap().is_empty());
}

#[test]
fn short_query_path() {
    let index = Index::new(test_config());
    index.add_file("/ab", 0o644, 0, 0, 0).unwrap();
    index.add_file("/abc", 0o644, 0, 0, 0).unwrap();
    index.add_file("/abd", 0o644, 0, 0, 0).unwrap();
    index.commit().unwrap();

    assert_eq!(query::search(&index, &ctx("ab")).unwrap().len(), 3);
    assert!(query::search(&index, &ctx("ac")).unwrap().is_empty());
}

#[test]
fn tombstone_after_delete() {
    let index = Index::new(test_config());
    index.add_file("/a/notes.txt", 0o644, 0, 0, 0).unwrap();
    index.add_file("/b/notes.md", 0o644, 0, 0, 0).unwrap();
    index.add_file("/c/other.log", 0o644, 0, 0, 0).unwrap();
    index.commit().unwrap();

    index.enqueue_del("/b/notes.md").unwrap();
    index.commit().unwrap();

    let results = query::search(&index, &ctx("notes")).unwrap();
    let paths: Vec<&str> = results.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["/a/notes.txt"]);
}

#[test]
fn golomb_rice_round_trip_varied_sizes() {
    use qfind_engine::gr;

    for &len in &[1usize, 2, 100, 10_000] {
        let mut deltas = Vec::with_capacity(len);
        let mut seed = 0x2545F4914F6CDD1Du64;
        for _ in 0..len {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            deltas.push(seed % 50);
        }
        let k = gr::choose_k(&deltas);
        let encoded = gr::encode(&deltas, k);
        let decoded = gr::decode(&encoded, k, deltas.len());
        assert_eq!(decoded, deltas, "round trip failed for len={len}");
    }
}

#[test]
fn concurrent_query_during_add_never_sees_torn_state() {
    let index = Arc::new(Index::new(test_config()));
    for i in 0..200u64 {
        index
            .add_file(&format!("/corpus/file_{i}.log"), 0o644, 0, 0, 0)
            .unwrap();
    }
    index.commit().unwrap();

    let writer_index = index.clone();
    let writer = std::thread::spawn(move || {
        for i in 200..1200u64 {
            writer_index
                .add_file(&format!("/corpus/file_{i}.log"), 0o644, 0, 0, 0)
                .unwrap();
        }
        writer_index.commit().unwrap();
    });

    let mut readers = Vec::new();
    for _ in 0..8 {
        let reader_index = index.clone();
        readers.push(std::thread::spawn(move || {
            for _ in 0..20 {
                let results = query::search(&reader_index, &ctx("log")).unwrap();
                for r in &results {
                    assert!(r.path.starts_with("/corpus/file_"));
                }
            }
        }));
    }

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
    assert!(index.num_files() >= 1200);
}
