//! Query resolver (spec §4.6): trigram decomposition, Bloom fail-fast,
//! parallel posting-list intersection, scoring, permission filter, top-K.

use crate::file_table::{may_read, FileId};
use crate::index::{Index, IndexInner};
use crate::trigram::Trigram;
use rayon::prelude::*;

/// Query context: everything the resolver needs for one `search` call.
#[derive(Debug, Clone)]
pub struct QueryCtx {
    pub query_string: String,
    pub case_sensitive: bool,
    pub regex_enabled: bool,
    pub uid: u32,
    pub gid: u32,
    pub max_results: usize,
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub path: String,
    pub score: f32,
}

pub fn search(index: &Index, ctx: &QueryCtx) -> crate::Result<Vec<SearchResult>> {
    if ctx.query_string.is_empty() {
        return Err(crate::Error::InvalidArgument("empty query".into()));
    }

    if ctx.regex_enabled {
        return search_regex(index, ctx);
    }

    let folded = fold(&ctx.query_string, ctx.case_sensitive);
    let trigrams = Trigram::extract(&folded);

    if trigrams.is_empty() {
        return search_trie(index, ctx, &folded);
    }

    search_trigram(index, ctx, &folded, &trigrams)
}

fn fold(s: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        s.to_string()
    } else {
        s.to_ascii_lowercase()
    }
}

fn search_trie(index: &Index, ctx: &QueryCtx, folded: &str) -> crate::Result<Vec<SearchResult>> {
    let inner = index.inner.read().unwrap();
    let ids = inner.trie.lookup(folded.as_bytes(), ctx.max_results * 4);

    let mut out = Vec::new();
    for id in ids {
        if out.len() >= ctx.max_results {
            break;
        }
        let Some(meta) = inner.file_table.get(id) else {
            continue;
        };
        if meta.is_tombstoned() || !may_read(meta, ctx.uid, ctx.gid) {
            continue;
        }
        let Some(path) = inner.file_table.path(id) else {
            continue;
        };
        out.push(SearchResult {
            path: path.to_string(),
            score: 1.0,
        });
    }
    Ok(out)
}

/// Resolve the set of candidate file ids matching every trigram in
/// `trigrams`: Bloom fail-fast, then parallel decode + progressive
/// intersection starting from the cheapest list.
fn resolve_trigram_candidates(
    index: &Index,
    trigrams: &[Trigram],
) -> crate::Result<Vec<FileId>> {
    let mut unique: Vec<Trigram> = trigrams.to_vec();
    unique.sort_unstable();
    unique.dedup();

    for t in &unique {
        if !index.bloom.check(&t.hash_key()) {
            return Ok(Vec::new());
        }
    }

    let inner = index.inner.read().unwrap();
    let worker_count = index.config().worker_threads.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count)
        .build()
        .map_err(|e| crate::Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    let mut lists: Vec<Vec<FileId>> = pool.install(|| {
        unique
            .par_iter()
            .filter_map(|t| match inner.postings.decode(*t) {
                Ok(list) => list,
                Err(err) => {
                    tracing::error!(error = %err, "posting list decode failed, skipping trigram");
                    None
                }
            })
            .collect()
    });

    lists.sort_by_key(|l| l.len());

    let mut candidates: Option<Vec<FileId>> = None;
    for list in lists {
        candidates = Some(match candidates {
            None => list,
            Some(acc) => intersect_sorted(&acc, &list),
        });
        if candidates.as_ref().is_some_and(|c| c.is_empty()) {
            break;
        }
    }

    Ok(candidates.unwrap_or_default())
}

fn intersect_sorted(a: &[FileId], b: &[FileId]) -> Vec<FileId> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn search_trigram(
    index: &Index,
    ctx: &QueryCtx,
    folded: &str,
    trigrams: &[Trigram],
) -> crate::Result<Vec<SearchResult>> {
    let candidates = resolve_trigram_candidates(index, trigrams)?;
    let inner = index.inner.read().unwrap();
    Ok(score_and_filter(
        &inner,
        ctx,
        &candidates,
        Scoring::Tfidf(folded),
        index.config().score_threshold,
    ))
}

enum Scoring<'a> {
    Tfidf(&'a str),
    Fixed(f32),
}

fn score_and_filter(
    inner: &IndexInner,
    ctx: &QueryCtx,
    candidates: &[FileId],
    scoring: Scoring,
    score_threshold: f32,
) -> Vec<SearchResult> {
    let n = (inner.num_files.max(1)) as f64;
    let query_trigrams = match scoring {
        Scoring::Tfidf(q) => Trigram::extract(q),
        Scoring::Fixed(_) => Vec::new(),
    };

    let mut out = Vec::new();
    for &id in candidates {
        let Some(meta) = inner.file_table.get(id) else {
            continue;
        };
        if meta.is_tombstoned() {
            continue;
        }
        if !may_read(meta, ctx.uid, ctx.gid) {
            continue;
        }
        let Some(path) = inner.file_table.path(id) else {
            continue;
        };

        let score = match scoring {
            Scoring::Fixed(s) => s,
            Scoring::Tfidf(_) => score_tfidf(path, &query_trigrams, n),
        };

        if score < score_threshold {
            continue;
        }

        out.push(SearchResult {
            path: path.to_string(),
            score,
        });
    }

    out.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out.truncate(ctx.max_results);
    out
}

/// `sum(tf * idf) / sqrt(len)` where, per trigram, `tf = freq / (len - 2)`
/// and `idf = log(N / (freq + 1))`, `freq` being that trigram's literal
/// occurrence count in `path` and `N` the corpus-wide file count (spec
/// §4.6, §9 open question: `N` is `num_files`, not a per-candidate id).
fn score_tfidf(path: &str, query_trigrams: &[Trigram], n: f64) -> f32 {
    let lower = path.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let len = bytes.len();
    if len <= 2 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    for t in query_trigrams {
        let freq = count_occurrences(bytes, *t) as f64;
        let tf = freq / (len as f64 - 2.0);
        let idf = (n / (freq + 1.0)).ln();
        sum += tf * idf;
    }

    (sum / (len as f64).sqrt()) as f32
}

fn count_occurrences(bytes: &[u8], t: Trigram) -> usize {
    if bytes.len() < 3 {
        return 0;
    }
    bytes
        .windows(3)
        .filter(|w| Trigram::from_bytes(w[0], w[1], w[2]) == t)
        .count()
}

/// Extract a required literal from a regex pattern's HIR, if one exists
/// (e.g. `foo.*bar` yields `foo` or `bar`, whichever is longer; `.*` yields
/// none).
fn extract_required_literal(pattern: &str) -> Option<String> {
    let hir = regex_syntax::Parser::new().parse(pattern).ok()?;
    let seq = regex_syntax::hir::literal::Extractor::new().extract(&hir);
    let literals = seq.literals()?;
    literals
        .iter()
        .filter_map(|lit| std::str::from_utf8(lit.as_bytes()).ok())
        .max_by_key(|s| s.len())
        .map(|s| s.to_string())
}

fn search_regex(index: &Index, ctx: &QueryCtx) -> crate::Result<Vec<SearchResult>> {
    let re = regex::RegexBuilder::new(&ctx.query_string)
        .case_insensitive(!ctx.case_sensitive)
        .build()
        .map_err(|e| crate::Error::InvalidArgument(e.to_string()))?;

    let literal = extract_required_literal(&ctx.query_string);

    let candidates: Vec<FileId> = match literal {
        Some(lit) if lit.len() >= 3 => {
            let folded = fold(&lit, ctx.case_sensitive);
            let trigrams = Trigram::extract(&folded);
            resolve_trigram_candidates(index, &trigrams)?
        }
        _ => {
            let inner = index.inner.read().unwrap();
            inner
                .file_table
                .iter()
                .filter(|(_, meta)| !meta.is_tombstoned())
                .map(|(id, _)| id)
                .collect()
        }
    };

    let inner = index.inner.read().unwrap();
    let mut out = Vec::new();
    for id in candidates {
        let Some(meta) = inner.file_table.get(id) else {
            continue;
        };
        if meta.is_tombstoned() || !may_read(meta, ctx.uid, ctx.gid) {
            continue;
        }
        let Some(path) = inner.file_table.path(id) else {
            continue;
        };
        if re.is_match(path) {
            out.push(SearchResult {
                path: path.to_string(),
                score: 1.0,
            });
        }
        if out.len() >= ctx.max_results {
            break;
        }
    }
    Ok(out)
}
