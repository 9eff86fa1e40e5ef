//! File-backed vector store.
//!
//! Records live one per line in a single file. Appends go straight to the
//! end of the file; deletions rewrite it through a temporary file and an
//! atomic rename. Searches scan the whole file every time.

use crate::codec;
use crate::config::StoreConfig;
use crate::document::{Document, SourceKey};
use crate::lines::{self, read_lines};
use crate::similarity::{cosine_distance, similarity_from_distance};
use crate::topk::TopK;
use neuron_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Trait for vector store backends.
///
/// Mutations take `&mut self`: a store handle is single-writer, and
/// callers sharing one across threads must serialize access themselves.
pub trait VectorStore {
    /// Append documents to the store.
    fn add(&mut self, documents: &[Document]) -> AppResult<()>;

    /// Remove every document of one source. Returns how many were removed.
    fn delete_by_source(&mut self, source_type: &str, source_name: &str) -> AppResult<usize>;

    /// Replace the stored documents of every source present in `documents`
    /// with exactly those documents. Returns how many old documents were removed.
    fn reindex_by_source(&mut self, documents: &[Document]) -> AppResult<usize>;

    /// Return the nearest documents to the query, most similar first,
    /// with `score` populated.
    fn similarity_search(&self, query_embedding: &[f32]) -> AppResult<Vec<Document>>;
}

/// Per-source record count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    #[serde(flatten)]
    pub source: SourceKey,
    pub documents: usize,
}

/// Store-wide statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub path: PathBuf,
    pub documents: usize,
    pub sources: usize,
    pub invalid_lines: usize,
    pub size_bytes: u64,
}

/// Counters from one compaction pass.
#[derive(Debug, Default, Clone, Copy)]
struct CompactionCounts {
    kept: usize,
    removed: usize,
    dropped: usize,
}

/// Vector store persisted as newline-delimited JSON.
#[derive(Debug, Clone)]
pub struct FileVectorStore {
    config: StoreConfig,
}

impl FileVectorStore {
    pub fn new(config: StoreConfig) -> Self {
        tracing::debug!("Opening vector store at {:?}", config.file_path());
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn file_path(&self) -> PathBuf {
        self.config.file_path()
    }

    /// Nearest `k` documents to the query, ignoring the configured `top_k`.
    ///
    /// Fails if a stored record has no embedding or its length differs from
    /// the query's; undecodable lines are skipped.
    pub fn similarity_search_k(&self, query_embedding: &[f32], k: usize) -> AppResult<Vec<Document>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let path = self.file_path();
        let mut candidates = TopK::new(k);
        let mut scanned = 0usize;
        let mut skipped = 0usize;

        for line in read_lines(&path) {
            let line = line?;
            let document = match codec::decode(&line) {
                Some(document) => document,
                None => {
                    skipped += 1;
                    continue;
                }
            };
            scanned += 1;

            if !document.has_embedding() {
                return Err(AppError::MissingEmbedding {
                    id: document.id,
                    content: document.content,
                });
            }

            let distance = cosine_distance(query_embedding, &document.embedding).map_err(|m| {
                AppError::DimensionMismatch {
                    id: document.id.clone(),
                    expected: m.left,
                    actual: m.right,
                }
            })?;

            candidates.push(distance, document);
        }

        tracing::debug!(
            "Scanned {} documents in {:?} ({} invalid lines skipped), returning {} of top-{}",
            scanned,
            path,
            skipped,
            candidates.len(),
            k
        );

        Ok(candidates
            .into_sorted_vec()
            .into_iter()
            .map(|(distance, mut document)| {
                document.score = Some(similarity_from_distance(distance));
                document
            })
            .collect())
    }

    /// Every decodable document, in file order.
    pub fn documents(&self) -> AppResult<Vec<Document>> {
        let mut documents = Vec::new();
        for line in read_lines(&self.file_path()) {
            if let Some(document) = codec::decode(&line?) {
                documents.push(document);
            }
        }
        Ok(documents)
    }

    /// Distinct sources with their document counts, in first-seen order.
    pub fn sources(&self) -> AppResult<Vec<SourceSummary>> {
        let mut order: Vec<SourceKey> = Vec::new();
        let mut counts: HashMap<SourceKey, usize> = HashMap::new();

        for line in read_lines(&self.file_path()) {
            let Some(document) = codec::decode(&line?) else {
                continue;
            };
            let key = document.source();
            match counts.get_mut(&key) {
                Some(count) => *count += 1,
                None => {
                    counts.insert(key.clone(), 1);
                    order.push(key);
                }
            }
        }

        Ok(order
            .into_iter()
            .map(|source| {
                let documents = counts.get(&source).copied().unwrap_or(0);
                SourceSummary { source, documents }
            })
            .collect())
    }

    pub fn stats(&self) -> AppResult<StoreStats> {
        let path = self.file_path();
        let mut documents = 0usize;
        let mut invalid_lines = 0usize;
        let mut sources: HashSet<SourceKey> = HashSet::new();

        for line in read_lines(&path) {
            match codec::decode(&line?) {
                Some(document) => {
                    documents += 1;
                    sources.insert(document.source());
                }
                None => invalid_lines += 1,
            }
        }

        let size_bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

        Ok(StoreStats {
            path,
            documents,
            sources: sources.len(),
            invalid_lines,
            size_bytes,
        })
    }

    /// Atomically empty the store. A store that was never written stays absent.
    pub fn clear(&mut self) -> AppResult<()> {
        let path = self.file_path();
        if !path.exists() {
            return Ok(());
        }

        lines::atomic_replace(&path, &self.config.tmp_path(), std::iter::empty())?;
        tracing::info!("Cleared vector store {:?}", path);
        Ok(())
    }

    /// Rewrite the file keeping records for which `keep` holds, then
    /// `appended` lines at the end, in one atomic replace.
    ///
    /// Lines that fail to decode are dropped from the rewritten file.
    fn compact<F>(&mut self, keep: F, appended: Vec<String>) -> AppResult<CompactionCounts>
    where
        F: Fn(&Document) -> bool,
    {
        let path = self.file_path();
        let mut stats = CompactionCounts::default();

        let retained = read_lines(&path).filter_map(|line| {
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            match codec::decode(&line) {
                None => {
                    stats.dropped += 1;
                    None
                }
                Some(document) if keep(&document) => {
                    stats.kept += 1;
                    Some(Ok(line))
                }
                Some(_) => {
                    stats.removed += 1;
                    None
                }
            }
        });

        lines::atomic_replace(&path, &self.config.tmp_path(), retained.chain(appended.into_iter().map(Ok)))?;

        if stats.dropped > 0 {
            tracing::warn!(
                "Dropped {} undecodable lines while compacting {:?}",
                stats.dropped,
                path
            );
        }

        tracing::debug!(
            "Compacted {:?}: kept {}, removed {}",
            path,
            stats.kept,
            stats.removed
        );

        Ok(stats)
    }
}

fn encode_all(documents: &[Document]) -> AppResult<Vec<String>> {
    documents.iter().map(codec::encode).collect()
}

impl VectorStore for FileVectorStore {
    fn add(&mut self, documents: &[Document]) -> AppResult<()> {
        // Encode everything before touching the file
        let lines = encode_all(documents)?;
        lines::append_lines(&self.file_path(), &lines)?;

        tracing::debug!("Added {} documents to {:?}", documents.len(), self.file_path());
        Ok(())
    }

    fn delete_by_source(&mut self, source_type: &str, source_name: &str) -> AppResult<usize> {
        if !self.file_path().exists() {
            return Ok(0);
        }

        let stats = self.compact(
            |document| document.source_type != source_type || document.source_name != source_name,
            Vec::new(),
        )?;

        tracing::info!(
            "Deleted {} documents for source {}:{}",
            stats.removed,
            source_type,
            source_name
        );
        Ok(stats.removed)
    }

    /// Runs as a single compaction: stale records of every touched source
    /// are dropped and the new documents appended in the same atomic
    /// replace, so an interruption leaves either the old or the new state.
    fn reindex_by_source(&mut self, documents: &[Document]) -> AppResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        // Group by source in first-seen order, matching a per-source
        // delete-then-append sequence
        let mut order: Vec<(&str, &str)> = Vec::new();
        let mut groups: HashMap<(&str, &str), Vec<&Document>> = HashMap::new();
        for document in documents {
            let key = (document.source_type.as_str(), document.source_name.as_str());
            groups
                .entry(key)
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(document);
        }

        let mut appended = Vec::with_capacity(documents.len());
        for key in &order {
            for document in &groups[key] {
                appended.push(codec::encode(document)?);
            }
        }

        if !self.file_path().exists() {
            lines::append_lines(&self.file_path(), &appended)?;
            tracing::info!(
                "Indexed {} documents across {} sources",
                documents.len(),
                order.len()
            );
            return Ok(0);
        }

        let touched: HashSet<(&str, &str)> = order.iter().copied().collect();
        let stats = self.compact(
            |document| {
                !touched.contains(&(document.source_type.as_str(), document.source_name.as_str()))
            },
            appended,
        )?;

        tracing::info!(
            "Reindexed {} sources: removed {}, added {}",
            order.len(),
            stats.removed,
            documents.len()
        );
        Ok(stats.removed)
    }

    fn similarity_search(&self, query_embedding: &[f32]) -> AppResult<Vec<Document>> {
        self.similarity_search_k(query_embedding, self.config.top_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn doc(id: &str, source: &str, embedding: Vec<f32>) -> Document {
        Document::new(id, format!("content {}", id))
            .with_source("file", source)
            .with_embedding(embedding)
    }

    fn store(temp: &TempDir) -> FileVectorStore {
        FileVectorStore::new(StoreConfig::new(temp.path()))
    }

    fn ids(documents: &[Document]) -> Vec<&str> {
        documents.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_add_appends_one_line_per_document() {
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);

        store
            .add(&[doc("1", "a", vec![1.0, 0.0]), doc("2", "a", vec![0.0, 1.0])])
            .unwrap();
        store.add(&[doc("3", "b", vec![1.0, 1.0])]).unwrap();

        let raw = fs::read_to_string(store.file_path()).unwrap();
        assert_eq!(raw.lines().count(), 3);
        assert!(raw.ends_with('\n'));
        assert_eq!(ids(&store.documents().unwrap()), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_add_encode_failure_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);

        let result = store.add(&[
            doc("1", "a", vec![1.0, 0.0]),
            doc("2", "a", vec![f32::INFINITY, 0.0]),
        ]);

        assert!(result.is_err());
        assert!(!store.file_path().exists());
    }

    #[test]
    fn test_search_missing_embedding_fails() {
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);
        store
            .add(&[
                doc("1", "a", vec![1.0, 0.0]),
                Document::new("2", "never embedded").with_source("file", "a"),
            ])
            .unwrap();

        match store.similarity_search(&[1.0, 0.0]) {
            Err(AppError::MissingEmbedding { id, content }) => {
                assert_eq!(id, "2");
                assert_eq!(content, "never embedded");
            }
            other => panic!("expected MissingEmbedding, got {:?}", other),
        }
    }

    #[test]
    fn test_search_dimension_mismatch_fails() {
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);
        store.add(&[doc("1", "a", vec![1.0, 0.0, 0.0])]).unwrap();

        let result = store.similarity_search(&[1.0, 0.0]);
        assert!(matches!(
            result,
            Err(AppError::DimensionMismatch {
                expected: 2,
                actual: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_search_skips_corrupt_lines() {
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);
        store.add(&[doc("1", "a", vec![1.0, 0.0])]).unwrap();
        let mut raw = fs::read_to_string(store.file_path()).unwrap();
        raw.push_str("{\"id\":\"2\",\"cont\n\nnot json\n");
        fs::write(store.file_path(), raw).unwrap();

        let results = store.similarity_search(&[1.0, 0.0]).unwrap();
        assert_eq!(ids(&results), vec!["1"]);
    }

    #[test]
    fn test_search_k_zero() {
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);
        store.add(&[doc("1", "a", vec![1.0, 0.0])]).unwrap();
        assert!(store.similarity_search_k(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_delete_on_missing_file_is_noop() {
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);
        assert_eq!(store.delete_by_source("file", "a").unwrap(), 0);
        assert!(!store.file_path().exists());
    }

    #[test]
    fn test_delete_drops_corrupt_lines() {
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);
        store
            .add(&[doc("1", "a", vec![1.0, 0.0]), doc("2", "b", vec![0.0, 1.0])])
            .unwrap();
        let mut raw = fs::read_to_string(store.file_path()).unwrap();
        raw.push_str("garbage\n");
        fs::write(store.file_path(), raw).unwrap();

        let removed = store.delete_by_source("file", "a").unwrap();

        assert_eq!(removed, 1);
        let raw = fs::read_to_string(store.file_path()).unwrap();
        assert_eq!(raw.lines().count(), 1);
        assert!(!raw.contains("garbage"));
        assert!(!store.config().tmp_path().exists());
    }

    #[test]
    fn test_delete_requires_both_source_fields() {
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);
        store
            .add(&[
                doc("1", "a", vec![1.0, 0.0]),
                Document::new("2", "remote")
                    .with_source("url", "a")
                    .with_embedding(vec![0.0, 1.0]),
            ])
            .unwrap();

        assert_eq!(store.delete_by_source("file", "a").unwrap(), 1);
        assert_eq!(ids(&store.documents().unwrap()), vec!["2"]);
    }

    #[test]
    fn test_reindex_orders_new_documents_by_source() {
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);
        store
            .add(&[
                doc("a1", "a", vec![1.0, 0.0]),
                doc("c1", "c", vec![1.0, 1.0]),
                doc("b1", "b", vec![0.0, 1.0]),
            ])
            .unwrap();

        let removed = store
            .reindex_by_source(&[
                doc("b2", "b", vec![0.0, 1.0]),
                doc("a2", "a", vec![1.0, 0.0]),
                doc("b3", "b", vec![0.5, 0.5]),
            ])
            .unwrap();

        assert_eq!(removed, 2);
        assert_eq!(
            ids(&store.documents().unwrap()),
            vec!["c1", "b2", "b3", "a2"]
        );
        assert!(!store.config().tmp_path().exists());
    }

    #[test]
    fn test_reindex_into_empty_store() {
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);

        let removed = store.reindex_by_source(&[doc("1", "a", vec![1.0])]).unwrap();

        assert_eq!(removed, 0);
        assert_eq!(ids(&store.documents().unwrap()), vec!["1"]);
    }

    #[test]
    fn test_reindex_empty_batch_is_noop() {
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);
        store.add(&[doc("1", "a", vec![1.0])]).unwrap();

        assert_eq!(store.reindex_by_source(&[]).unwrap(), 0);
        assert_eq!(ids(&store.documents().unwrap()), vec!["1"]);
    }

    #[test]
    fn test_sources_and_stats() {
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);
        store
            .add(&[
                doc("1", "b", vec![1.0, 0.0]),
                doc("2", "a", vec![0.0, 1.0]),
                doc("3", "b", vec![1.0, 1.0]),
            ])
            .unwrap();

        let sources = store.sources().unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].source, SourceKey::new("file", "b"));
        assert_eq!(sources[0].documents, 2);
        assert_eq!(sources[1].source, SourceKey::new("file", "a"));
        assert_eq!(sources[1].documents, 1);

        let stats = store.stats().unwrap();
        assert_eq!(stats.documents, 3);
        assert_eq!(stats.sources, 2);
        assert_eq!(stats.invalid_lines, 0);
        assert!(stats.size_bytes > 0);
    }

    #[test]
    fn test_clear() {
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);
        store.add(&[doc("1", "a", vec![1.0])]).unwrap();

        store.clear().unwrap();

        assert!(store.documents().unwrap().is_empty());
        assert_eq!(fs::read_to_string(store.file_path()).unwrap(), "");
    }
}
