//! Turns files on disk into un-embedded store documents.
//!
//! Each file is one source (`sourceType = "file"`). A file named directly
//! is identified by its file name; files found by walking a directory are
//! identified by their path relative to that directory.

use crate::chunker::chunk_text;
use chrono::Utc;
use neuron_core::{AppError, AppResult};
use neuron_store::Document;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Source type recorded on every document produced by the loader.
pub const FILE_SOURCE_TYPE: &str = "file";

/// How many leading bytes are inspected for NUL when sniffing binaries.
const BINARY_SNIFF_BYTES: usize = 8192;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Code,
    PlainText,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("rs") | Some("py") | Some("js") | Some("ts") | Some("go") | Some("c")
            | Some("cpp") | Some("java") | Some("sh") | Some("yaml") | Some("yml")
            | Some("json") | Some("toml") | Some("php") => Self::Code,
            Some("txt") => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Code => "code",
            Self::PlainText => "text",
            Self::Unknown => "unknown",
        }
    }
}

/// Documents produced from one load, in source order.
#[derive(Debug, Default)]
pub struct LoadedBatch {
    pub documents: Vec<Document>,
    /// Number of files that were read
    pub sources: usize,
    /// Sources that produced no chunks (empty or whitespace-only files)
    pub empty_sources: Vec<String>,
    /// Bytes of text read
    pub bytes: u64,
    /// Canonical paths already loaded
    seen: HashSet<PathBuf>,
}

/// Reads, cleans, and chunks text files.
#[derive(Debug, Clone)]
pub struct FileDataLoader {
    chunk_size: usize,
    chunk_overlap: usize,
    tags: Vec<(String, String)>,
}

impl FileDataLoader {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            tags: Vec::new(),
        }
    }

    /// Metadata entries copied onto every produced document.
    pub fn with_tags(mut self, tags: Vec<(String, String)>) -> Self {
        self.tags = tags;
        self
    }

    /// Load every readable text file under `paths`.
    ///
    /// Paths that do not exist are an error. Binary and non-UTF-8 files are
    /// skipped with a warning; hidden entries inside walked directories are
    /// ignored. Directory entries are visited in file-name order. A file
    /// reachable through more than one of `paths` is loaded once, under the
    /// name it was first reached by.
    pub fn load(&self, paths: &[PathBuf]) -> AppResult<LoadedBatch> {
        let mut batch = LoadedBatch::default();

        for path in paths {
            if path.is_file() {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.to_string_lossy().into_owned());
                self.load_file(path, name, &mut batch)?;
            } else if path.is_dir() {
                self.load_dir(path, &mut batch)?;
            } else {
                return Err(AppError::Knowledge(format!(
                    "Path does not exist: {:?}",
                    path
                )));
            }
        }

        tracing::debug!(
            "Loaded {} documents from {} sources ({} bytes)",
            batch.documents.len(),
            batch.sources,
            batch.bytes
        );

        Ok(batch)
    }

    fn load_dir(&self, root: &Path, batch: &mut LoadedBatch) -> AppResult<()> {
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {:?}: {}", root, e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            self.load_file(entry.path(), name, batch)?;
        }

        Ok(())
    }

    fn load_file(&self, path: &Path, name: String, batch: &mut LoadedBatch) -> AppResult<()> {
        let canonical = fs::canonicalize(path)
            .map_err(|e| AppError::Knowledge(format!("Failed to resolve {:?}: {}", path, e)))?;
        if !batch.seen.insert(canonical) {
            tracing::debug!("Skipping {:?}, already loaded in this batch", path);
            return Ok(());
        }

        let Some(text) = read_text(path)? else {
            return Ok(());
        };

        let content_type = ContentType::from_path(path);
        let text = match content_type {
            ContentType::Markdown => clean_markdown(&text),
            _ => text,
        };

        batch.sources += 1;
        batch.bytes += text.len() as u64;

        let chunks = chunk_text(&text, self.chunk_size, self.chunk_overlap);
        if chunks.is_empty() {
            tracing::debug!("No content in {:?}", path);
            batch.empty_sources.push(name);
            return Ok(());
        }

        let uploaded_at = Utc::now().to_rfc3339();
        let path_str = path.to_string_lossy().into_owned();
        let count = chunks.len();

        for chunk in chunks {
            let mut document = Document::new(uuid::Uuid::new_v4().to_string(), chunk.text)
                .with_source(FILE_SOURCE_TYPE, name.clone());
            document.add_metadata("path", path_str.clone());
            document.add_metadata("chunk", chunk.position);
            document.add_metadata("content_type", content_type.as_str());
            document.add_metadata("uploaded_at", uploaded_at.clone());
            for (key, value) in &self.tags {
                document.add_metadata(key.clone(), value.clone());
            }
            batch.documents.push(document);
        }

        tracing::debug!("Loaded {:?} as '{}': {} chunks", path, name, count);
        Ok(())
    }
}

/// Parse a `key=value` tag. The key must be non-empty; the value may be.
pub fn parse_tag(raw: &str) -> AppResult<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(AppError::Knowledge(format!(
            "Invalid tag '{}': expected key=value",
            raw
        ))),
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Read a file as UTF-8 text, or `None` if it looks binary.
fn read_text(path: &Path) -> AppResult<Option<String>> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;

    let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_BYTES)];
    if sniff.contains(&0) {
        tracing::warn!("Skipping likely binary file: {:?}", path);
        return Ok(None);
    }

    match String::from_utf8(bytes) {
        Ok(text) => Ok(Some(text)),
        Err(_) => {
            tracing::warn!("Skipping non UTF-8 file: {:?}", path);
            Ok(None)
        }
    }
}

/// Strip heading markers, rules, and code fences from markdown.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}
