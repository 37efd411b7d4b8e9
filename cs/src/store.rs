//! Core ContextStore implementation

use eyre::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Unique identifier for a stored document
pub type DocId = String;

/// Free-form string metadata attached to a document (e.g. `type`, `path`)
pub type Metadata = BTreeMap<String, String>;

/// One line of the index file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Unique document ID
    pub doc_id: DocId,
    /// Full document text
    pub text: String,
    /// Caller-supplied metadata
    #[serde(default)]
    pub metadata: Metadata,
    /// Creation timestamp (unix ms)
    pub created_at: i64,
}

/// A ranked search result
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Document that matched
    pub doc_id: DocId,
    /// Full document text
    pub text: String,
    /// Metadata stored with the document
    pub metadata: Metadata,
    /// Fraction of query terms found in the document (0.0, 1.0]
    pub score: f32,
}

/// The main context store
pub struct ContextStore {
    /// Base path for storage
    base_path: PathBuf,
}

impl ContextStore {
    /// Open or create a context store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;
        debug!(?base_path, "Opened context store");
        Ok(Self { base_path })
    }

    fn index_path(&self) -> PathBuf {
        self.base_path.join(crate::INDEX_FILE)
    }

    /// Lock the sidecar lock file; the index itself is replaced on delete,
    /// so it cannot carry the lock
    fn lock(&self, exclusive: bool) -> Result<fs::File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.base_path.join(crate::LOCK_FILE))
            .context("Failed to open lock file")?;
        if exclusive {
            file.lock_exclusive().context("Failed to lock index")?;
        } else {
            file.lock_shared().context("Failed to lock index")?;
        }
        Ok(file)
    }

    /// Store a document and return its ID
    pub fn store(&self, text: &str, metadata: Metadata) -> Result<DocId> {
        let doc = StoredDocument {
            doc_id: Uuid::now_v7().to_string(),
            text: text.to_string(),
            metadata,
            created_at: chrono::Utc::now().timestamp_millis(),
        };

        let line = serde_json::to_string(&doc)?;
        let lock = self.lock(true)?;
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.index_path())
            .and_then(|mut file| writeln!(file, "{}", line));
        FileExt::unlock(&lock)?;
        written.context("Failed to append to index file")?;

        info!(doc_id = %doc.doc_id, bytes = text.len(), "Stored document");
        Ok(doc.doc_id)
    }

    /// Read every document in insertion order
    pub fn documents(&self) -> Result<Vec<StoredDocument>> {
        let lock = self.lock(false)?;
        let docs = self.read_index();
        FileExt::unlock(&lock)?;
        docs
    }

    /// Caller must hold the index lock
    fn read_index(&self) -> Result<Vec<StoredDocument>> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&path).context("Failed to open index file")?;
        let mut docs = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let doc: StoredDocument = serde_json::from_str(&line).context("Corrupt index line")?;
            docs.push(doc);
        }
        Ok(docs)
    }

    /// Search for the `k` documents sharing the most terms with `query`
    ///
    /// Documents with no matching term are excluded. Equal scores keep
    /// insertion order.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let query_terms: Vec<String> = {
            let mut seen = HashSet::new();
            tokenize(query).filter(|t| seen.insert(t.clone())).collect()
        };
        debug!(?query_terms, k, "search: called");

        if query_terms.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit> = self
            .documents()?
            .into_iter()
            .filter_map(|doc| {
                let doc_terms: HashSet<String> = tokenize(&doc.text).collect();
                let matched = query_terms.iter().filter(|t| doc_terms.contains(*t)).count();
                if matched == 0 {
                    return None;
                }
                Some(SearchHit {
                    doc_id: doc.doc_id,
                    text: doc.text,
                    metadata: doc.metadata,
                    score: matched as f32 / query_terms.len() as f32,
                })
            })
            .collect();

        // sort_by is stable, so ties stay in insertion order
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);

        debug!(hit_count = hits.len(), "search: done");
        Ok(hits)
    }

    /// Get a single document by ID
    pub fn get(&self, doc_id: &str) -> Result<StoredDocument> {
        self.documents()?
            .into_iter()
            .find(|d| d.doc_id == doc_id)
            .ok_or_else(|| eyre::eyre!("Document not found: {}", doc_id))
    }

    /// Number of stored documents
    pub fn len(&self) -> Result<usize> {
        Ok(self.documents()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Delete a document; returns false if it was not present
    pub fn delete(&self, doc_id: &str) -> Result<bool> {
        // One exclusive section from read to rename, shared with store()
        let lock = self.lock(true)?;
        let deleted = self.rewrite_without(doc_id);
        FileExt::unlock(&lock)?;

        let deleted = deleted?;
        if deleted {
            info!(doc_id, "Deleted document");
        }
        Ok(deleted)
    }

    /// Caller must hold the exclusive index lock
    fn rewrite_without(&self, doc_id: &str) -> Result<bool> {
        let docs = self.read_index()?;
        let before = docs.len();
        let kept: Vec<StoredDocument> = docs.into_iter().filter(|d| d.doc_id != doc_id).collect();
        if kept.len() == before {
            return Ok(false);
        }

        let tmp_path = self.base_path.join(format!("{}.tmp", crate::INDEX_FILE));
        {
            let mut tmp = fs::File::create(&tmp_path).context("Failed to create temp index")?;
            for doc in &kept {
                writeln!(tmp, "{}", serde_json::to_string(doc)?)?;
            }
            tmp.sync_all().context("Failed to flush temp index")?;
        }
        fs::rename(&tmp_path, self.index_path()).context("Failed to replace index file")?;
        Ok(true)
    }
}

/// Lowercased alphanumeric terms of at least two characters
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
}
