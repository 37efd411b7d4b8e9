//! ContextStore - searchable index of saved planning context
//!
//! Stores rendered plan documents (and any other text) together with a small
//! string metadata map, and answers `search(query, k)` with the best-matching
//! documents. Ranking is plain term overlap; there is no embedding model.
//!
//! # Architecture
//!
//! ```text
//! data/context/
//! ├── index.jsonl      # one StoredDocument per line, append-only
//! └── index.lock       # fs2 lock guarding every read and write of the index
//! ```
//!
//! # Example
//!
//! ```ignore
//! use contextstore::{ContextStore, Metadata};
//!
//! let store = ContextStore::open("data/context")?;
//! let mut meta = Metadata::new();
//! meta.insert("type".into(), "plan".into());
//! store.store(&plan_markdown, meta)?;
//! let hits = store.search("authentication", 5)?;
//! ```

mod store;

pub use store::{ContextStore, DocId, Metadata, SearchHit, StoredDocument};

/// Default number of results returned by a search
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Name of the index file inside the store directory
pub const INDEX_FILE: &str = "index.jsonl";

/// Sidecar file locked around every index access
pub const LOCK_FILE: &str = "index.lock";
