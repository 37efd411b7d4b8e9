//! Plan documents on disk
//!
//! Each generated plan is written once to `plan-{YYYYMMDD-HHMMSS}.md` in the
//! plans directory. Names are claimed with `create_new`, so two plans saved
//! in the same second get `-2`, `-3`, ... instead of overwriting each other.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use eyre::{Context, Result};
use thiserror::Error;
use tracing::{debug, info};

use super::markdown::{parse_markdown_plan, render_plan};
use crate::domain::Plan;

const MAX_SUFFIX: u32 = 1000;

/// A plan document could not be written
#[derive(Debug, Error)]
#[error("Failed to write plan to {}: {source}", path.display())]
pub struct PlanWriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Directory of saved plan documents
#[derive(Debug, Clone)]
pub struct PlanStore {
    dir: PathBuf,
}

impl PlanStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save a plan under a fresh timestamped name
    pub fn save(&self, plan: &Plan) -> Result<PathBuf, PlanWriteError> {
        self.save_document_at(&render_plan(plan), Local::now())
    }

    /// Save an already rendered document as if written at `now`
    pub fn save_document_at(&self, document: &str, now: DateTime<Local>) -> Result<PathBuf, PlanWriteError> {
        debug!(dir = %self.dir.display(), "save_document_at: called");
        fs::create_dir_all(&self.dir).map_err(|source| PlanWriteError {
            path: self.dir.clone(),
            source,
        })?;

        let stamp = now.format("%Y%m%d-%H%M%S").to_string();
        for n in 1..=MAX_SUFFIX {
            let name = if n == 1 {
                format!("plan-{}.md", stamp)
            } else {
                format!("plan-{}-{}.md", stamp, n)
            };
            let path = self.dir.join(name);

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "save_document_at: name taken, trying next suffix");
                    continue;
                }
                Err(source) => return Err(PlanWriteError { path, source }),
            };

            file.write_all(document.as_bytes())
                .map_err(|source| PlanWriteError { path: path.clone(), source })?;
            info!(path = %path.display(), "Saved plan");
            return Ok(path);
        }

        Err(PlanWriteError {
            path: self.dir.join(format!("plan-{}.md", stamp)),
            source: io::Error::new(io::ErrorKind::AlreadyExists, "no free plan file name"),
        })
    }

    /// Replace an existing document after edits
    pub fn overwrite(&self, path: &Path, plan: &Plan) -> Result<(), PlanWriteError> {
        debug!(path = %path.display(), "overwrite: called");
        fs::write(path, render_plan(plan)).map_err(|source| PlanWriteError {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Updated plan");
        Ok(())
    }

    /// Saved plan documents, newest first
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        debug!(dir = %self.dir.display(), "list: called");
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let pattern = self.dir.join("plan-*.md");
        let pattern = pattern.to_string_lossy();
        let mut paths: Vec<PathBuf> = glob::glob(&pattern)
            .context("Invalid plan glob pattern")?
            .filter_map(|entry| entry.ok())
            .filter(|p| p.is_file())
            .collect();

        paths.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
        debug!(count = paths.len(), "list: found plans");
        Ok(paths)
    }

    /// Read and parse a saved document
    pub fn load(&self, path: &Path) -> Result<Plan> {
        debug!(path = %path.display(), "load: called");
        let document =
            fs::read_to_string(path).with_context(|| format!("Failed to read plan {}", path.display()))?;
        Ok(parse_markdown_plan(&document))
    }
}

/// (timestamp, suffix) so `-2` sorts after its unsuffixed sibling
fn sort_key(path: &Path) -> (String, u32) {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.strip_prefix("plan-"))
        .unwrap_or_default();

    match stem.get(..15).zip(stem.get(15..)) {
        Some((stamp, "")) => (stamp.to_string(), 1),
        Some((stamp, rest)) => match rest.strip_prefix('-').and_then(|n| n.parse().ok()) {
            Some(n) => (stamp.to_string(), n),
            None => (stem.to_string(), 0),
        },
        None => (stem.to_string(), 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WorkPackage;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 1, h, m, s).single().unwrap()
    }

    fn sample() -> Plan {
        Plan::new("Overview", vec![WorkPackage::with_tasks("Setup", ["Init repo"])])
    }

    #[test]
    fn test_save_creates_dir_and_timestamped_file() {
        let temp = TempDir::new().unwrap();
        let store = PlanStore::new(temp.path().join("nested/plans"));

        let path = store.save_document_at(&render_plan(&sample()), at(12, 0, 0)).unwrap();

        assert_eq!(path.file_name().unwrap(), "plan-20240101-120000.md");
        assert_eq!(store.load(&path).unwrap(), sample());
    }

    #[test]
    fn test_same_second_gets_suffix() {
        let temp = TempDir::new().unwrap();
        let store = PlanStore::new(temp.path());

        let first = store.save_document_at("first", at(12, 0, 0)).unwrap();
        let second = store.save_document_at("second", at(12, 0, 0)).unwrap();
        let third = store.save_document_at("third", at(12, 0, 0)).unwrap();

        assert_eq!(second.file_name().unwrap(), "plan-20240101-120000-2.md");
        assert_eq!(third.file_name().unwrap(), "plan-20240101-120000-3.md");
        assert_eq!(fs::read_to_string(first).unwrap(), "first");
    }

    #[test]
    fn test_list_newest_first() {
        let temp = TempDir::new().unwrap();
        let store = PlanStore::new(temp.path());

        let older = store.save_document_at("a", at(9, 0, 0)).unwrap();
        let newer = store.save_document_at("b", at(10, 0, 0)).unwrap();
        let newest = store.save_document_at("c", at(10, 0, 0)).unwrap();
        fs::write(temp.path().join("notes.md"), "not a plan").unwrap();

        assert_eq!(store.list().unwrap(), vec![newest, newer, older]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = PlanStore::new(temp.path().join("absent"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_overwrite_rerenders() {
        let temp = TempDir::new().unwrap();
        let store = PlanStore::new(temp.path());
        let path = store.save(&sample()).unwrap();

        let mut plan = sample();
        plan.add_task(0, Some("Add CI")).unwrap();
        store.overwrite(&path, &plan).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("- [ ] WP001-B: Add CI"));
    }

    #[test]
    fn test_save_into_file_path_fails() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let store = PlanStore::new(&blocker);
        let err = store.save(&sample()).unwrap_err();
        assert_eq!(err.path, blocker);
    }
}
