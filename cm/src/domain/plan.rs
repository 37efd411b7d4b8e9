//! Plan domain type
//!
//! A Plan is an overview plus an ordered list of work packages. Display ids
//! (`WP001`, `WP001-A`) are derived from position and never stored, so any
//! reorder relabels everything consistently.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Title given to a work package added without one
pub const DEFAULT_WORK_PACKAGE_TITLE: &str = "New Work Package";

/// Text given to a task added without one
pub const DEFAULT_TASK_TEXT: &str = "New task";

/// Seed task of a freshly added work package
pub const FIRST_TASK_TEXT: &str = "Task 1";

/// Errors from editing a plan in place
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanEditError {
    #[error("Work package {index} out of range (plan has {len})")]
    WorkPackageOutOfRange { index: usize, len: usize },

    #[error("Task {index} out of range in {wp_id} (has {len})")]
    TaskOutOfRange { wp_id: String, index: usize, len: usize },
}

/// One chunk of work: a title and its tasks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPackage {
    pub title: String,
    #[serde(default)]
    pub tasks: Vec<String>,
}

impl WorkPackage {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: single_line(title.into()),
            tasks: Vec::new(),
        }
    }

    pub fn with_tasks<I, S>(title: impl Into<String>, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: single_line(title.into()),
            tasks: tasks.into_iter().map(|t| single_line(t.into())).collect(),
        }
    }
}

/// A structured development plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub work_packages: Vec<WorkPackage>,
}

impl Plan {
    pub fn new(overview: impl Into<String>, work_packages: Vec<WorkPackage>) -> Self {
        Self {
            overview: normalize_overview(&overview.into()),
            work_packages,
        }
    }

    pub fn task_count(&self) -> usize {
        self.work_packages.iter().map(|wp| wp.tasks.len()).sum()
    }

    /// Append a work package seeded with one task; returns its index
    pub fn add_work_package(&mut self, title: Option<&str>) -> usize {
        let title = title.map(str::trim).filter(|t| !t.is_empty()).unwrap_or(DEFAULT_WORK_PACKAGE_TITLE);
        debug!(%title, "add_work_package: called");
        self.work_packages.push(WorkPackage::with_tasks(title, [FIRST_TASK_TEXT]));
        self.work_packages.len() - 1
    }

    pub fn remove_work_package(&mut self, index: usize) -> Result<WorkPackage, PlanEditError> {
        debug!(%index, "remove_work_package: called");
        self.check_wp(index)?;
        Ok(self.work_packages.remove(index))
    }

    pub fn rename_work_package(&mut self, index: usize, title: impl Into<String>) -> Result<(), PlanEditError> {
        debug!(%index, "rename_work_package: called");
        self.check_wp(index)?;
        self.work_packages[index].title = single_line(title.into());
        Ok(())
    }

    /// Move a work package so it ends up at `to`
    pub fn move_work_package(&mut self, from: usize, to: usize) -> Result<(), PlanEditError> {
        debug!(%from, %to, "move_work_package: called");
        self.check_wp(from)?;
        self.check_wp(to)?;
        let wp = self.work_packages.remove(from);
        self.work_packages.insert(to, wp);
        Ok(())
    }

    /// Append a task to a work package; returns the task index
    pub fn add_task(&mut self, wp: usize, text: Option<&str>) -> Result<usize, PlanEditError> {
        debug!(%wp, "add_task: called");
        self.check_wp(wp)?;
        let text = text.map(str::trim).filter(|t| !t.is_empty()).unwrap_or(DEFAULT_TASK_TEXT);
        let tasks = &mut self.work_packages[wp].tasks;
        tasks.push(single_line(text.to_string()));
        Ok(tasks.len() - 1)
    }

    pub fn remove_task(&mut self, wp: usize, task: usize) -> Result<String, PlanEditError> {
        debug!(%wp, %task, "remove_task: called");
        self.check_task(wp, task)?;
        Ok(self.work_packages[wp].tasks.remove(task))
    }

    pub fn edit_task(&mut self, wp: usize, task: usize, text: impl Into<String>) -> Result<(), PlanEditError> {
        debug!(%wp, %task, "edit_task: called");
        self.check_task(wp, task)?;
        self.work_packages[wp].tasks[task] = single_line(text.into());
        Ok(())
    }

    pub fn move_task(&mut self, wp: usize, from: usize, to: usize) -> Result<(), PlanEditError> {
        debug!(%wp, %from, %to, "move_task: called");
        self.check_task(wp, from)?;
        self.check_task(wp, to)?;
        let tasks = &mut self.work_packages[wp].tasks;
        let task = tasks.remove(from);
        tasks.insert(to, task);
        Ok(())
    }

    fn check_wp(&self, index: usize) -> Result<(), PlanEditError> {
        if index < self.work_packages.len() {
            Ok(())
        } else {
            Err(PlanEditError::WorkPackageOutOfRange {
                index,
                len: self.work_packages.len(),
            })
        }
    }

    fn check_task(&self, wp: usize, index: usize) -> Result<(), PlanEditError> {
        self.check_wp(wp)?;
        let len = self.work_packages[wp].tasks.len();
        if index < len {
            Ok(())
        } else {
            Err(PlanEditError::TaskOutOfRange {
                wp_id: wp_id(wp),
                index,
                len,
            })
        }
    }
}

/// Titles and tasks render as one markdown line each, so line breaks become spaces
fn single_line(text: String) -> String {
    if !text.contains(['\r', '\n']) {
        return text;
    }
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// Trimmed, `\n` line endings, and no line that would read as the work
/// packages heading
fn normalize_overview(text: &str) -> String {
    let heading = crate::planning::WORK_PACKAGES_HEADING;
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim()
        .lines()
        .map(|line| {
            if line.trim_end() == heading {
                format!("#{}", line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Display id for the work package at `index` (zero-based): `WP001`, `WP002`, ...
pub fn wp_id(index: usize) -> String {
    format!("WP{:03}", index + 1)
}

/// Letter suffix for the task at `index`: `A`..`Z`, then `AA`, `AB`, ...
pub fn task_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Display id for a task: `WP001-A`
pub fn task_id(wp_index: usize, task_index: usize) -> String {
    format!("{}-{}", wp_id(wp_index), task_letter(task_index))
}
