//! Indexing plan documents into the context store

use contextstore::{ContextStore, DocId, Metadata};
use eyre::{Context, Result};
use tracing::{debug, info};

use crate::planning::GeneratedPlan;

/// Metadata `type` value for plan documents
pub const PLAN_DOC_TYPE: &str = "plan";

/// Metadata recorded alongside an indexed plan
pub fn plan_metadata(generated: &GeneratedPlan) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("type".to_string(), PLAN_DOC_TYPE.to_string());
    if let Some(path) = &generated.path {
        metadata.insert("path".to_string(), path.display().to_string());
    }
    metadata
}

/// Index a plan document, replacing an earlier entry for the same plan
pub fn index_plan(store: &ContextStore, generated: &GeneratedPlan, previous: Option<&str>) -> Result<DocId> {
    debug!(path = ?generated.path, ?previous, "index_plan: called");
    if let Some(doc_id) = previous {
        store.delete(doc_id).context("Failed to drop previous plan index entry")?;
    }
    let doc_id = store
        .store(&generated.plan, plan_metadata(generated))
        .context("Failed to index plan")?;
    info!(%doc_id, "Indexed plan");
    Ok(doc_id)
}
