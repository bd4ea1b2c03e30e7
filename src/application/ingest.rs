//! Index setup and bulk ingestion
//!
//! Documents are built from the generated files and sent to the search engine
//! in fixed-size batches. Per-document failures, missing files and records
//! that fail validation are counted and reported but never stop the load.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::core::store::{read_json, DataDir};
use crate::domain::{BranchRecord, FinancialReport, ReportFile, ReportIndexEntry, StaffMember};
use crate::infrastructure::search::{
    inference_endpoint_config, BulkAction, BulkOutcome, IndexKind, SearchBackend, INFERENCE_ID,
    INFERENCE_TASK,
};

/// Bulk request size used when none is configured
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// What happened to the embedding inference endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceSetup {
    Existing,
    Created,
    /// No Cohere key; the endpoint must be created by hand before ingest
    MissingKey,
}

/// Create the embedding inference endpoint unless it already exists
pub async fn ensure_inference_endpoint(
    backend: &dyn SearchBackend,
    cohere_api_key: Option<&str>,
) -> Result<InferenceSetup> {
    if backend.inference_exists(INFERENCE_ID).await? {
        info!("Inference endpoint '{}' already exists, skipping", INFERENCE_ID);
        return Ok(InferenceSetup::Existing);
    }
    let Some(key) = cohere_api_key.filter(|k| !k.trim().is_empty()) else {
        warn!(
            "COHERE_API_KEY not set, skipping inference endpoint '{}'; create it before ingesting",
            INFERENCE_ID
        );
        return Ok(InferenceSetup::MissingKey);
    };
    backend
        .put_inference(INFERENCE_TASK, INFERENCE_ID, &inference_endpoint_config(key))
        .await?;
    info!("Created inference endpoint '{}'", INFERENCE_ID);
    Ok(InferenceSetup::Created)
}

/// Create (or with `delete`, remove) the given indices.
/// Existing indices are skipped unless `force` is set, which recreates them.
/// A full run (no indices named) first ensures the inference endpoint the
/// semantic fields are bound to.
pub async fn setup_indices(
    backend: &dyn SearchBackend,
    kinds: &[IndexKind],
    force: bool,
    delete: bool,
    cohere_api_key: Option<&str>,
) -> Result<()> {
    if delete {
        for kind in IndexKind::selection(kinds) {
            let name = kind.index_name();
            if backend.index_exists(name).await? {
                backend.delete_index(name).await?;
                info!("Deleted index '{}'", name);
            } else {
                info!("Index '{}' does not exist", name);
            }
        }
        return Ok(());
    }

    if kinds.is_empty() {
        ensure_inference_endpoint(backend, cohere_api_key).await?;
    }

    for kind in IndexKind::selection(kinds) {
        let name = kind.index_name();
        if backend.index_exists(name).await? {
            if !force {
                info!("Index '{}' already exists, skipping (use --force to recreate)", name);
                continue;
            }
            info!("Index '{}' exists, deleting (--force)", name);
            backend.delete_index(name).await?;
        }
        backend.create_index(name, &kind.mappings()).await?;
        info!("Created index '{}'", name);
    }
    Ok(())
}

/// Result of loading one index
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub kind: IndexKind,
    pub indexed: usize,
    pub errors: Vec<String>,
    /// Source records skipped before indexing (missing or invalid files)
    pub skipped: usize,
}

/// Branch document; an empty `closed_date` is dropped so the date field
/// never sees `""`
pub fn branch_document(record: &BranchRecord) -> Result<Value> {
    let mut doc = serde_json::to_value(record)?;
    if let Some(map) = doc.as_object_mut() {
        let empty = map
            .get("closed_date")
            .and_then(Value::as_str)
            .is_some_and(str::is_empty);
        if empty {
            map.remove("closed_date");
        }
    }
    Ok(doc)
}

pub fn staff_document(member: &StaffMember) -> Result<Value> {
    Ok(serde_json::to_value(member)?)
}

/// Report document rebuilt from the report file
pub fn report_document(entry: &ReportIndexEntry, file: &ReportFile) -> Value {
    let timestamp = if file.date.is_empty() {
        Value::Null
    } else {
        Value::String(format!("{}T09:00:00Z", file.date))
    };
    json!({
        "id": entry.id,
        "branch_id": entry.branch_id,
        "branch_name": file.branch_name,
        "sender_email": file.sender_email,
        "subject": file.subject,
        "text": file.text,
        "text_embedding": file.text,
        "date": file.date,
        "timestamp": timestamp,
    })
}

#[derive(Debug, Deserialize)]
struct FinancialIndexEntry {
    file_path: String,
}

/// Loads generated data into the search engine
pub struct Ingestor<'a> {
    backend: &'a dyn SearchBackend,
    data: DataDir,
    batch_size: usize,
}

impl<'a> Ingestor<'a> {
    pub fn new(backend: &'a dyn SearchBackend, data: DataDir, batch_size: usize) -> Self {
        Self {
            backend,
            data,
            batch_size: batch_size.max(1),
        }
    }

    /// Load every requested index
    pub async fn ingest_all(&self, kinds: &[IndexKind]) -> Result<Vec<IngestReport>> {
        let mut reports = Vec::new();
        for kind in IndexKind::selection(kinds) {
            reports.push(self.ingest(kind).await?);
        }
        Ok(reports)
    }

    /// Load one index, refresh it and log the resulting document count
    pub async fn ingest(&self, kind: IndexKind) -> Result<IngestReport> {
        let index = kind.index_name();
        let (actions, skipped) = self.actions(kind)?;
        info!("Ingesting {} {} documents into '{}'", actions.len(), kind, index);

        let outcome = self.send(&actions).await?;

        self.backend.refresh(index).await?;
        match self.backend.count(index).await {
            Ok(count) => info!("{}: {} documents indexed", index, count),
            Err(e) => warn!("Could not count {}: {:#}", index, e),
        }
        if !outcome.errors.is_empty() {
            warn!("{}: {} errors occurred", index, outcome.errors.len());
        }

        Ok(IngestReport {
            kind,
            indexed: outcome.indexed,
            errors: outcome.errors,
            skipped,
        })
    }

    async fn send(&self, actions: &[BulkAction]) -> Result<BulkOutcome> {
        let mut total = BulkOutcome::default();
        for (i, batch) in actions.chunks(self.batch_size).enumerate() {
            let outcome = self
                .backend
                .bulk(batch)
                .await
                .with_context(|| format!("bulk batch {} failed", i + 1))?;
            if outcome.errors.is_empty() {
                info!("Batch {}: {}/{} indexed", i + 1, outcome.indexed, batch.len());
            } else {
                warn!(
                    "Batch {}: {}/{} indexed, {} errors",
                    i + 1,
                    outcome.indexed,
                    batch.len(),
                    outcome.errors.len()
                );
                for error in outcome.errors.iter().take(3) {
                    warn!("  {}", error);
                }
            }
            total.merge(outcome);
        }
        Ok(total)
    }

    /// Documents for `kind` plus the number of source records skipped
    pub fn actions(&self, kind: IndexKind) -> Result<(Vec<BulkAction>, usize)> {
        match kind {
            IndexKind::Branches => {
                let branches = self.data.load_branches()?;
                let actions = branches
                    .iter()
                    .map(|b| Ok(action(kind, &b.id, branch_document(b)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok((actions, 0))
            }
            IndexKind::Staff => {
                let staff = self.data.load_staff()?;
                let actions = staff
                    .iter()
                    .map(|m| Ok(action(kind, &m.id, staff_document(m)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok((actions, 0))
            }
            IndexKind::Reports => self.report_actions(),
            IndexKind::Financial => self.financial_actions(),
        }
    }

    fn report_actions(&self) -> Result<(Vec<BulkAction>, usize)> {
        let entries = self.data.load_report_index()?;
        info!("Found {} report entries", entries.len());

        let mut actions = Vec::with_capacity(entries.len());
        let mut skipped = 0;
        for entry in &entries {
            let path = self.data.resolve(&entry.file_path);
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("File not found: {} ({})", path.display(), e);
                    skipped += 1;
                    continue;
                }
            };
            let file = ReportFile::parse(&content);
            actions.push(action(
                IndexKind::Reports,
                &entry.id,
                report_document(entry, &file),
            ));
        }
        Ok((actions, skipped))
    }

    fn financial_actions(&self) -> Result<(Vec<BulkAction>, usize)> {
        let index_path = self.data.financial_index_path();
        let entries: Vec<FinancialIndexEntry> = read_json(&index_path)?;
        info!("Found {} financial reports in index.json", entries.len());

        let mut actions = Vec::with_capacity(entries.len());
        let mut skipped = 0;
        for entry in &entries {
            let path = self.data.resolve(&entry.file_path);
            let raw = match std::fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("File not found: {} ({})", path.display(), e);
                    skipped += 1;
                    continue;
                }
            };
            let report = match FinancialReport::from_json(&raw) {
                Ok(report) => report,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    skipped += 1;
                    continue;
                }
            };
            actions.push(action(
                IndexKind::Financial,
                &report.id,
                report.search_document()?,
            ));
        }
        Ok((actions, skipped))
    }
}

fn action(kind: IndexKind, id: &str, source: Value) -> BulkAction {
    BulkAction {
        index: kind.index_name().to_string(),
        id: id.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calendar::ymd;

    #[test]
    fn test_report_document_fields() {
        let entry = ReportIndexEntry {
            id: "report-00007".to_string(),
            branch_id: "branch-003".to_string(),
            date: ymd(2025, 8, 10),
            file_path: "unused".to_string(),
        };
        let file = ReportFile {
            subject: "Grinder jammed".to_string(),
            sender_email: "wei.chen@beanstack.com".to_string(),
            date: "2025-08-10".to_string(),
            branch_name: "BeanStack Uptown Chicago".to_string(),
            text: "Grinder jammed twice. - Wei".to_string(),
        };
        let doc = report_document(&entry, &file);
        assert_eq!(doc["id"], "report-00007");
        assert_eq!(doc["text_embedding"], doc["text"]);
        assert_eq!(doc["timestamp"], "2025-08-10T09:00:00Z");
    }

    #[test]
    fn test_report_document_without_date() {
        let entry = ReportIndexEntry {
            id: "report-00008".to_string(),
            branch_id: "branch-003".to_string(),
            date: ymd(2025, 8, 10),
            file_path: "unused".to_string(),
        };
        let doc = report_document(&entry, &ReportFile::default());
        assert!(doc["timestamp"].is_null());
    }
}
