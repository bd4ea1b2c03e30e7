//! Generated data storage
//!
//! `DataDir` reads and writes the JSON collections under the data directory.
//! `ReportStore` writes one text file per report and keeps an append-only
//! journal of index entries, one line per report actually written. The flat
//! `index.json` array is materialized from the journal when a run finishes, so
//! an interrupted run still leaves a journal that matches the files on disk.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::core::calendar::format_date;
use crate::domain::{
    BranchRecord, NarrativeArc, ReportFile, ReportIndexEntry, StaffMember, WeeklyReport,
};
use crate::errors::{BeanstackError, Result};

pub const BRANCHES_FILE: &str = "branches.json";
pub const STAFF_FILE: &str = "staff.json";
pub const NARRATIVES_FILE: &str = "branch_narratives.json";
pub const REPORTS_DIR: &str = "reports";
pub const FINANCIAL_DIR: &str = "financial-reports";
pub const INDEX_FILE: &str = "index.json";
pub const JOURNAL_FILE: &str = "index.jsonl";
pub const WORKFLOW_IDS_FILE: &str = "workflow_ids.json";

/// Write `value` as pretty JSON, replacing `path` atomically
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Async counterpart of [`write_json`]
pub async fn write_json_async<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(value)?;
    tokio::fs::write(&tmp, content).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Parse journal lines; blank lines are ignored and a torn line from an
/// interrupted write is skipped
pub fn parse_journal(content: &str) -> Vec<ReportIndexEntry> {
    let mut entries = vec![];
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ReportIndexEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!("Skipping unreadable journal line {}: {}", i + 1, e),
        }
    }
    entries
}

/// Read a JSON document
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        BeanstackError::StorageError(format!("cannot read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        BeanstackError::StorageError(format!("cannot parse {}: {}", path.display(), e))
    })
}

/// Layout of the generated data directory
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn branches_path(&self) -> PathBuf {
        self.root.join(BRANCHES_FILE)
    }

    pub fn staff_path(&self) -> PathBuf {
        self.root.join(STAFF_FILE)
    }

    pub fn narratives_path(&self) -> PathBuf {
        self.root.join(NARRATIVES_FILE)
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.root.join(REPORTS_DIR)
    }

    pub fn report_index_path(&self) -> PathBuf {
        self.reports_dir().join(INDEX_FILE)
    }

    pub fn financial_index_path(&self) -> PathBuf {
        self.root.join(FINANCIAL_DIR).join(INDEX_FILE)
    }

    pub fn save_branches(&self, branches: &[BranchRecord]) -> Result<PathBuf> {
        let path = self.branches_path();
        write_json(&path, branches)?;
        Ok(path)
    }

    pub fn save_staff(&self, staff: &[StaffMember]) -> Result<PathBuf> {
        let path = self.staff_path();
        write_json(&path, staff)?;
        Ok(path)
    }

    pub fn load_branches(&self) -> Result<Vec<BranchRecord>> {
        read_json(&self.branches_path())
    }

    pub fn load_staff(&self) -> Result<Vec<StaffMember>> {
        let staff: Vec<StaffMember> = read_json(&self.staff_path())?;
        for member in &staff {
            member.validate()?;
        }
        Ok(staff)
    }

    pub fn report_journal_path(&self) -> PathBuf {
        self.reports_dir().join(JOURNAL_FILE)
    }

    /// Report index entries. `index.json` when the last run finished,
    /// otherwise the journal of an interrupted run.
    pub fn load_report_index(&self) -> Result<Vec<ReportIndexEntry>> {
        let index = self.report_index_path();
        let journal = self.report_journal_path();
        if index.exists() || !journal.exists() {
            return read_json(&index);
        }
        warn!(
            "No {} found, reading entries from {}",
            index.display(),
            journal.display()
        );
        let content = std::fs::read_to_string(&journal).map_err(|e| {
            BeanstackError::StorageError(format!("cannot read {}: {}", journal.display(), e))
        })?;
        Ok(parse_journal(&content))
    }

    pub fn workflow_ids_path(&self) -> PathBuf {
        self.root.join(WORKFLOW_IDS_FILE)
    }

    /// Workflow name to platform id, from the last workflow deployment
    pub fn load_workflow_ids(&self) -> Result<BTreeMap<String, String>> {
        let path = self.workflow_ids_path();
        if !path.exists() {
            warn!("No {} found; deploy workflows first", path.display());
            return Ok(BTreeMap::new());
        }
        read_json(&path)
    }

    pub fn save_workflow_ids(&self, ids: &BTreeMap<String, String>) -> Result<PathBuf> {
        let path = self.workflow_ids_path();
        write_json(&path, ids)?;
        Ok(path)
    }

    /// Narrative arcs keyed by branch id. JSON, or YAML for `.yaml`/`.yml`.
    /// A missing file means no branch has an arc.
    pub fn load_narratives(&self, path: Option<&Path>) -> Result<HashMap<String, NarrativeArc>> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(|| self.narratives_path());
        if !path.exists() {
            warn!("No narrative file at {}, generating without arcs", path.display());
            return Ok(HashMap::new());
        }
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            let content = std::fs::read_to_string(&path)?;
            Ok(serde_yaml::from_str(&content)?)
        } else {
            read_json(&path)
        }
    }

    /// Resolve an index `file_path`, which may be absolute, relative to the
    /// working directory, or relative to the data directory
    pub fn resolve(&self, file_path: &str) -> PathBuf {
        let candidate = PathBuf::from(file_path);
        if candidate.is_absolute() || candidate.exists() {
            candidate
        } else {
            self.root.join(file_path)
        }
    }
}

/// Report files plus the append-only index journal
pub struct ReportStore {
    root: PathBuf,
    journal: tokio::fs::File,
    written: usize,
}

impl ReportStore {
    /// Open the store for a new run. The previous journal is truncated and
    /// the previous `index.json` removed, so until `finalize` the journal is
    /// the only index on disk.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        let index = root.join(INDEX_FILE);
        if tokio::fs::try_exists(&index).await? {
            tokio::fs::remove_file(&index).await?;
        }
        let journal = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(root.join(JOURNAL_FILE))
            .await?;
        Ok(Self {
            root,
            journal,
            written: 0,
        })
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// `{branch}/{YYYY}/{MM}/weekly-report-{YYYY-MM-DD}.txt`
    pub fn relative_path(report: &WeeklyReport) -> PathBuf {
        let date = format_date(report.date);
        PathBuf::from(&report.branch_id)
            .join(report.date.format("%Y").to_string())
            .join(report.date.format("%m").to_string())
            .join(format!("weekly-report-{}.txt", date))
    }

    /// Write the report file, then append its index entry
    pub async fn save(&mut self, report: &WeeklyReport) -> Result<ReportIndexEntry> {
        let path = self.root.join(Self::relative_path(report));
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, ReportFile::from_report(report).render()).await?;

        let entry = ReportIndexEntry {
            id: report.id.clone(),
            branch_id: report.branch_id.clone(),
            date: report.date,
            file_path: path.to_string_lossy().replace('\\', "/"),
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        self.journal.write_all(line.as_bytes()).await?;
        self.journal.flush().await?;
        self.journal.sync_data().await?;
        self.written += 1;

        debug!("Saved {} to {}", report.id, entry.file_path);
        Ok(entry)
    }

    /// Materialize `index.json` from the journal
    pub async fn finalize(&mut self) -> Result<Vec<ReportIndexEntry>> {
        self.journal.flush().await?;
        let entries = Self::read_journal(&self.root).await?;
        write_json_async(&self.root.join(INDEX_FILE), &entries).await?;
        Ok(entries)
    }

    /// Entries recorded in the journal. A torn last line from an interrupted
    /// write is skipped.
    pub async fn read_journal(root: &Path) -> Result<Vec<ReportIndexEntry>> {
        let path = root.join(JOURNAL_FILE);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(vec![]);
        }
        let content = tokio::fs::read_to_string(&path).await?;
        Ok(parse_journal(&content))
    }
}
