use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::CandidateId;

/// Which part of the workflow produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    Workflow,
    Filter,
    Priority,
    State,
    Performance,
    Error,
}

impl AuditCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Workflow => "workflow",
            Self::Filter => "filter",
            Self::Priority => "priority",
            Self::State => "state",
            Self::Performance => "performance",
            Self::Error => "error",
        }
    }
}

impl FromStr for AuditCategory {
    type Err = UnknownAuditFilter;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "workflow" => Ok(Self::Workflow),
            "filter" => Ok(Self::Filter),
            "priority" => Ok(Self::Priority),
            "state" => Ok(Self::State),
            "performance" => Ok(Self::Performance),
            "error" => Ok(Self::Error),
            other => Err(UnknownAuditFilter {
                kind: "category",
                value: other.to_string(),
            }),
        }
    }
}

/// Severity of an entry, ordered ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl AuditLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl FromStr for AuditLevel {
    type Err = UnknownAuditFilter;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(UnknownAuditFilter {
                kind: "level",
                value: other.to_string(),
            }),
        }
    }
}

/// Raised when a query string names a category or level outside the closed sets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown audit {kind} '{value}'")]
pub struct UnknownAuditFilter {
    pub kind: &'static str,
    pub value: String,
}

/// One immutable decision record. Never updated in place; removal happens
/// only through the explicit retention pruning operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub category: AuditCategory,
    pub level: AuditLevel,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub candidate_id: Option<CandidateId>,
    pub message: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Persistence failure for the audit backing store. Processing never aborts
/// on one of these; the entry is echoed to the tracing sink instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuditStoreError {
    #[error("audit store unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction so the log can be exercised in isolation and swapped
/// for a durable table in the host application.
pub trait AuditStore: Send + Sync {
    fn append(&self, entry: AuditLogEntry) -> Result<(), AuditStoreError>;
    fn snapshot(&self) -> Result<Vec<AuditLogEntry>, AuditStoreError>;
    /// Drop entries older than `cutoff`, returning how many were removed.
    fn retain_since(&self, cutoff: DateTime<Utc>) -> Result<usize, AuditStoreError>;
}

#[derive(Default, Clone)]
pub struct InMemoryAuditStore {
    entries: Arc<Mutex<Vec<AuditLogEntry>>>,
}

impl AuditStore for InMemoryAuditStore {
    fn append(&self, entry: AuditLogEntry) -> Result<(), AuditStoreError> {
        self.entries
            .lock()
            .expect("audit mutex poisoned")
            .push(entry);
        Ok(())
    }

    fn snapshot(&self) -> Result<Vec<AuditLogEntry>, AuditStoreError> {
        Ok(self.entries.lock().expect("audit mutex poisoned").clone())
    }

    fn retain_since(&self, cutoff: DateTime<Utc>) -> Result<usize, AuditStoreError> {
        let mut guard = self.entries.lock().expect("audit mutex poisoned");
        let before = guard.len();
        guard.retain(|entry| entry.timestamp >= cutoff);
        Ok(before - guard.len())
    }
}

/// Filters applied to a log query; all present filters must match.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub candidate_id: Option<CandidateId>,
    pub category: Option<AuditCategory>,
    pub level: Option<AuditLevel>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl AuditQuery {
    const DEFAULT_LIMIT: usize = 100;

    fn matches(&self, entry: &AuditLogEntry) -> bool {
        if let Some(candidate_id) = &self.candidate_id {
            if entry.candidate_id.as_ref() != Some(candidate_id) {
                return false;
            }
        }
        if let Some(category) = self.category {
            if entry.category != category {
                return false;
            }
        }
        if let Some(level) = self.level {
            if entry.level != level {
                return false;
            }
        }
        if let Some(start) = self.start {
            if entry.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if entry.timestamp > end {
                return false;
            }
        }
        true
    }
}

/// Aggregate view over a window of the log, recomputed from scratch per call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditStatistics {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_level: BTreeMap<String, usize>,
    pub error_rate: f64,
    pub unique_candidates: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_active_candidate: Option<CandidateId>,
    pub hourly_activity: BTreeMap<String, usize>,
}

/// Export encodings for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditExportFormat {
    Json,
    Csv,
}

impl FromStr for AuditExportFormat {
    type Err = UnknownAuditFilter;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(UnknownAuditFilter {
                kind: "export format",
                value: other.to_string(),
            }),
        }
    }
}

/// Failure while rendering an export payload.
#[derive(Debug, thiserror::Error)]
pub enum AuditExportError {
    #[error(transparent)]
    Store(#[from] AuditStoreError),
    #[error("failed to serialize audit entries: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to render csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("rendered csv was not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Append-only, queryable record of every workflow decision.
pub struct AuditLog<S> {
    store: S,
    sequence: AtomicU64,
}

impl<S: AuditStore> AuditLog<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            sequence: AtomicU64::new(1),
        }
    }

    /// Append one entry and mirror it to the operational log sink.
    ///
    /// A store failure is reported through tracing and swallowed; losing an
    /// audit row is an accepted trade-off against failing the candidate.
    pub fn log(
        &self,
        category: AuditCategory,
        level: AuditLevel,
        candidate_id: Option<&CandidateId>,
        message: impl Into<String>,
        metadata: BTreeMap<String, String>,
    ) {
        let message = message.into();
        let entry = AuditLogEntry {
            id: self.sequence.fetch_add(1, Ordering::Relaxed),
            timestamp: Utc::now(),
            category,
            level,
            candidate_id: candidate_id.cloned(),
            message,
            metadata,
        };

        emit_trace(&entry);

        if let Err(error) = self.store.append(entry) {
            tracing::error!(%error, "audit entry dropped");
        }
    }

    /// Entries matching every given filter, newest first, bounded by the
    /// query limit.
    pub fn entries(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>, AuditStoreError> {
        let mut entries: Vec<_> = self
            .store
            .snapshot()?
            .into_iter()
            .filter(|entry| query.matches(entry))
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        entries.truncate(query.limit.unwrap_or(AuditQuery::DEFAULT_LIMIT));
        Ok(entries)
    }

    /// Distribution and activity statistics over the given window.
    pub fn statistics(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<AuditStatistics, AuditStoreError> {
        let window = AuditQuery {
            start,
            end,
            ..AuditQuery::default()
        };
        let entries: Vec<_> = self
            .store
            .snapshot()?
            .into_iter()
            .filter(|entry| window.matches(entry))
            .collect();

        let mut by_category = BTreeMap::new();
        let mut by_level = BTreeMap::new();
        let mut by_candidate: BTreeMap<CandidateId, usize> = BTreeMap::new();
        let mut hourly_activity = BTreeMap::new();
        let mut severe = 0usize;

        for entry in &entries {
            *by_category
                .entry(entry.category.label().to_string())
                .or_insert(0) += 1;
            *by_level.entry(entry.level.label().to_string()).or_insert(0) += 1;
            if entry.level >= AuditLevel::Error {
                severe += 1;
            }
            if let Some(candidate_id) = &entry.candidate_id {
                *by_candidate.entry(candidate_id.clone()).or_insert(0) += 1;
            }
            *hourly_activity
                .entry(entry.timestamp.format("%Y-%m-%dT%H:00").to_string())
                .or_insert(0) += 1;
        }

        let error_rate = if entries.is_empty() {
            0.0
        } else {
            severe as f64 / entries.len() as f64
        };
        let most_active_candidate = by_candidate
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(candidate_id, _)| candidate_id.clone());

        Ok(AuditStatistics {
            total: entries.len(),
            by_category,
            by_level,
            error_rate,
            unique_candidates: by_candidate.len(),
            most_active_candidate,
            hourly_activity,
        })
    }

    /// Render matching entries as JSON or CSV. The JSON form round-trips
    /// every field exactly.
    pub fn export(
        &self,
        format: AuditExportFormat,
        query: &AuditQuery,
    ) -> Result<String, AuditExportError> {
        let entries = self.entries(query)?;
        match format {
            AuditExportFormat::Json => Ok(serde_json::to_string_pretty(&entries)?),
            AuditExportFormat::Csv => {
                let mut writer = csv::Writer::from_writer(Vec::new());
                writer.write_record([
                    "id",
                    "timestamp",
                    "category",
                    "level",
                    "candidate_id",
                    "message",
                    "metadata_json",
                ])?;
                for entry in &entries {
                    writer.write_record([
                        entry.id.to_string(),
                        entry.timestamp.to_rfc3339(),
                        entry.category.label().to_string(),
                        entry.level.label().to_string(),
                        entry
                            .candidate_id
                            .as_ref()
                            .map(|id| id.0.clone())
                            .unwrap_or_default(),
                        entry.message.clone(),
                        serde_json::to_string(&entry.metadata)?,
                    ])?;
                }
                let bytes = writer
                    .into_inner()
                    .map_err(|error| csv::Error::from(error.into_error()))?;
                Ok(String::from_utf8(bytes)?)
            }
        }
    }

    /// Explicit retention pruning; there is no background eviction.
    pub fn cleanup(&self, days_to_keep: i64, now: DateTime<Utc>) -> Result<usize, AuditStoreError> {
        self.store.retain_since(now - Duration::days(days_to_keep))
    }
}

fn emit_trace(entry: &AuditLogEntry) {
    let candidate = entry
        .candidate_id
        .as_ref()
        .map(|id| id.0.as_str())
        .unwrap_or("-");
    match entry.level {
        AuditLevel::Debug => {
            tracing::debug!(category = entry.category.label(), candidate, "{}", entry.message)
        }
        AuditLevel::Info => {
            tracing::info!(category = entry.category.label(), candidate, "{}", entry.message)
        }
        AuditLevel::Warning => {
            tracing::warn!(category = entry.category.label(), candidate, "{}", entry.message)
        }
        AuditLevel::Error | AuditLevel::Critical => {
            tracing::error!(category = entry.category.label(), candidate, "{}", entry.message)
        }
    }
}
