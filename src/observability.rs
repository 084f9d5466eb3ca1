use chrono::{DateTime, Utc};
use std::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::error::EvaluationError;
use crate::evaluation::FlagName;

/// Where a fallback value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackSource {
    Default,
    Stale,
}

impl FallbackSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackSource::Default => "default",
            FallbackSource::Stale => "stale",
        }
    }
}

/// One failed outbound evaluation and the value the caller got instead.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub id: Uuid,
    pub flag: FlagName,
    pub cause: EvaluationError,
    pub fallback: bool,
    pub fallback_source: FallbackSource,
    pub occurred_at: DateTime<Utc>,
}

impl FailureRecord {
    pub fn new(
        flag: FlagName,
        cause: EvaluationError,
        fallback: bool,
        fallback_source: FallbackSource,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            flag,
            cause,
            fallback,
            fallback_source,
            occurred_at: Utc::now(),
        }
    }
}

/// One-way channel for evaluation failures. Not part of the decision path.
pub trait FailureSink: Send + Sync {
    fn report(&self, record: &FailureRecord);
}

/// Emits each failure as a structured `warn` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn report(&self, record: &FailureRecord) {
        warn!(
            record_id = %record.id,
            flag = %record.flag,
            cause = record.cause.cause(),
            error = %record.cause,
            fallback = record.fallback,
            fallback_source = record.fallback_source.as_str(),
            occurred_at = %record.occurred_at.to_rfc3339(),
            "Flag evaluation failed, using fallback"
        );
    }
}

/// Keeps every record in memory. Useful for hosts that batch failures into
/// their own metrics pipeline, and for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<FailureRecord>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<FailureRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FailureSink for RecordingSink {
    fn report(&self, record: &FailureRecord) {
        match self.records.lock() {
            Ok(mut records) => records.push(record.clone()),
            Err(poisoned) => poisoned.into_inner().push(record.clone()),
        }
    }
}
