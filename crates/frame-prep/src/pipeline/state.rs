//! Pipeline state management.
//!
//! [`PipelineState`] owns the working table and the original table captured
//! at load time. Operations are applied one at a time; each successful
//! mutation replaces the working table wholesale, so a failed operation
//! leaves it untouched.
//!
//! ```text
//!            load                    apply / reset
//!   Empty ─────────▶ Loaded ◀───────────────────────┐
//!     ▲                │  └─────────────────────────┘
//!     └──── clear ─────┘
//! ```
//!
//! # Thread Safety
//!
//! `apply` takes `&mut self`. A host that shares the state between threads
//! wraps it in a lock; the type is `Send + Sync`.

use super::operation::{ApplyOutcome, Operation};
use crate::config::PipelineConfig;
use crate::error::{PrepError, Result};
use crate::export::to_csv_bytes;
use crate::table::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One applied mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub operation: Operation,
    pub applied_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
}

struct Loaded {
    original: Table,
    working: Table,
}

/// The working table, the original it came from, and the mutation log.
pub struct PipelineState {
    config: PipelineConfig,
    data: Option<Loaded>,
    version: u64,
    operations_applied: usize,
    history: VecDeque<OperationRecord>,
}

static_assertions::assert_impl_all!(PipelineState: Send, Sync);
static_assertions::assert_impl_all!(Table: Send, Sync);

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineState {
    /// Empty state with the default configuration.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            data: None,
            version: 0,
            operations_applied: 0,
            history: VecDeque::new(),
        }
    }

    /// Empty state with a validated configuration.
    pub fn with_config(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    /// Replace any loaded data with `table`.
    ///
    /// Original and working are fresh snapshots, so index sets computed
    /// against `table` itself are not accepted afterwards.
    pub fn load(&mut self, table: Table) {
        info!(
            "Loaded table: {} rows x {} columns",
            table.height(),
            table.width()
        );
        self.data = Some(Loaded {
            original: table.snapshot(),
            working: table.snapshot(),
        });
        self.operations_applied = 0;
        self.history.clear();
        self.version += 1;
    }

    /// Apply one operation to the working table.
    ///
    /// Transforms replace the working table and return it. Detections return
    /// the outlier index set and leave the state unchanged. On error the
    /// working table is unchanged.
    pub fn apply(&mut self, operation: &Operation) -> Result<ApplyOutcome> {
        let loaded = self.data.as_mut().ok_or(PrepError::NoDataLoaded)?;
        let before = &loaded.working;
        let (rows_before, columns_before) = (before.height(), before.width());

        let start = Instant::now();
        let outcome = operation.run(before, &self.config).inspect_err(|e| {
            warn!("Operation '{}' failed: {}", operation.name(), e);
        })?;
        let elapsed = start.elapsed();
        let duration_ms = elapsed.as_millis() as u64;

        if duration_ms >= self.config.slow_operation_ms {
            warn!(
                "Operation '{}' took {}ms (slow threshold {}ms)",
                operation.name(),
                duration_ms,
                self.config.slow_operation_ms
            );
        }

        let table = match outcome {
            ApplyOutcome::Outliers(set) => {
                info!(
                    "Detected {} outliers in '{}' with {} in {:.2?}",
                    set.len(),
                    set.column(),
                    operation.name(),
                    elapsed
                );
                return Ok(ApplyOutcome::Outliers(set));
            }
            ApplyOutcome::Table(table) => table,
        };

        info!(
            "Applied '{}' in {:.2?}: {}x{} -> {}x{}",
            operation.name(),
            elapsed,
            rows_before,
            columns_before,
            table.height(),
            table.width()
        );

        loaded.working = table.clone();
        self.push_record(OperationRecord {
            operation: operation.clone(),
            applied_at: Utc::now(),
            duration_ms,
            rows_before,
            rows_after: table.height(),
            columns_before,
            columns_after: table.width(),
        });
        self.operations_applied += 1;
        self.version += 1;

        Ok(ApplyOutcome::Table(table))
    }

    fn push_record(&mut self, record: OperationRecord) {
        if self.history.len() >= self.config.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }

    /// Restore the working table to a fresh snapshot of the original.
    pub fn reset(&mut self) -> Result<Table> {
        let loaded = self.data.as_mut().ok_or(PrepError::NoDataLoaded)?;
        loaded.working = loaded.original.snapshot();
        let working = loaded.working.clone();

        debug!("Discarded {} applied operations", self.operations_applied);
        self.operations_applied = 0;
        self.history.clear();
        self.version += 1;

        info!("Reset working table to original");
        Ok(working)
    }

    /// Drop all loaded data. Clearing an empty state does nothing.
    pub fn clear(&mut self) {
        if self.data.take().is_some() {
            self.operations_applied = 0;
            self.history.clear();
            self.version += 1;
            info!("Cleared pipeline state");
        }
    }

    /// The working table.
    pub fn current(&self) -> Result<&Table> {
        self.data
            .as_ref()
            .map(|loaded| &loaded.working)
            .ok_or(PrepError::NoDataLoaded)
    }

    /// The table as it was loaded.
    pub fn original(&self) -> Result<&Table> {
        self.data
            .as_ref()
            .map(|loaded| &loaded.original)
            .ok_or(PrepError::NoDataLoaded)
    }

    /// The working table as CSV bytes.
    pub fn export_csv(&self) -> Result<Vec<u8>> {
        to_csv_bytes(self.current()?)
    }

    /// Counter bumped by every load, mutation, reset and clear.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Mutations applied since the last load or reset.
    pub fn operations_applied(&self) -> usize {
        self.operations_applied
    }

    pub fn has_modifications(&self) -> bool {
        self.operations_applied > 0
    }

    /// Most recent mutations, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &OperationRecord> {
        self.history.iter()
    }
}
