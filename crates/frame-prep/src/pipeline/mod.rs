//! Pipeline module.
//!
//! This module provides the operation vocabulary and the stateful manager
//! that applies operations to a working table.

mod operation;
mod state;

pub use operation::{ApplyOutcome, Operation};
pub use state::{OperationRecord, PipelineState};
