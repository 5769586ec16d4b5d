//! Test utilities for querykit.
//!
//! An in-memory backend (builder, executor, store) that evaluates filters
//! over JSON records, plus fixtures and an orchestrator that records what its
//! error hook observed.

mod fixtures;
mod memory;
mod recording;

pub use fixtures::{init_test_tracing, sample_items};
pub use memory::{
    resolve_field, FailingExecutor, MemoryExecutor, MemoryExpression, MemoryExpressionBuilder,
    MemoryPredicate, MemoryStore, StoreUnavailable,
};
pub use recording::RecordingOrchestrator;
