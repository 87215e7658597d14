//! Filter Selection Module
//!
//! This module contains the client-side filter state machine:
//! - Models (dimensions, ranges, settled snapshots)
//! - A cancellable task scheduler abstraction
//! - The debounced pipeline that emits settled snapshots

pub mod models;
pub mod pipeline;
pub mod scheduler;

// Re-export commonly used types for convenience
pub use models::{FilterBounds, FilterDefaults, FilterDimension, FilterSnapshot, Range};
pub use pipeline::{FilterConsumer, FilterPipeline, DEFAULT_DEBOUNCE};
pub use scheduler::{Scheduler, TaskHandle, TokioScheduler};
