//! Core data types shared by every pipeline stage.

pub mod context;

pub use context::{Behavior, BehaviorFlags, CfgMetrics, Context, CounterTable, KeyCount};
