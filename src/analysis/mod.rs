//! Post-parse passes over a populated [`crate::core::Context`].
//!
//! The semantic classifier raises behavior flags; the CFG builder derives
//! approximate control-flow metrics from opcode counts.

pub mod cfg;
pub mod semantic;

pub use cfg::{
    build_cfg, classify_ctrl_flow, classify_ctrl_flow_with, compute_metrics,
    compute_metrics_with, FlowClass, CALL_MNEMONICS,
};
pub use semantic::{
    semantic_analyze, ClassificationReport, Evidence, SemanticClassifier,
};
