//! Assembly-dump front end for malware triage.
//!
//! Turns a textual disassembly listing into a compact JSON IR: opcode and
//! API-reference counts, inferred behavior flags and approximate
//! control-flow metrics. See [`pipeline::run`] for the end-to-end entry point.

/// Core data types module
pub mod core;

/// Lexer and line-oriented parser
pub mod frontend;

/// Semantic classification and CFG metrics
pub mod analysis;

/// JSON IR document and writer
pub mod ir;

/// Pipeline configuration
pub mod config;

/// Error types
pub mod error;

/// Bounded input reading
pub mod io;

/// Tracing setup and helper macros
pub mod logging;

/// End-to-end per-file analysis
pub mod pipeline;

pub use config::AnalyzerConfig;
pub use error::{AsmIrError, Result};
pub use pipeline::{analyze_source, run, Analysis, RunSummary};
