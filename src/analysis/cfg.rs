//! Approximate CFG metrics from aggregated opcode counts.
//!
//! No graph is reconstructed. Every instruction occurrence is treated as its
//! own block and contributes a fixed number of edges by control-flow class:
//!
//! | class       | edges per occurrence      |
//! |-------------|---------------------------|
//! | branch      | 2 (target + fallthrough)  |
//! | call        | 2 (call + return path)    |
//! | return      | 1                         |
//! | sequential  | 1                         |
//!
//! The call class is the configured call-mnemonic set, the same set the parser
//! uses to pick API references.
//!
//! Cyclomatic complexity is `edges - blocks + 2`, floored at 1.0. The numbers
//! are a cheap, deterministic feature, not a sound graph measure.

use crate::core::context::{CfgMetrics, Context, CounterTable};
use tracing::debug;

/// Control-flow class of a mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowClass {
    Branch,
    Call,
    Return,
    Sequential,
}

impl FlowClass {
    pub fn edges(&self) -> u64 {
        match self {
            FlowClass::Branch | FlowClass::Call => 2,
            FlowClass::Return | FlowClass::Sequential => 1,
        }
    }
}

/// Default call-class mnemonics.
pub const CALL_MNEMONICS: [&str; 4] = ["CALL", "CALLQ", "CALLL", "LCALL"];

/// Classify an x86 mnemonic (any case) with the default call set.
pub fn classify_ctrl_flow(mnemonic: &str) -> FlowClass {
    classify_ctrl_flow_with(mnemonic, &CALL_MNEMONICS)
}

/// Classify a mnemonic, treating exactly `calls` as call-class. Membership
/// in `calls` wins over the built-in branch and return tables.
pub fn classify_ctrl_flow_with<S: AsRef<str>>(mnemonic: &str, calls: &[S]) -> FlowClass {
    if calls.iter().any(|c| c.as_ref().eq_ignore_ascii_case(mnemonic)) {
        return FlowClass::Call;
    }
    let m = mnemonic.to_ascii_uppercase();
    match m.as_str() {
        "RET" | "RETN" | "RETF" | "RETQ" | "IRET" | "IRETD" | "IRETQ" | "SYSRET"
        | "SYSEXIT" => FlowClass::Return,
        "LJMP" => FlowClass::Branch,
        _ if m.starts_with('J') || m.starts_with("LOOP") => FlowClass::Branch,
        _ => FlowClass::Sequential,
    }
}

/// Compute metrics over an opcode table with the default call set.
pub fn compute_metrics(opcodes: &CounterTable) -> CfgMetrics {
    compute_metrics_with(opcodes, &CALL_MNEMONICS)
}

/// Compute metrics over an opcode table. Pure; an empty table yields zero
/// blocks and edges with complexity 1.0.
pub fn compute_metrics_with<S: AsRef<str>>(opcodes: &CounterTable, calls: &[S]) -> CfgMetrics {
    let mut blocks: u64 = 0;
    let mut edges: u64 = 0;
    let mut branches: u64 = 0;

    for entry in opcodes.iter() {
        let class = classify_ctrl_flow_with(&entry.key, calls);
        blocks += entry.count;
        edges += entry.count * class.edges();
        if class == FlowClass::Branch {
            branches += entry.count;
        }
    }

    let branch_density = branches as f64 / blocks.max(1) as f64;
    let cyclomatic_complexity = if blocks == 0 {
        1.0
    } else {
        (edges as f64 - blocks as f64 + 2.0).max(1.0)
    };

    CfgMetrics {
        num_blocks: blocks,
        num_edges: edges,
        branch_density,
        cyclomatic_complexity,
    }
}

/// Store the metrics for the context's opcode stream, with `calls` as the
/// call-class set.
pub fn build_cfg<S: AsRef<str>>(ctx: &mut Context, calls: &[S]) {
    ctx.cfg = compute_metrics_with(&ctx.opcodes, calls);
    debug!(
        file = %ctx.filename(),
        blocks = ctx.cfg.num_blocks,
        edges = ctx.cfg.num_edges,
        complexity = ctx.cfg.cyclomatic_complexity,
        "cfg metrics computed"
    );
}
