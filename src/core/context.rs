//! Per-file analysis context.
//!
//! A [`Context`] is created for one input file, filled by the parser, then
//! updated by the semantic classifier and the CFG builder before it is
//! serialized. Nothing in it is shared across files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One distinct key (opcode or API name) with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCount {
    pub key: String,
    pub count: u64,
}

/// Insertion-ordered counter with O(1) upsert.
///
/// Keys are unique and never empty; counts start at 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterTable {
    index: HashMap<String, usize>,
    entries: Vec<KeyCount>,
}

impl CounterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment `key`, inserting it with count 1 when unseen.
    /// Empty keys are ignored. Returns the new count.
    pub fn upsert(&mut self, key: &str) -> u64 {
        if key.is_empty() {
            return 0;
        }
        if let Some(&i) = self.index.get(key) {
            self.entries[i].count += 1;
            return self.entries[i].count;
        }
        self.index.insert(key.to_string(), self.entries.len());
        self.entries.push(KeyCount {
            key: key.to_string(),
            count: 1,
        });
        1
    }

    /// Count for `key`, 0 when absent.
    pub fn get(&self, key: &str) -> u64 {
        self.index
            .get(key)
            .map(|&i| self.entries[i].count)
            .unwrap_or(0)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &KeyCount> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }
}

/// Behavior category inferred for a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behavior {
    Network,
    FileOps,
    Registry,
    Memory,
    Injection,
    Crypto,
    Persist,
}

impl Behavior {
    pub const ALL: [Behavior; 7] = [
        Behavior::Network,
        Behavior::FileOps,
        Behavior::Registry,
        Behavior::Memory,
        Behavior::Injection,
        Behavior::Crypto,
        Behavior::Persist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::Network => "network",
            Behavior::FileOps => "fileops",
            Behavior::Registry => "registry",
            Behavior::Memory => "memory",
            Behavior::Injection => "injection",
            Behavior::Crypto => "crypto",
            Behavior::Persist => "persist",
        }
    }

    /// Human-readable label used in run summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Behavior::Network => "Network Operations",
            Behavior::FileOps => "File Operations",
            Behavior::Registry => "Registry Operations",
            Behavior::Memory => "Memory Operations",
            Behavior::Injection => "Code Injection",
            Behavior::Crypto => "Cryptography",
            Behavior::Persist => "Persistence",
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seven monotonic behavior flags. Flags can be raised but never cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorFlags {
    network: bool,
    fileops: bool,
    registry: bool,
    memory: bool,
    injection: bool,
    crypto: bool,
    persist: bool,
}

impl BehaviorFlags {
    /// Raise a flag. Returns true when the flag was previously unset.
    pub fn raise(&mut self, behavior: Behavior) -> bool {
        let slot = match behavior {
            Behavior::Network => &mut self.network,
            Behavior::FileOps => &mut self.fileops,
            Behavior::Registry => &mut self.registry,
            Behavior::Memory => &mut self.memory,
            Behavior::Injection => &mut self.injection,
            Behavior::Crypto => &mut self.crypto,
            Behavior::Persist => &mut self.persist,
        };
        let was_unset = !*slot;
        *slot = true;
        was_unset
    }

    pub fn get(&self, behavior: Behavior) -> bool {
        match behavior {
            Behavior::Network => self.network,
            Behavior::FileOps => self.fileops,
            Behavior::Registry => self.registry,
            Behavior::Memory => self.memory,
            Behavior::Injection => self.injection,
            Behavior::Crypto => self.crypto,
            Behavior::Persist => self.persist,
        }
    }

    /// Raised flags in canonical order.
    pub fn raised(&self) -> Vec<Behavior> {
        Behavior::ALL
            .into_iter()
            .filter(|b| self.get(*b))
            .collect()
    }

    pub fn any(&self) -> bool {
        Behavior::ALL.iter().any(|b| self.get(*b))
    }
}

/// Approximate control-flow metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CfgMetrics {
    pub num_blocks: u64,
    pub num_edges: u64,
    pub branch_density: f64,
    pub cyclomatic_complexity: f64,
}

/// Analysis state for a single input file.
#[derive(Debug, Clone)]
pub struct Context {
    filename: String,
    pub apis: CounterTable,
    pub opcodes: CounterTable,
    pub behavior: BehaviorFlags,
    pub cfg: CfgMetrics,
}

impl Context {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            apis: CounterTable::new(),
            opcodes: CounterTable::new(),
            behavior: BehaviorFlags::default(),
            cfg: CfgMetrics::default(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Record one API reference, preserving its spelling.
    pub fn add_api(&mut self, name: &str) -> u64 {
        self.apis.upsert(name)
    }

    /// Record one opcode occurrence; mnemonics are stored upper-cased.
    pub fn add_opcode(&mut self, mnemonic: &str) -> u64 {
        self.opcodes.upsert(&mnemonic.to_ascii_uppercase())
    }
}
