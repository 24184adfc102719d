//! Configuration for the analysis pipeline.
//!
//! Provides centralized configuration for every stage with the defaults the
//! corpus was tuned on. All heuristic thresholds live here rather than in the
//! stages themselves. A JSON file only needs to name the fields it overrides.

use crate::analysis::cfg::CALL_MNEMONICS;
use crate::core::context::Behavior;
use crate::error::{AsmIrError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Master configuration for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Input reading limits.
    pub io: IOConfig,
    /// Grammar parser configuration.
    pub parser: ParserConfig,
    /// Semantic classifier configuration.
    pub classifier: ClassifierConfig,
}

impl AnalyzerConfig {
    /// Load a configuration from a JSON file, falling back to defaults for
    /// anything the file does not mention.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AsmIrError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let cfg: AnalyzerConfig =
            serde_json::from_str(text).map_err(|e| AsmIrError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        if self.io.max_file_size == 0 {
            return Err(AsmIrError::Config("io.max_file_size must be > 0".into()));
        }
        if self.parser.call_mnemonics.iter().all(|m| m.trim().is_empty()) {
            return Err(AsmIrError::Config(
                "parser.call_mnemonics must name at least one mnemonic".into(),
            ));
        }
        for (behavior, words) in self.classifier.keywords.iter() {
            if words.iter().any(|w| w.is_empty()) {
                return Err(AsmIrError::Config(format!(
                    "classifier.keywords.{} contains an empty keyword",
                    behavior.as_str()
                )));
            }
        }
        self.classifier.fallback.validate()
    }
}

/// I/O configuration for input reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IOConfig {
    /// Maximum input size in bytes (default: 104857600 = 100MB).
    pub max_file_size: u64,
    /// Prefix inspected for NUL bytes to reject binaries (default: 1024).
    pub binary_sniff_size: usize,
}

impl Default for IOConfig {
    fn default() -> Self {
        Self {
            max_file_size: 104857600, // 100MB
            binary_sniff_size: 1024,
        }
    }
}

/// Grammar parser configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum number of per-line diagnostics kept and logged (default: 10).
    pub max_diagnostics: usize,
    /// Call-class mnemonics. Their identifier operands are recorded as API
    /// references, and the CFG metrics and the classifier fallback count them
    /// as calls.
    pub call_mnemonics: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_diagnostics: 10,
            call_mnemonics: CALL_MNEMONICS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ParserConfig {
    /// Whether an upper-cased mnemonic is call-class.
    pub fn is_call(&self, mnemonic: &str) -> bool {
        self.call_mnemonics
            .iter()
            .any(|m| m.eq_ignore_ascii_case(mnemonic))
    }
}

/// Semantic classifier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// API keys shorter than this are never matched (default: 4).
    pub min_api_length: usize,
    /// Fewer recognizable API names than this triggers the fallback (default: 5).
    pub min_recognized_apis: usize,
    /// Disassembler placeholder prefixes that do not count as API names.
    pub placeholder_prefixes: Vec<String>,
    /// Keyword sets per behavior category.
    pub keywords: CategoryKeywords,
    /// Opcode/CFG thresholds for stripped samples.
    pub fallback: FallbackThresholds,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_api_length: 4,
            min_recognized_apis: 5,
            placeholder_prefixes: strings(&[
                "sub_", "loc_", "locret_", "nullsub_", "j_", "unk_", "off_", "dword_", "byte_",
                "word_", "qword_", "var_", "arg_",
            ]),
            keywords: CategoryKeywords::default(),
            fallback: FallbackThresholds::default(),
        }
    }
}

/// Case-insensitive substring keywords per behavior category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryKeywords {
    pub network: Vec<String>,
    pub fileops: Vec<String>,
    pub registry: Vec<String>,
    pub memory: Vec<String>,
    pub injection: Vec<String>,
    pub crypto: Vec<String>,
    pub persist: Vec<String>,
}

impl Default for CategoryKeywords {
    fn default() -> Self {
        Self {
            network: strings(&[
                "internet", "http", "socket", "connect", "send", "recv", "wsa", "url", "download",
            ]),
            fileops: strings(&["file", "read", "write", "delete", "copy", "move"]),
            registry: strings(&["reg", "key"]),
            memory: strings(&["alloc", "virtual", "heap"]),
            injection: strings(&["thread", "remote", "hook"]),
            crypto: strings(&["crypt", "encrypt", "decrypt", "hash"]),
            persist: strings(&["service", "startup", "execute", "create"]),
        }
    }
}

impl CategoryKeywords {
    /// Keyword sets paired with the flag they set, in output order.
    pub fn iter(&self) -> impl Iterator<Item = (Behavior, &Vec<String>)> {
        [
            (Behavior::Network, &self.network),
            (Behavior::FileOps, &self.fileops),
            (Behavior::Registry, &self.registry),
            (Behavior::Memory, &self.memory),
            (Behavior::Injection, &self.injection),
            (Behavior::Crypto, &self.crypto),
            (Behavior::Persist, &self.persist),
        ]
        .into_iter()
    }
}

/// Thresholds for the opcode-statistics fallback.
///
/// These were tuned by hand on a small corpus and trade precision for recall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackThresholds {
    /// XOR count above this sets crypto (default: 20).
    pub xor_crypto: u64,
    /// CALL count above this, together with `complexity_network`, sets network (default: 10).
    pub call_network: u64,
    /// Complexity above this, together with `call_network`, sets network (default: 50).
    pub complexity_network: f64,
    /// Complexity above this sets injection (default: 100).
    pub complexity_injection: f64,
    /// Complexity above this sets memory (default: 150).
    pub complexity_memory: f64,
    /// Branch density above this, together with `call_persist`, sets network and persist (default: 0.5).
    pub branch_density_persist: f64,
    /// CALL count above this, together with `branch_density_persist` (default: 20).
    pub call_persist: u64,
}

impl Default for FallbackThresholds {
    fn default() -> Self {
        Self {
            xor_crypto: 20,
            call_network: 10,
            complexity_network: 50.0,
            complexity_injection: 100.0,
            complexity_memory: 150.0,
            branch_density_persist: 0.5,
            call_persist: 20,
        }
    }
}

impl FallbackThresholds {
    fn validate(&self) -> Result<()> {
        let floats = [
            ("complexity_network", self.complexity_network),
            ("complexity_injection", self.complexity_injection),
            ("complexity_memory", self.complexity_memory),
            ("branch_density_persist", self.branch_density_persist),
        ];
        for (name, v) in floats {
            if !v.is_finite() || v < 0.0 {
                return Err(AsmIrError::Config(format!(
                    "classifier.fallback.{} must be a finite non-negative number",
                    name
                )));
            }
        }
        Ok(())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
