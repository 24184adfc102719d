//! Behavior inference from API names, with an opcode-statistics fallback.
//!
//! Name-based matching runs first: every recorded API key that is long enough
//! and is not a bare hex address is matched case-insensitively against the
//! keyword set of each category. When a sample has too few recognizable API
//! names (typically a stripped binary), coarse thresholds over opcode counts
//! and the approximate CFG metrics raise additional flags.

use super::cfg::{classify_ctrl_flow_with, compute_metrics_with, FlowClass, CALL_MNEMONICS};
use crate::config::ClassifierConfig;
use crate::core::context::{Behavior, Context};
use crate::error::{AsmIrError, Result};
use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

static RE_HEX_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:0x)?[0-9a-f]+h?$").expect("valid hex address regex"));

/// Whether a key is a bare hexadecimal address such as `0x401000`,
/// `401000h` or `DEADBEEF`.
pub fn is_hex_address(key: &str) -> bool {
    if !RE_HEX_ADDRESS.is_match(key) {
        return false;
    }
    let lower = key.to_ascii_lowercase();
    lower.starts_with("0x")
        || lower.chars().any(|c| c.is_ascii_digit())
        || lower.len() >= 8
}

/// Reduce a decorated symbol to a comparable base name.
/// - Strips a module qualifier (`kernel32!`, `kernel32.dll.`)
/// - Strips import thunk prefixes (`__imp_`, `_imp__`) and leading underscores
/// - Strips stdcall suffix like `@N`
/// - Strips ANSI/Wide suffix `A`/`W` when present (CreateFileA/W)
pub fn normalize_api_name(name: &str) -> String {
    let mut s = name.trim();
    if let Some(bang) = s.rfind('!') {
        s = &s[bang + 1..];
    }
    if let Some(dot) = s.rfind('.') {
        if dot + 1 < s.len() {
            s = &s[dot + 1..];
        }
    }
    for prefix in ["__imp_", "_imp__", "__imp__"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest;
        }
    }
    s = s.trim_start_matches('_');
    if let Some(at) = s.rfind('@') {
        if at + 1 < s.len() && s[at + 1..].chars().all(|c| c.is_ascii_digit()) {
            s = &s[..at];
        }
    }
    if let Some(last) = s.chars().last() {
        if (last == 'A' || last == 'W') && s.len() > 1 {
            let pen = s[..s.len() - 1].chars().last().unwrap_or('a');
            if pen.is_ascii_lowercase() {
                s = &s[..s.len() - 1];
            }
        }
    }
    s.to_ascii_lowercase()
}

/// Why a flag was raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Evidence {
    /// API key whose name matched a category keyword
    Api { name: String, keyword: String },
    /// Fallback rule that fired
    Fallback { rule: String },
}

/// Outcome of one classification pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Distinct API keys that count as real API names
    pub recognized_apis: usize,
    /// Whether the opcode-statistics fallback ran
    pub fallback_used: bool,
    /// First piece of evidence for each newly raised flag, in raise order
    pub evidence: Vec<(Behavior, Evidence)>,
}

impl ClassificationReport {
    fn note(&mut self, ctx: &mut Context, behavior: Behavior, evidence: Evidence) {
        if ctx.behavior.raise(behavior) {
            debug!(file = %ctx.filename(), flag = %behavior, ?evidence, "behavior flag raised");
            self.evidence.push((behavior, evidence));
        }
    }
}

/// Keyword matcher built from a [`ClassifierConfig`].
pub struct SemanticClassifier<'c> {
    config: &'c ClassifierConfig,
    matchers: Vec<(Behavior, AhoCorasick, &'c [String])>,
    call_mnemonics: Vec<String>,
}

impl<'c> SemanticClassifier<'c> {
    pub fn new(config: &'c ClassifierConfig) -> Result<Self> {
        let mut matchers = Vec::new();
        for (behavior, words) in config.keywords.iter() {
            if words.is_empty() {
                continue;
            }
            let ac = AhoCorasick::builder()
                .ascii_case_insensitive(true)
                .build(words)
                .map_err(|e| {
                    AsmIrError::Config(format!("keywords for {}: {}", behavior.as_str(), e))
                })?;
            matchers.push((behavior, ac, words.as_slice()));
        }
        Ok(Self {
            config,
            matchers,
            call_mnemonics: CALL_MNEMONICS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Use `calls` as the call-class set for the fallback's call count and
    /// complexity.
    pub fn with_call_mnemonics(mut self, calls: &[String]) -> Self {
        self.call_mnemonics = calls.to_vec();
        self
    }

    /// Whether a key passes the length and hex-address gate for matching.
    pub fn is_matchable(&self, key: &str) -> bool {
        key.chars().count() >= self.config.min_api_length && !is_hex_address(key)
    }

    /// Whether a key counts toward the fallback trigger: matchable and not a
    /// disassembler-generated placeholder such as `sub_401000`.
    pub fn is_recognizable(&self, key: &str) -> bool {
        if !self.is_matchable(key) {
            return false;
        }
        let base = normalize_api_name(key);
        !self
            .config
            .placeholder_prefixes
            .iter()
            .any(|p| base.starts_with(&p.to_ascii_lowercase()))
    }

    /// Categories whose keywords occur in `key`, with the keyword that hit.
    pub fn match_key(&self, key: &str) -> Vec<(Behavior, &'c str)> {
        let mut hits = Vec::new();
        for (behavior, ac, words) in &self.matchers {
            let words: &'c [String] = words;
            if let Some(m) = ac.find(key) {
                hits.push((*behavior, words[m.pattern().as_usize()].as_str()));
            }
        }
        hits
    }

    /// Raise behavior flags on `ctx`. Never fails and never clears a flag.
    pub fn classify(&self, ctx: &mut Context) -> ClassificationReport {
        let mut report = ClassificationReport::default();

        let keys: Vec<String> = ctx.apis.keys().map(str::to_string).collect();
        for key in &keys {
            if self.is_recognizable(key) {
                report.recognized_apis += 1;
            }
            if !self.is_matchable(key) {
                continue;
            }
            for (behavior, keyword) in self.match_key(key) {
                report.note(
                    ctx,
                    behavior,
                    Evidence::Api {
                        name: key.clone(),
                        keyword: keyword.to_string(),
                    },
                );
            }
        }

        if report.recognized_apis < self.config.min_recognized_apis {
            report.fallback_used = true;
            info!(
                file = %ctx.filename(),
                recognized = report.recognized_apis,
                "few API names; applying opcode-statistics fallback"
            );
            self.apply_fallback(ctx, &mut report);
        }

        report
    }

    fn apply_fallback(&self, ctx: &mut Context, report: &mut ClassificationReport) {
        let t = &self.config.fallback;
        let metrics = compute_metrics_with(&ctx.opcodes, &self.call_mnemonics);
        let xor = ctx.opcodes.get("XOR");
        let calls: u64 = ctx
            .opcodes
            .iter()
            .filter(|e| classify_ctrl_flow_with(&e.key, &self.call_mnemonics) == FlowClass::Call)
            .map(|e| e.count)
            .sum();
        let cc = metrics.cyclomatic_complexity;
        let density = metrics.branch_density;

        let mut fired: Vec<(Behavior, String)> = Vec::new();
        if xor > t.xor_crypto {
            fired.push((Behavior::Crypto, format!("xor count {} > {}", xor, t.xor_crypto)));
        }
        if calls > t.call_network && cc > t.complexity_network {
            fired.push((
                Behavior::Network,
                format!(
                    "call count {} > {} and complexity {} > {}",
                    calls, t.call_network, cc, t.complexity_network
                ),
            ));
        }
        if cc > t.complexity_injection {
            fired.push((
                Behavior::Injection,
                format!("complexity {} > {}", cc, t.complexity_injection),
            ));
        }
        if cc > t.complexity_memory {
            fired.push((
                Behavior::Memory,
                format!("complexity {} > {}", cc, t.complexity_memory),
            ));
        }
        if density > t.branch_density_persist && calls > t.call_persist {
            let rule = format!(
                "branch density {:.4} > {} and call count {} > {}",
                density, t.branch_density_persist, calls, t.call_persist
            );
            fired.push((Behavior::Network, rule.clone()));
            fired.push((Behavior::Persist, rule));
        }

        for (behavior, rule) in fired {
            report.note(ctx, behavior, Evidence::Fallback { rule });
        }
    }
}

/// Run the classifier with `config` over `ctx`.
pub fn semantic_analyze(ctx: &mut Context, config: &ClassifierConfig) -> Result<ClassificationReport> {
    Ok(SemanticClassifier::new(config)?.classify(ctx))
}
