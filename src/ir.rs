//! JSON intermediate representation of an analyzed sample.
//!
//! The document layout is stable across runs: keys are emitted in a fixed
//! order, API and opcode records keep first-seen order, and behavior flags are
//! integers (0|1) so downstream feature extraction can use them directly.

use crate::core::context::{Behavior, CfgMetrics, Context, CounterTable};
use crate::error::{AsmIrError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Output schema version for stability tracking
pub const SCHEMA_VERSION: &str = "1.0";

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// Behavior flags as 0|1 integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorBlock {
    pub uses_network: u8,
    pub uses_fileops: u8,
    pub uses_registry: u8,
    pub uses_memory: u8,
    pub uses_injection: u8,
    pub uses_crypto: u8,
    pub uses_persist: u8,
}

impl BehaviorBlock {
    pub fn get(&self, behavior: Behavior) -> bool {
        let v = match behavior {
            Behavior::Network => self.uses_network,
            Behavior::FileOps => self.uses_fileops,
            Behavior::Registry => self.uses_registry,
            Behavior::Memory => self.uses_memory,
            Behavior::Injection => self.uses_injection,
            Behavior::Crypto => self.uses_crypto,
            Behavior::Persist => self.uses_persist,
        };
        v != 0
    }
}

/// One `{name, count}` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCount {
    pub name: String,
    pub count: u64,
}

/// The emitted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrDocument {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub filename: String,
    pub behavior: BehaviorBlock,
    pub cfg: CfgMetrics,
    pub apis: Vec<NameCount>,
    pub opcodes: Vec<NameCount>,
}

fn records(table: &CounterTable) -> Vec<NameCount> {
    table
        .iter()
        .map(|kc| NameCount {
            name: kc.key.clone(),
            count: kc.count,
        })
        .collect()
}

impl IrDocument {
    /// Snapshot a context. The context is only read.
    pub fn from_context(ctx: &Context) -> Self {
        let flag = |b: Behavior| u8::from(ctx.behavior.get(b));
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            filename: ctx.filename().to_string(),
            behavior: BehaviorBlock {
                uses_network: flag(Behavior::Network),
                uses_fileops: flag(Behavior::FileOps),
                uses_registry: flag(Behavior::Registry),
                uses_memory: flag(Behavior::Memory),
                uses_injection: flag(Behavior::Injection),
                uses_crypto: flag(Behavior::Crypto),
                uses_persist: flag(Behavior::Persist),
            },
            cfg: ctx.cfg,
            apis: records(&ctx.apis),
            opcodes: records(&ctx.opcodes),
        }
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json_string(&self) -> Result<String> {
        let mut s = serde_json::to_string_pretty(self)?;
        s.push('\n');
        Ok(s)
    }

    pub fn from_json_str(json_str: &str) -> Result<Self> {
        Ok(serde_json::from_str(json_str)?)
    }

    pub fn api_count(&self, name: &str) -> u64 {
        self.apis
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.count)
            .unwrap_or(0)
    }

    pub fn opcode_count(&self, name: &str) -> u64 {
        self.opcodes
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.count)
            .unwrap_or(0)
    }
}

fn output_error(path: &Path, source: std::io::Error) -> AsmIrError {
    AsmIrError::Output {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `bytes` to `path` atomically, creating parent directories.
///
/// The data goes to a temporary file next to the destination that is renamed
/// into place only after a successful flush, so a failed write never leaves a
/// truncated file at `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent: PathBuf = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|e| output_error(path, e))?;
    let mut tmp = NamedTempFile::new_in(&parent).map_err(|e| output_error(path, e))?;
    tmp.write_all(bytes).map_err(|e| output_error(path, e))?;
    tmp.as_file().sync_all().map_err(|e| output_error(path, e))?;
    tmp.persist(path).map_err(|e| output_error(path, e.error))?;
    debug!(path = %path.display(), bytes = bytes.len(), "file persisted");
    Ok(())
}

/// Serialize `ctx` and write it to `path`. Returns the emitted document.
pub fn write_ir_json<P: AsRef<Path>>(ctx: &Context, path: P) -> Result<IrDocument> {
    let path = path.as_ref();
    let doc = IrDocument::from_context(ctx);
    let json = doc.to_json_string()?;
    write_atomic(path, json.as_bytes())?;
    info!(path = %path.display(), "IR written");
    Ok(doc)
}
