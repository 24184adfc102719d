//! End-to-end analysis of one assembly listing.
//!
//! `read → parse → classify → cfg → serialize`, synchronously, with a fresh
//! [`Context`] per call. Nothing is shared between calls, so callers may run
//! many files in parallel.

use crate::analysis::cfg::build_cfg;
use crate::analysis::semantic::{ClassificationReport, SemanticClassifier};
use crate::config::AnalyzerConfig;
use crate::core::context::{Behavior, Context};
use crate::error::{AsmIrError, Result};
use crate::frontend::parser::{ParseReport, Parser};
use crate::io::read_source;
use crate::ir::{write_ir_json, IrDocument};
use crate::{log_error, span_trace};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default destination when no output path is given.
pub const DEFAULT_OUTPUT: &str = "output/sample_ir.json";

/// In-memory result of analyzing one listing.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub context: Context,
    pub parse: ParseReport,
    pub classification: ClassificationReport,
}

/// Parse, classify and measure `source`. Does no I/O.
pub fn analyze_source(filename: &str, source: &str, config: &AnalyzerConfig) -> Result<Analysis> {
    let classifier = SemanticClassifier::new(&config.classifier)?
        .with_call_mnemonics(&config.parser.call_mnemonics);
    let mut context = Context::new(filename);

    let parse = Parser::new(&config.parser).parse_source(source, &mut context);
    info!(
        file = %filename,
        opcodes = context.opcodes.len(),
        apis = context.apis.len(),
        rejected = parse.lines_rejected,
        "parsing finished"
    );

    let classification = classifier.classify(&mut context);
    build_cfg(&mut context, &config.parser.call_mnemonics);

    Ok(Analysis {
        context,
        parse,
        classification,
    })
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub input_sha256: String,
    pub parse: ParseReport,
    pub classification: ClassificationReport,
    pub document: IrDocument,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analysis summary for {}", self.input.display())?;
        writeln!(f, "  SHA-256               : {}", self.input_sha256)?;
        writeln!(
            f,
            "  Lines                 : {} total, {} accepted, {} rejected",
            self.parse.lines_total, self.parse.lines_accepted, self.parse.lines_rejected
        )?;
        writeln!(
            f,
            "  Distinct opcodes/APIs : {}/{}",
            self.document.opcodes.len(),
            self.document.apis.len()
        )?;
        for b in Behavior::ALL {
            let yes = if self.document.behavior.get(b) { "YES" } else { "NO" };
            writeln!(f, "  {:<22}: {}", b.label(), yes)?;
        }
        if self.classification.fallback_used {
            writeln!(f, "  (opcode-statistics fallback applied)")?;
        }
        writeln!(
            f,
            "  CFG blocks/edges      : {}/{}",
            self.document.cfg.num_blocks, self.document.cfg.num_edges
        )?;
        writeln!(
            f,
            "  CFG complexity        : {:.2}",
            self.document.cfg.cyclomatic_complexity
        )?;
        writeln!(
            f,
            "  Branch density        : {:.4}",
            self.document.cfg.branch_density
        )?;
        write!(f, "  IR written to         : {}", self.output.display())
    }
}

/// Analyze the listing at `input` and write its IR to `output`.
///
/// Fails without writing anything when the input cannot be read, is not
/// text, or has no parseable line at all.
pub fn run(input: &Path, output: &Path, config: &AnalyzerConfig) -> Result<RunSummary> {
    let span = span_trace!("analyze", input = %input.display());
    let _guard = span.enter();

    let source = read_source(input, &config.io)?;
    let filename = input.display().to_string();
    let analysis = analyze_source(&filename, &source.text, config)?;

    if analysis.parse.is_total_failure() {
        return Err(log_error!(
            AsmIrError::ParseFailed {
                rejected: analysis.parse.lines_rejected,
            },
            filename.as_str()
        ));
    }

    let document = write_ir_json(&analysis.context, output)?;
    let raised: Vec<&str> = analysis
        .context
        .behavior
        .raised()
        .iter()
        .map(|b| b.as_str())
        .collect();
    info!(
        file = %filename,
        sha256 = %source.sha256,
        behaviors = ?raised,
        complexity = document.cfg.cyclomatic_complexity,
        output = %output.display(),
        "analysis complete"
    );

    Ok(RunSummary {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        input_sha256: source.sha256,
        parse: analysis.parse,
        classification: analysis.classification,
        document,
    })
}
