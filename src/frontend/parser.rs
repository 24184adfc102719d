//! Line-oriented grammar for assembly dumps.
//!
//! Each line is parsed into a [`ParsedLine`] without touching the context;
//! only an accepted line is applied. A rejected line becomes a
//! [`Diagnostic`] and parsing resumes on the next line.
//!
//! Accepted shapes:
//!
//! ```text
//! line        := ε
//!              | label? PREFIX* OPCODE operand_list?
//!              | label operand_list?
//!              | operand_list
//! label       := (IDENT | NUMBER | OPCODE) ':'
//! operand_list:= operand (',' operand)*
//! ```
//!
//! A word spelled like a mnemonic is a name anywhere an opcode cannot stand,
//! so `loop:` and `loop loop` are both accepted.

use super::lexer::{is_prefix, is_reserved_operand, tokenize_line, Token, TokenKind};
use crate::config::ParserConfig;
use crate::core::context::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

const SEGMENT_REGISTERS: [&str; 6] = ["cs", "ds", "es", "fs", "gs", "ss"];

/// A rejected line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based line number
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Line accounting for one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseReport {
    pub lines_total: usize,
    pub lines_blank: usize,
    pub lines_accepted: usize,
    pub lines_rejected: usize,
    /// The first `max_diagnostics` rejections
    pub diagnostics: Vec<Diagnostic>,
    /// Rejections past the cap
    pub suppressed: usize,
}

impl ParseReport {
    /// True when the input had content but no line of it was accepted.
    pub fn is_total_failure(&self) -> bool {
        self.lines_accepted == 0 && self.lines_rejected > 0
    }
}

/// Recognized shape of an accepted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShape {
    Blank,
    Instruction,
    Label,
    LabelOperands,
    Operands,
}

/// Result of parsing one line, not yet applied to a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    pub shape: LineShape,
    pub label: Option<&'a str>,
    pub opcode: Option<&'a str>,
    /// Distinct API identifiers referenced by a call-class instruction
    pub apis: Vec<&'a str>,
}

impl<'a> ParsedLine<'a> {
    fn new(shape: LineShape) -> Self {
        Self {
            shape,
            label: None,
            opcode: None,
            apis: Vec::new(),
        }
    }
}

/// Parser for assembly text. Holds configuration only; all per-file state
/// lives in the [`Context`] passed to [`Parser::parse_source`].
#[derive(Debug, Clone)]
pub struct Parser<'c> {
    config: &'c ParserConfig,
}

impl<'c> Parser<'c> {
    pub fn new(config: &'c ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a single line.
    pub fn parse_line<'a>(&self, line: &'a str) -> Result<ParsedLine<'a>, String> {
        let tokens = tokenize_line(line).map_err(|e| e.to_string())?;
        self.parse_tokens(&tokens)
    }

    fn parse_tokens<'a>(&self, tokens: &[Token<'a>]) -> Result<ParsedLine<'a>, String> {
        if tokens.is_empty() {
            return Ok(ParsedLine::new(LineShape::Blank));
        }

        let mut label = None;
        let mut rest = tokens;
        if tokens[0].kind == TokenKind::Colon {
            return Err(format!(
                "column {}: label definition without a name",
                tokens[0].column
            ));
        }
        if tokens.len() >= 2
            && matches!(
                tokens[0].kind,
                TokenKind::Ident | TokenKind::Number | TokenKind::Opcode
            )
            && tokens[1].kind == TokenKind::Colon
        {
            label = Some(tokens[0].text);
            rest = &tokens[2..];
        }

        if rest.is_empty() {
            let mut parsed = ParsedLine::new(LineShape::Label);
            parsed.label = label;
            return Ok(parsed);
        }

        if rest[0].kind == TokenKind::Opcode {
            let mut i = 0;
            while is_prefix(rest[i].text)
                && i + 1 < rest.len()
                && rest[i + 1].kind == TokenKind::Opcode
            {
                i += 1;
            }
            let opcode = rest[i];
            let operand_tokens = as_names(&rest[i + 1..]);
            let operands = split_operands(&operand_tokens)?;
            let mut parsed = ParsedLine::new(LineShape::Instruction);
            parsed.label = label;
            parsed.opcode = Some(opcode.text);
            if self.config.is_call(opcode.text) {
                for operand in &operands {
                    for tok in operand.iter() {
                        if tok.kind == TokenKind::Ident
                            && !is_reserved_operand(tok.text)
                            && !parsed.apis.contains(&tok.text)
                        {
                            parsed.apis.push(tok.text);
                        }
                    }
                }
            }
            return Ok(parsed);
        }

        if !matches!(
            rest[0].kind,
            TokenKind::Ident
                | TokenKind::Number
                | TokenKind::Str
                | TokenKind::LBracket
                | TokenKind::Operator
        ) {
            return Err(format!(
                "column {}: unexpected '{}' at start of statement",
                rest[0].column, rest[0].text
            ));
        }
        split_operands(&as_names(rest))?;
        let mut parsed = ParsedLine::new(if label.is_some() {
            LineShape::LabelOperands
        } else {
            LineShape::Operands
        });
        parsed.label = label;
        Ok(parsed)
    }

    /// Parse every line of `source` into `ctx`, recovering from bad lines.
    pub fn parse_source(&self, source: &str, ctx: &mut Context) -> ParseReport {
        let mut report = ParseReport::default();
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);

        for (idx, line) in source.lines().enumerate() {
            report.lines_total += 1;
            match self.parse_line(line) {
                Ok(parsed) => {
                    if parsed.shape == LineShape::Blank {
                        report.lines_blank += 1;
                        continue;
                    }
                    report.lines_accepted += 1;
                    if let Some(op) = parsed.opcode {
                        ctx.add_opcode(op);
                    }
                    for api in &parsed.apis {
                        ctx.add_api(api);
                    }
                }
                Err(message) => {
                    report.lines_rejected += 1;
                    let diag = Diagnostic {
                        line: idx + 1,
                        message,
                    };
                    self.record(&mut report, diag, ctx.filename());
                }
            }
        }

        if report.suppressed > 0 {
            info!(
                file = %ctx.filename(),
                suppressed = report.suppressed,
                "additional malformed lines were skipped without diagnostics"
            );
        }
        debug!(
            file = %ctx.filename(),
            total = report.lines_total,
            accepted = report.lines_accepted,
            rejected = report.lines_rejected,
            "parse finished"
        );
        report
    }

    fn record(&self, report: &mut ParseReport, diag: Diagnostic, filename: &str) {
        if report.diagnostics.len() < self.config.max_diagnostics {
            warn!(file = %filename, line = diag.line, "skipping line: {}", diag.message);
            report.diagnostics.push(diag);
        } else {
            if report.suppressed == 0 {
                warn!(
                    file = %filename,
                    cap = self.config.max_diagnostics,
                    "diagnostic limit reached; further malformed lines are skipped silently"
                );
            }
            report.suppressed += 1;
        }
    }
}

/// Parse `source` into `ctx` with the given configuration.
pub fn parse_source(source: &str, ctx: &mut Context, config: &ParserConfig) -> ParseReport {
    Parser::new(config).parse_source(source, ctx)
}

/// Operand tokens with mnemonic-spelled words demoted to identifiers.
fn as_names<'a>(tokens: &[Token<'a>]) -> Vec<Token<'a>> {
    tokens
        .iter()
        .map(|t| match t.kind {
            TokenKind::Opcode => Token {
                kind: TokenKind::Ident,
                ..*t
            },
            _ => *t,
        })
        .collect()
}

/// Split an operand list on top-level commas and validate each operand.
fn split_operands<'t, 'a>(tokens: &'t [Token<'a>]) -> Result<Vec<&'t [Token<'a>]>, String> {
    let mut operands = Vec::new();
    if tokens.is_empty() {
        return Ok(operands);
    }
    let mut start = 0;
    for (i, tok) in tokens.iter().enumerate() {
        if tok.kind == TokenKind::Comma {
            if i == start {
                return Err(format!("column {}: empty operand before ','", tok.column));
            }
            operands.push(&tokens[start..i]);
            start = i + 1;
        }
    }
    if start == tokens.len() {
        let last = tokens[tokens.len() - 1];
        return Err(format!("column {}: trailing ','", last.column));
    }
    operands.push(&tokens[start..]);
    for operand in &operands {
        validate_operand(operand)?;
    }
    Ok(operands)
}

fn validate_operand(tokens: &[Token<'_>]) -> Result<(), String> {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate() {
        let next = tokens.get(i + 1);
        match tok.kind {
            TokenKind::LBracket => {
                if depth > 0 {
                    return Err(format!("column {}: nested '['", tok.column));
                }
                depth += 1;
            }
            TokenKind::RBracket => {
                if depth == 0 {
                    return Err(format!("column {}: unmatched ']'", tok.column));
                }
                depth -= 1;
            }
            TokenKind::Colon => {
                let after_segment = i > 0
                    && tokens[i - 1].kind == TokenKind::Ident
                    && SEGMENT_REGISTERS
                        .iter()
                        .any(|s| s.eq_ignore_ascii_case(tokens[i - 1].text));
                if !after_segment || next.is_none() {
                    return Err(format!("column {}: unexpected ':'", tok.column));
                }
            }
            TokenKind::Operator => {
                if matches!(next.map(|t| t.kind), None | Some(TokenKind::RBracket)) {
                    return Err(format!(
                        "column {}: operator '{}' without right operand",
                        tok.column, tok.text
                    ));
                }
            }
            TokenKind::Ident
            | TokenKind::Opcode
            | TokenKind::Number
            | TokenKind::Str
            | TokenKind::Comma => {}
        }
    }
    if depth != 0 {
        return Err("unclosed '['".to_string());
    }
    Ok(())
}
