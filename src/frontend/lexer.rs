//! Line tokenizer for Intel-syntax assembly dumps.
//!
//! Each line is tokenized on its own. Words are classified as opcodes when
//! they name a known x86/x64 mnemonic (or instruction prefix), identifiers
//! otherwise. Register and size/segment keywords stay identifiers; the parser
//! asks [`is_reserved_operand`] to keep them out of the API table.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Known instruction mnemonic or prefix
    Opcode,
    /// Any other word: labels, symbols, API names, registers, keywords
    Ident,
    /// Decimal, `0x`-hex or `h`-suffixed hex literal
    Number,
    /// Quoted string literal in data lines
    Str,
    Comma,
    Colon,
    LBracket,
    RBracket,
    /// `+`, `-` or `*` inside operand expressions
    Operator,
}

/// A lexed token borrowing its text from the source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// 1-based column of the first character
    pub column: usize,
}

/// Tokenization failure for a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub column: usize,
    pub message: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "column {}: {}", self.column, self.message)
    }
}

impl std::error::Error for LexError {}

static RE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:0[xX][0-9A-Fa-f]+|[0-9][0-9A-Fa-f]*[hH]|[0-9]+)$").expect("valid number regex")
});

/// Instruction prefixes; the mnemonic that follows is the counted opcode.
static PREFIXES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["rep", "repe", "repne", "repz", "repnz", "lock"]
        .into_iter()
        .collect()
});

static MNEMONICS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set: HashSet<&'static str> = [
        // Data movement
        "mov", "movzx", "movsx", "movsxd", "movabs", "lea", "xchg", "cmpxchg", "xadd",
        "push", "pop", "pushad", "popad", "pusha", "popa", "pushfd", "popfd", "pushfq",
        "popfq", "pushf", "popf", "bswap", "cbw", "cwde", "cdqe", "cwd", "cdq", "cqo",
        "lahf", "sahf", "movd", "movq", "movaps", "movups", "movdqa", "movdqu", "movss",
        "movsd", "movapd", "movupd",
        // Arithmetic and logic
        "add", "adc", "sub", "sbb", "inc", "dec", "neg", "mul", "imul", "div", "idiv",
        "and", "or", "xor", "not", "test", "cmp", "shl", "shr", "sal", "sar", "rol",
        "ror", "rcl", "rcr", "shld", "shrd", "bt", "bts", "btr", "btc", "bsf", "bsr",
        "popcnt", "lzcnt", "tzcnt", "pxor", "xorps", "xorpd", "andps", "andpd", "orps",
        "paddd", "psubd", "pand", "por", "pshufd", "aesenc", "aesenclast", "aesdec",
        "aesdeclast", "pclmulqdq", "crc32",
        // Control transfer
        "call", "callq", "calll", "lcall", "ret", "retn", "retf", "retq", "iret", "iretd",
        "iretq", "jmp", "jmpq", "ljmp", "loop", "loope", "loopne", "loopz", "loopnz",
        "jcxz", "jecxz", "jrcxz", "int", "int3", "into", "syscall", "sysenter", "sysexit",
        "sysret", "enter", "leave",
        // Strings
        "movsb", "movsw", "movsq", "stosb", "stosw", "stosd", "stosq", "lodsb", "lodsw",
        "lodsd", "lodsq", "scasb", "scasw", "scasd", "scasq", "cmpsb", "cmpsw", "cmpsd",
        "cmpsq", "movs", "stos", "lods", "scas", "cmps",
        // Flags and misc
        "nop", "hlt", "clc", "stc", "cmc", "cld", "std", "cli", "sti", "cpuid", "rdtsc",
        "rdtscp", "pause", "ud2", "wait", "fwait", "in", "out", "insb", "outsb", "xlat",
        "xlatb", "endbr32", "endbr64", "fld", "fst", "fstp", "fild", "fistp", "fadd",
        "fsub", "fmul", "fdiv", "fxch", "fldz", "fld1",
    ]
    .into_iter()
    .collect();
    set.extend(JCC.iter().copied());
    set.extend(CMOVCC.iter().copied());
    set.extend(SETCC.iter().copied());
    set.extend(PREFIXES.iter().copied());
    set
});

const JCC: &[&str] = &[
    "ja", "jae", "jb", "jbe", "jc", "je", "jg", "jge", "jl", "jle", "jna", "jnae", "jnb",
    "jnbe", "jnc", "jne", "jng", "jnge", "jnl", "jnle", "jno", "jnp", "jns", "jnz", "jo",
    "jp", "jpe", "jpo", "js", "jz",
];

const CMOVCC: &[&str] = &[
    "cmova", "cmovae", "cmovb", "cmovbe", "cmovc", "cmove", "cmovg", "cmovge", "cmovl",
    "cmovle", "cmovna", "cmovnae", "cmovnb", "cmovnbe", "cmovnc", "cmovne", "cmovng",
    "cmovnge", "cmovnl", "cmovnle", "cmovno", "cmovnp", "cmovns", "cmovnz", "cmovo",
    "cmovp", "cmovpe", "cmovpo", "cmovs", "cmovz",
];

const SETCC: &[&str] = &[
    "seta", "setae", "setb", "setbe", "setc", "sete", "setg", "setge", "setl", "setle",
    "setna", "setnae", "setnb", "setnbe", "setnc", "setne", "setng", "setnge", "setnl",
    "setnle", "setno", "setnp", "setns", "setnz", "seto", "setp", "setpe", "setpo", "sets",
    "setz",
];

static RESERVED_OPERANDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set: HashSet<&'static str> = [
        // 64/32/16/8-bit general purpose
        "rax", "rbx", "rcx", "rdx", "rsi", "rdi", "rbp", "rsp", "eax", "ebx", "ecx", "edx",
        "esi", "edi", "ebp", "esp", "ax", "bx", "cx", "dx", "si", "di", "bp", "sp", "al",
        "ah", "bl", "bh", "cl", "ch", "dl", "dh", "sil", "dil", "bpl", "spl",
        // Instruction pointers
        "rip", "eip", "ip",
        // Segment registers
        "cs", "ds", "es", "fs", "gs", "ss",
        // Control/debug
        "cr0", "cr2", "cr3", "cr4", "cr8", "dr0", "dr1", "dr2", "dr3", "dr6", "dr7",
        // x87 stack
        "st", "st0", "st1", "st2", "st3", "st4", "st5", "st6", "st7",
        // Size and operand keywords
        "byte", "word", "dword", "qword", "tbyte", "tword", "fword", "oword", "xmmword",
        "ymmword", "zmmword", "ptr", "short", "near", "far", "offset", "large", "small",
        "flat", "rel", "dup",
    ]
    .into_iter()
    .collect();
    // r8..r15 with their sub-register suffixes
    for r in [
        "r8", "r9", "r10", "r11", "r12", "r13", "r14", "r15", "r8d", "r9d", "r10d", "r11d",
        "r12d", "r13d", "r14d", "r15d", "r8w", "r9w", "r10w", "r11w", "r12w", "r13w", "r14w",
        "r15w", "r8b", "r9b", "r10b", "r11b", "r12b", "r13b", "r14b", "r15b", "r8l", "r9l",
        "r10l", "r11l", "r12l", "r13l", "r14l", "r15l",
    ] {
        set.insert(r);
    }
    set
});

static RE_VECTOR_REG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:[xyz]mm[0-9]{1,2}|mm[0-7]|k[0-7])$").expect("valid vector register regex")
});

/// Whether a word is a known mnemonic or prefix (case-insensitive).
pub fn is_mnemonic(word: &str) -> bool {
    MNEMONICS.contains(word.to_ascii_lowercase().as_str())
}

/// Whether a word is an instruction prefix such as `REP` or `LOCK`.
pub fn is_prefix(word: &str) -> bool {
    PREFIXES.contains(word.to_ascii_lowercase().as_str())
}

/// Whether an identifier is a register name or size/segment keyword.
pub fn is_reserved_operand(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    RESERVED_OPERANDS.contains(lower.as_str()) || RE_VECTOR_REG.is_match(&lower)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '_' | '.' | '$' | '?' | '@')
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$' | '?' | '@' | '!')
}

/// Strip a trailing `;` or `#` comment. Either character inside a quoted
/// literal is text, not a comment start. An unterminated quote keeps the rest
/// of the line so the tokenizer can report it.
pub fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == ';' || c == '#' => return &line[..i],
            None => {}
        }
    }
    line
}

/// Tokenize one source line (comments are removed first).
///
/// Runs in time linear in the line length; columns are tracked as characters
/// are consumed.
pub fn tokenize_line(line: &str) -> Result<Vec<Token<'_>>, LexError> {
    let src = strip_comment(line);
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();
    // 1-based column of the next unconsumed character
    let mut col = 1usize;

    while let Some(&(start, c)) = chars.peek() {
        let column = col;
        if c.is_whitespace() {
            chars.next();
            col += 1;
            continue;
        }
        let single = match c {
            ',' => Some(TokenKind::Comma),
            ':' => Some(TokenKind::Colon),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            '+' | '-' | '*' => Some(TokenKind::Operator),
            _ => None,
        };
        if let Some(kind) = single {
            chars.next();
            col += 1;
            tokens.push(Token {
                kind,
                text: &src[start..start + c.len_utf8()],
                column,
            });
            continue;
        }

        if c == '\'' || c == '"' {
            chars.next();
            col += 1;
            let mut end = None;
            for (i, ch) in chars.by_ref() {
                col += 1;
                if ch == c {
                    end = Some(i);
                    break;
                }
            }
            let Some(end) = end else {
                return Err(LexError {
                    column,
                    message: "unterminated string literal".to_string(),
                });
            };
            tokens.push(Token {
                kind: TokenKind::Str,
                text: &src[start..end + 1],
                column,
            });
            continue;
        }

        if c.is_ascii_digit() {
            let mut end = start;
            while let Some(&(i, ch)) = chars.peek() {
                if ch.is_ascii_alphanumeric() {
                    end = i + ch.len_utf8();
                    chars.next();
                    col += 1;
                } else {
                    break;
                }
            }
            let text = &src[start..end];
            if !RE_NUMBER.is_match(text) {
                return Err(LexError {
                    column,
                    message: format!("malformed number '{}'", text),
                });
            }
            tokens.push(Token {
                kind: TokenKind::Number,
                text,
                column,
            });
            continue;
        }

        if is_ident_start(c) {
            let mut end = start;
            while let Some(&(i, ch)) = chars.peek() {
                if is_ident_continue(ch) {
                    end = i + ch.len_utf8();
                    chars.next();
                    col += 1;
                } else {
                    break;
                }
            }
            let text = &src[start..end];
            let kind = if is_mnemonic(text) {
                TokenKind::Opcode
            } else {
                TokenKind::Ident
            };
            tokens.push(Token { kind, text, column });
            continue;
        }

        return Err(LexError {
            column,
            message: format!("unexpected character '{}'", c),
        });
    }

    Ok(tokens)
}
