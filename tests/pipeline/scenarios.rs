use crate::common::{create_temp_asm, scratch_output};
use asmir::ir::IrDocument;
use asmir::{run, AnalyzerConfig};

fn run_text(text: &str) -> (asmir::RunSummary, IrDocument) {
    let input = create_temp_asm(text);
    let (_dir, out) = scratch_output();
    let summary = run(input.path(), &out, &AnalyzerConfig::default()).expect("run");
    let written = std::fs::read_to_string(&out).expect("read IR");
    (summary, IrDocument::from_json_str(&written).expect("parse IR"))
}

#[test]
fn file_apis_with_return() {
    let (_, doc) = run_text("CALL CreateFileA\nCALL WriteFile\nRET\n");

    let apis: Vec<(&str, u64)> = doc.apis.iter().map(|r| (r.name.as_str(), r.count)).collect();
    assert_eq!(apis, vec![("CreateFileA", 1), ("WriteFile", 1)]);
    let ops: Vec<(&str, u64)> = doc.opcodes.iter().map(|r| (r.name.as_str(), r.count)).collect();
    assert_eq!(ops, vec![("CALL", 2), ("RET", 1)]);
    assert_eq!(doc.behavior.uses_fileops, 1);
    assert_eq!(doc.behavior.uses_network, 0);
}

#[test]
fn stripped_sample_uses_fallback() {
    let mut text = String::new();
    for i in 0..25 {
        text.push_str(&format!("call sub_40{:04X}\n", i));
    }
    for _ in 0..22 {
        text.push_str("xor eax, [esi+ecx*4]\n");
    }
    for _ in 0..30 {
        text.push_str("jnz short loc_401006\n");
    }
    let (summary, doc) = run_text(&text);

    assert!(summary.classification.fallback_used);
    assert_eq!(summary.classification.recognized_apis, 0);
    assert_eq!(doc.opcode_count("CALL"), 25);
    assert_eq!(doc.opcode_count("XOR"), 22);
    assert!(doc.cfg.cyclomatic_complexity > 50.0);
    assert_eq!(doc.behavior.uses_crypto, 1);
    assert_eq!(doc.behavior.uses_network, 1);
}

#[test]
fn one_malformed_line_is_skipped() {
    let (summary, doc) = run_text("push ebp\nmov ebp, esp\nmov eax,, ebx\ncall Sleep\nret\n");

    assert_eq!(summary.parse.lines_rejected, 1);
    assert_eq!(summary.parse.diagnostics.len(), 1);
    assert_eq!(summary.parse.diagnostics[0].line, 3);
    assert_eq!(doc.opcode_count("PUSH"), 1);
    assert_eq!(doc.opcode_count("MOV"), 1);
    assert_eq!(doc.opcode_count("CALL"), 1);
    assert_eq!(doc.opcode_count("RET"), 1);
    assert_eq!(doc.api_count("Sleep"), 1);
}

#[test]
fn empty_input() {
    let (summary, doc) = run_text("");

    assert_eq!(summary.parse.lines_total, 0);
    assert_eq!(doc.cfg.num_blocks, 0);
    assert_eq!(doc.cfg.num_edges, 0);
    assert_eq!(doc.cfg.branch_density, 0.0);
    assert_eq!(doc.cfg.cyclomatic_complexity, 1.0);
    assert!(doc.apis.is_empty());
    assert!(doc.opcodes.is_empty());
    assert_eq!(doc.behavior, Default::default());
}

#[test]
fn filename_is_input_path() {
    let input = create_temp_asm("nop\n");
    let (_dir, out) = scratch_output();
    let summary = run(input.path(), &out, &AnalyzerConfig::default()).unwrap();
    assert_eq!(summary.document.filename, input.path().display().to_string());
}

#[test]
fn emitted_json_matches_context_counts() {
    let text = "push ebp\ncall VirtualAlloc\ncall CreateRemoteThread\ncall VirtualAlloc\nret\n";
    let analysis = asmir::analyze_source("rt.asm", text, &AnalyzerConfig::default()).unwrap();
    let (_, doc) = run_text(text);

    for entry in analysis.context.opcodes.iter() {
        assert_eq!(doc.opcode_count(&entry.key), entry.count);
    }
    for entry in analysis.context.apis.iter() {
        assert_eq!(doc.api_count(&entry.key), entry.count);
    }
    assert_eq!(doc.cfg, analysis.context.cfg);
    assert_eq!(doc.api_count("VirtualAlloc"), 2);
    assert_eq!(doc.behavior.uses_memory, 1);
    assert_eq!(doc.behavior.uses_injection, 1);
}
