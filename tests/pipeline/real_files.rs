use crate::common::{sample_file_path, scratch_output, test_data};
use asmir::core::context::Behavior;
use asmir::{run, AnalyzerConfig};

#[test]
fn dropper_sample() {
    let input = sample_file_path(test_data::SAMPLE_DROPPER);
    let (_dir, out) = scratch_output();
    let summary = run(&input, &out, &AnalyzerConfig::default()).expect("dropper run");
    let doc = &summary.document;

    assert_eq!(summary.parse.lines_rejected, 0);
    assert!(!summary.classification.fallback_used);
    assert_eq!(summary.classification.recognized_apis, 7);
    assert_eq!(summary.input_sha256.len(), 64);

    let names: Vec<&str> = doc.apis.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "InternetOpenA",
            "InternetOpenUrlA",
            "CreateFileA",
            "WriteFile",
            "RegOpenKeyExA",
            "RegSetValueExA",
            "CreateServiceA",
        ]
    );

    for (op, n) in [
        ("PUSH", 8),
        ("MOV", 4),
        ("SUB", 1),
        ("CALL", 7),
        ("TEST", 1),
        ("JZ", 1),
        ("XOR", 1),
        ("POP", 1),
        ("RETN", 1),
    ] {
        assert_eq!(doc.opcode_count(op), n, "opcode {}", op);
    }
    assert_eq!(doc.opcodes.len(), 9);

    assert_eq!(doc.cfg.num_blocks, 25);
    assert_eq!(doc.cfg.num_edges, 33);
    assert_eq!(doc.cfg.cyclomatic_complexity, 10.0);

    for b in [Behavior::Network, Behavior::FileOps, Behavior::Registry, Behavior::Persist] {
        assert!(doc.behavior.get(b), "{} should be raised", b);
    }
    for b in [Behavior::Memory, Behavior::Injection, Behavior::Crypto] {
        assert!(!doc.behavior.get(b), "{} should not be raised", b);
    }
}

#[test]
fn stripped_sample() {
    let input = sample_file_path(test_data::SAMPLE_STRIPPED);
    let (_dir, out) = scratch_output();
    let summary = run(&input, &out, &AnalyzerConfig::default()).expect("stripped run");
    let doc = &summary.document;

    assert!(summary.classification.fallback_used);
    assert_eq!(summary.classification.recognized_apis, 0);
    assert_eq!(doc.apis.len(), 1);
    assert_eq!(doc.api_count("sub_402000"), 1);

    let total: u64 = doc.opcodes.iter().map(|r| r.count).sum();
    assert_eq!(total, 12);
    assert_eq!(doc.opcode_count("XOR"), 3);
    assert_eq!(doc.cfg.num_blocks, 12);
    assert_eq!(doc.cfg.num_edges, 14);
    assert_eq!(doc.cfg.cyclomatic_complexity, 4.0);
    assert_eq!(doc.behavior, Default::default());
}

#[test]
fn malformed_sample() {
    let input = sample_file_path(test_data::SAMPLE_MALFORMED);
    let (_dir, out) = scratch_output();
    let summary = run(&input, &out, &AnalyzerConfig::default()).expect("malformed run");

    assert_eq!(summary.parse.lines_total, 5);
    assert_eq!(summary.parse.lines_accepted, 4);
    assert_eq!(summary.parse.lines_rejected, 1);
    assert_eq!(summary.parse.diagnostics[0].line, 3);
    assert_eq!(summary.document.api_count("Sleep"), 1);
    assert_eq!(summary.document.opcode_count("MOV"), 1);
    assert!(out.exists());
}
