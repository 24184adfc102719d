use crate::common::{create_temp_asm, scratch_output};
use asmir::config::AnalyzerConfig;
use asmir::{run, AsmIrError};
use std::io::Write;

#[test]
fn missing_input_writes_nothing() {
    let (dir, out) = scratch_output();
    let missing = dir.path().join("does_not_exist.asm");
    let err = run(&missing, &out, &AnalyzerConfig::default()).unwrap_err();
    assert!(matches!(err, AsmIrError::Io(_)), "got {:?}", err);
    assert!(!out.exists());
}

#[test]
fn binary_input_is_rejected() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(b"MZ\x90\x00\x03\x00\x00\x00\x04\x00").unwrap();
    let (_dir, out) = scratch_output();
    let err = run(f.path(), &out, &AnalyzerConfig::default()).unwrap_err();
    assert!(matches!(err, AsmIrError::InvalidInput(_)), "got {:?}", err);
    assert!(!out.exists());
}

#[test]
fn nothing_parseable_is_a_failure() {
    let input = create_temp_asm("mov eax,, ebx\n]]]\n: nope\n");
    let (_dir, out) = scratch_output();
    let err = run(input.path(), &out, &AnalyzerConfig::default()).unwrap_err();
    match err {
        AsmIrError::ParseFailed { rejected } => assert_eq!(rejected, 3),
        other => panic!("expected ParseFailed, got {:?}", other),
    }
    assert!(!out.exists());
}

#[test]
fn comment_only_input_is_not_a_failure() {
    let input = create_temp_asm("; nothing here\n\n# still nothing\n");
    let (_dir, out) = scratch_output();
    let summary = run(input.path(), &out, &AnalyzerConfig::default()).unwrap();
    assert_eq!(summary.parse.lines_accepted, 0);
    assert_eq!(summary.parse.lines_rejected, 0);
    assert!(out.exists());
}

#[test]
fn unwritable_output_reports_path() {
    let input = create_temp_asm("nop\n");
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let out = blocker.path().join("sample_ir.json");
    let err = run(input.path(), &out, &AnalyzerConfig::default()).unwrap_err();
    match err {
        AsmIrError::Output { path, .. } => assert_eq!(path, out),
        other => panic!("expected Output, got {:?}", other),
    }
}

#[test]
fn oversized_input_is_rejected() {
    let input = create_temp_asm(&"nop\n".repeat(64));
    let (_dir, out) = scratch_output();
    let mut cfg = AnalyzerConfig::default();
    cfg.io.max_file_size = 16;
    let err = run(input.path(), &out, &cfg).unwrap_err();
    assert!(
        matches!(err, AsmIrError::ResourceExhausted { limit: 16, .. }),
        "got {:?}",
        err
    );
    assert!(!out.exists());
}
