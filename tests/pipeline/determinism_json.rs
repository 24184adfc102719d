use crate::common::{create_temp_asm, sample_file_path, scratch_output, test_data};
use asmir::{run, AnalyzerConfig};

#[test]
fn repeated_runs_write_identical_bytes() {
    let input = sample_file_path(test_data::SAMPLE_DROPPER);
    let cfg = AnalyzerConfig::default();
    let (_d1, out1) = scratch_output();
    let (_d2, out2) = scratch_output();

    run(&input, &out1, &cfg).expect("first run");
    run(&input, &out2, &cfg).expect("second run");

    let a = std::fs::read(&out1).unwrap();
    let b = std::fs::read(&out2).unwrap();
    assert_eq!(a, b, "IR output must be byte-identical across runs");
}

#[test]
fn output_is_schema_tagged_and_ordered() {
    let input = create_temp_asm("call WriteFile\ncall CreateFileA\nmov eax, 1\ncall WriteFile\n");
    let (_dir, out) = scratch_output();
    run(input.path(), &out, &AnalyzerConfig::default()).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.ends_with('\n'));
    assert!(text.starts_with("{\n  \"schema_version\": \"1.0\","));
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();

    // first-seen order, not alphabetical
    let apis = v["apis"].as_array().unwrap();
    assert_eq!(apis[0]["name"], "WriteFile");
    assert_eq!(apis[0]["count"], 2);
    assert_eq!(apis[1]["name"], "CreateFileA");
    let opcodes = v["opcodes"].as_array().unwrap();
    assert_eq!(opcodes[0]["name"], "CALL");
    assert_eq!(opcodes[1]["name"], "MOV");
}

#[test]
fn behavior_values_are_integers() {
    let input = create_temp_asm("call RegSetValueExA\n");
    let (_dir, out) = scratch_output();
    run(input.path(), &out, &AnalyzerConfig::default()).unwrap();

    let v: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let behavior = v["behavior"].as_object().unwrap();
    assert_eq!(behavior.len(), 7);
    for (key, value) in behavior {
        assert!(key.starts_with("uses_"));
        let n = value.as_u64().expect("flag must be an integer");
        assert!(n <= 1);
    }
    assert_eq!(behavior["uses_registry"], 1);
}
