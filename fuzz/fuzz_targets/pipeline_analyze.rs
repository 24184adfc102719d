#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let cfg = asmir::config::AnalyzerConfig::default();
    if let Ok(text) = asmir::io::decode_text(data.to_vec(), cfg.io.binary_sniff_size) {
        if let Ok(a) = asmir::analyze_source("<fuzz>", &text, &cfg) {
            assert!(a.context.cfg.cyclomatic_complexity >= 1.0);
        }
    }
});
