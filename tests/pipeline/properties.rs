use asmir::config::AnalyzerConfig;
use asmir::core::context::Behavior;
use asmir::analysis::semantic::SemanticClassifier;
use asmir::{analyze_source, Analysis};

const MNEMONICS: &[&str] = &["mov", "push", "pop", "xor", "call", "jmp", "jnz", "ret", "lea", "cmp"];
const OPERANDS: &[&str] = &["eax", "ebx, ecx", "[esp+4]", "0x10", "dword ptr [ebp-8], 1", "short loc_1"];

/// Deterministic pseudo-random listing built from a seed.
fn listing(seed: u64, lines: usize) -> String {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    let mut next = move |n: usize| {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 33) as usize) % n
    };
    let mut out = String::new();
    for _ in 0..lines {
        let m = MNEMONICS[next(MNEMONICS.len())];
        if m == "call" {
            out.push_str(&format!("call Api{}Func\n", next(6)));
        } else if m == "ret" {
            out.push_str("ret\n");
        } else {
            out.push_str(&format!("{} {}\n", m, OPERANDS[next(OPERANDS.len())]));
        }
    }
    out
}

fn analyze(text: &str) -> Analysis {
    analyze_source("prop.asm", text, &AnalyzerConfig::default()).unwrap()
}

#[test]
fn every_instruction_counted_once() {
    for seed in 0..32 {
        let text = listing(seed, 50);
        let a = analyze(&text);
        assert_eq!(a.context.opcodes.total(), 50, "seed {}", seed);
        assert_eq!(a.context.cfg.num_blocks, 50);
    }
}

#[test]
fn registers_never_become_apis() {
    let text = "call eax\ncall [ebx+4]\ncall dword ptr [esi]\ncall qword ptr [rip+0x20]\ncall r8\n";
    let a = analyze(text);
    assert!(a.context.apis.is_empty(), "apis: {:?}", a.context.apis.keys().collect::<Vec<_>>());
    assert_eq!(a.context.opcodes.get("CALL"), 5);
}

#[test]
fn complexity_has_floor() {
    for seed in 0..32 {
        let a = analyze(&listing(seed, (seed as usize % 7) + 1));
        assert!(a.context.cfg.cyclomatic_complexity >= 1.0);
        assert!(a.context.cfg.branch_density >= 0.0 && a.context.cfg.branch_density <= 1.0);
        assert!(a.context.cfg.num_edges >= a.context.cfg.num_blocks);
    }
}

#[test]
fn classification_never_clears_flags() {
    let cfg = AnalyzerConfig::default();
    let classifier = SemanticClassifier::new(&cfg.classifier).unwrap();
    let mut a = analyze("call CreateFileA\nret\n");
    for b in Behavior::ALL {
        a.context.behavior.raise(b);
    }
    classifier.classify(&mut a.context);
    for b in Behavior::ALL {
        assert!(a.context.behavior.get(b), "{} was cleared", b);
    }
}

#[test]
fn diagnostics_are_capped() {
    let mut cfg = AnalyzerConfig::default();
    cfg.parser.max_diagnostics = 3;
    let mut text = String::from("nop\n");
    for _ in 0..20 {
        text.push_str("mov eax,, ebx\n");
    }
    let a = analyze_source("bad.asm", &text, &cfg).unwrap();
    assert_eq!(a.parse.lines_rejected, 20);
    assert_eq!(a.parse.diagnostics.len(), 3);
    assert_eq!(a.parse.suppressed, 17);
    assert_eq!(a.context.opcodes.get("NOP"), 1);
}

#[test]
fn listing_case_does_not_change_opcode_keys() {
    let lower = analyze("mov eax, 1\npush ebx\n");
    let upper = analyze("MOV EAX, 1\nPUSH EBX\n");
    let a: Vec<_> = lower.context.opcodes.iter().map(|e| (e.key.clone(), e.count)).collect();
    let b: Vec<_> = upper.context.opcodes.iter().map(|e| (e.key.clone(), e.count)).collect();
    assert_eq!(a, b);
}
