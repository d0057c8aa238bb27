#![no_main]
use libfuzzer_sys::fuzz_target;
use oxibrain::tape::{self, BoundInput};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let source = tape::preprocess(&text);
    let Ok(ops) = tape::compile(source.program) else {
        return;
    };
    // Without `]` there are no loops, so evaluation is bounded.
    if ops.ops().iter().any(|op| op.instruction == tape::Instruction::LoopEnd) {
        return;
    }
    let mut out = Vec::new();
    let input = source.input.unwrap_or_default();
    let _ = tape::eval(&ops, &mut out, &mut BoundInput::new(input));
});
