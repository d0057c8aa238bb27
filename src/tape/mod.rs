// Tape language: a byte tape with a single cursor and eight instructions.
//
// - `compiler` — Input splitting, comment stripping, bracket pairing
// - `machine`  — Tape state, input sources and the evaluation loop

pub mod compiler;
pub mod machine;

pub use compiler::{CompiledOps, Instruction, Op, Preprocessed, compile, preprocess};
pub use machine::{BoundInput, InputSource, Interactive, Tape, eval, run_source};

/// Errors raised while compiling or running a tape program.
#[derive(Debug, thiserror::Error)]
pub enum TapeError {
    /// A `[` without its `]` or a `]` without its `[`.
    #[error("unbalanced bracket '{bracket}' at offset {offset}")]
    UnbalancedBracket { bracket: char, offset: usize },

    /// `,` executed after the bound input ran out.
    #[error("end of input at instruction {pc}")]
    EndOfInput { pc: usize },

    /// Writing output or reading interactive input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
