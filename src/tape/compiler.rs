// Tape program compilation.
//
// Two passes in total: `compile` strips comments and pairs brackets once,
// `machine::eval` then runs the resulting op array with O(1) jumps.

use std::fmt;

use super::TapeError;

/// Separates program text from its pre-bound input.
pub const INPUT_SEPARATOR: char = '!';

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// The eight tape instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// `>`
    Right,
    /// `<`
    Left,
    /// `+`
    Increment,
    /// `-`
    Decrement,
    /// `.`
    Output,
    /// `,`
    Input,
    /// `[`
    LoopStart,
    /// `]`
    LoopEnd,
}

impl Instruction {
    pub const ALL: [Instruction; 8] = [
        Self::Right,
        Self::Left,
        Self::Increment,
        Self::Decrement,
        Self::Output,
        Self::Input,
        Self::LoopStart,
        Self::LoopEnd,
    ];

    /// Recognize an instruction character; everything else is a comment.
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '>' => Some(Self::Right),
            '<' => Some(Self::Left),
            '+' => Some(Self::Increment),
            '-' => Some(Self::Decrement),
            '.' => Some(Self::Output),
            ',' => Some(Self::Input),
            '[' => Some(Self::LoopStart),
            ']' => Some(Self::LoopEnd),
            _ => None,
        }
    }

    pub const fn as_char(self) -> char {
        match self {
            Self::Right => '>',
            Self::Left => '<',
            Self::Increment => '+',
            Self::Decrement => '-',
            Self::Output => '.',
            Self::Input => ',',
            Self::LoopStart => '[',
            Self::LoopEnd => ']',
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Recognized instructions of `text`, comments dropped.
pub fn instructions(text: &str) -> impl Iterator<Item = Instruction> + '_ {
    text.chars().filter_map(Instruction::from_char)
}

/// `text` with every comment character removed.
pub fn strip_comments(text: &str) -> String {
    instructions(text).map(Instruction::as_char).collect()
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Program text split from its pre-bound input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preprocessed<'a> {
    pub program: &'a str,
    /// Bytes after the first `!`; `None` when the text has no `!`, in
    /// which case `,` falls back to interactive input.
    pub input: Option<&'a [u8]>,
}

/// Split once on the first `!`.
pub fn preprocess(text: &str) -> Preprocessed<'_> {
    match text.split_once(INPUT_SEPARATOR) {
        Some((program, input)) => Preprocessed {
            program,
            input: Some(input.as_bytes()),
        },
        None => Preprocessed {
            program: text,
            input: None,
        },
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// One compiled instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Op {
    pub instruction: Instruction,
    /// Index of the paired bracket; 0 for non-bracket ops.
    pub target: usize,
    /// Character offset in the program text.
    pub offset: usize,
}

/// Compiled program: comment-free ops with paired jump targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledOps {
    ops: Vec<Op>,
}

impl CompiledOps {
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    #[inline]
    pub fn get(&self, pc: usize) -> Option<&Op> {
        self.ops.get(pc)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl fmt::Display for CompiledOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            write!(f, "{}", op.instruction)?;
        }
        Ok(())
    }
}

/// Strip comments and pair brackets with an explicit index stack.
pub fn compile(program: &str) -> Result<CompiledOps, TapeError> {
    let mut ops: Vec<Op> = Vec::new();
    let mut stack: Vec<usize> = Vec::new();

    for (offset, c) in program.chars().enumerate() {
        let Some(instruction) = Instruction::from_char(c) else {
            continue;
        };
        let index = ops.len();
        let mut target = 0;
        match instruction {
            Instruction::LoopStart => stack.push(index),
            Instruction::LoopEnd => {
                let open = stack
                    .pop()
                    .ok_or(TapeError::UnbalancedBracket { bracket: ']', offset })?;
                ops[open].target = index;
                target = open;
            }
            _ => {}
        }
        ops.push(Op {
            instruction,
            target,
            offset,
        });
    }

    if let Some(&open) = stack.last() {
        return Err(TapeError::UnbalancedBracket {
            bracket: '[',
            offset: ops[open].offset,
        });
    }

    log::debug!("compiled {} ops", ops.len());
    Ok(CompiledOps { ops })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preprocess_splits_on_first_bang() {
        let p = preprocess(",.!ab!c");
        assert_eq!(p.program, ",.");
        assert_eq!(p.input, Some(&b"ab!c"[..]));

        let p = preprocess("+++");
        assert_eq!(p.program, "+++");
        assert_eq!(p.input, None);

        let p = preprocess("+!");
        assert_eq!(p.input, Some(&b""[..]));
    }

    #[test]
    fn comments_are_dropped() {
        let ops = compile("a+b-c RL x").unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops.to_string(), "+-");
        assert_eq!(ops.ops()[1].offset, 3);
        assert_eq!(strip_comments("hello, world."), ",.");
    }

    #[test]
    fn brackets_are_paired() {
        let ops = compile("+[>[-]<]").unwrap();
        let o = ops.ops();
        assert_eq!(o[1].target, 7);
        assert_eq!(o[7].target, 1);
        assert_eq!(o[3].target, 5);
        assert_eq!(o[5].target, 3);
    }

    #[test]
    fn unmatched_open_reports_innermost() {
        let err = compile("[[").unwrap_err();
        assert!(matches!(
            err,
            TapeError::UnbalancedBracket {
                bracket: '[',
                offset: 1
            }
        ));
    }

    #[test]
    fn unmatched_close() {
        let err = compile("]").unwrap_err();
        assert!(matches!(
            err,
            TapeError::UnbalancedBracket {
                bracket: ']',
                offset: 0
            }
        ));
        assert!(compile("[]]").is_err());
    }

    #[test]
    fn empty_program_compiles() {
        assert!(compile("just a comment").unwrap().is_empty());
    }

    #[test]
    fn instruction_char_mapping() {
        for i in Instruction::ALL {
            assert_eq!(Instruction::from_char(i.as_char()), Some(i));
        }
        assert_eq!(Instruction::from_char('!'), None);
    }
}
