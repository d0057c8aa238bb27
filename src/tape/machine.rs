// Tape machine: evaluates compiled ops against a growable byte tape.

use std::io::{self, Read, Write};

use super::TapeError;
use super::compiler::{self, CompiledOps, Instruction};

// ---------------------------------------------------------------------------
// Input sources
// ---------------------------------------------------------------------------

/// Supplies bytes to the `,` instruction.
pub trait InputSource {
    /// Next input byte, or `None` once the source is exhausted.
    fn next_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Input bound ahead of time, e.g. the text after `!`.
#[derive(Debug, Clone, Default)]
pub struct BoundInput {
    data: Vec<u8>,
    pos: usize,
}

impl BoundInput {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl InputSource for BoundInput {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.data.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        Ok(byte)
    }
}

/// Blocking single-byte reads from a reader, normally stdin.
#[derive(Debug)]
pub struct Interactive<R> {
    reader: R,
}

impl<R: Read> Interactive<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl Interactive<io::Stdin> {
    pub fn stdin() -> Self {
        Self::new(io::stdin())
    }
}

impl<R: Read> InputSource for Interactive<R> {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tape
// ---------------------------------------------------------------------------

/// Byte tape starting with one zero cell. The cursor never goes below 0
/// and the tape grows by one cell per step past its right end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<u8>,
    cursor: usize,
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

impl Tape {
    pub fn new() -> Self {
        Self {
            cells: vec![0],
            cursor: 0,
        }
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn current(&self) -> u8 {
        self.cells[self.cursor]
    }

    #[inline]
    pub fn set(&mut self, value: u8) {
        self.cells[self.cursor] = value;
    }

    /// Move left; a no-op at cell 0.
    #[inline]
    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    #[inline]
    pub fn right(&mut self) {
        self.cursor += 1;
        if self.cursor == self.cells.len() {
            self.cells.push(0);
        }
    }

    #[inline]
    pub fn increment(&mut self) {
        let cell = &mut self.cells[self.cursor];
        *cell = cell.wrapping_add(1);
    }

    #[inline]
    pub fn decrement(&mut self) {
        let cell = &mut self.cells[self.cursor];
        *cell = cell.wrapping_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Run `ops` on a fresh tape until the program counter passes the end.
///
/// Every `.` writes one byte and flushes `out`, so output produced before
/// a runtime error stays visible. Returns the final tape.
pub fn eval<W, I>(ops: &CompiledOps, out: &mut W, input: &mut I) -> Result<Tape, TapeError>
where
    W: Write + ?Sized,
    I: InputSource + ?Sized,
{
    let mut tape = Tape::new();
    let mut pc = 0;

    while let Some(op) = ops.get(pc) {
        log::trace!(
            "pc {pc}: {} cell[{}]={}",
            op.instruction,
            tape.cursor(),
            tape.current()
        );
        match op.instruction {
            Instruction::Left => tape.left(),
            Instruction::Right => tape.right(),
            Instruction::Increment => tape.increment(),
            Instruction::Decrement => tape.decrement(),
            Instruction::Output => {
                out.write_all(&[tape.current()])?;
                out.flush()?;
            }
            Instruction::Input => {
                let byte = input.next_byte()?.ok_or(TapeError::EndOfInput { pc })?;
                tape.set(byte);
            }
            Instruction::LoopStart => {
                if tape.current() == 0 {
                    pc = op.target;
                }
            }
            Instruction::LoopEnd => {
                if tape.current() != 0 {
                    pc = op.target;
                }
            }
        }
        pc += 1;
    }

    Ok(tape)
}

/// Preprocess, compile and run program text.
///
/// Input after `!` is bound to `,`; without `!`, `,` reads from
/// `fallback`.
pub fn run_source<W>(text: &str, out: &mut W, fallback: &mut dyn InputSource) -> Result<Tape, TapeError>
where
    W: Write + ?Sized,
{
    let source = compiler::preprocess(text);
    let ops = compiler::compile(source.program)?;
    match source.input {
        Some(bytes) => eval(&ops, out, &mut BoundInput::new(bytes)),
        None => eval(&ops, out, fallback),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
