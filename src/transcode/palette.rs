// Command tokens and the colour palette shared by both image dialects.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use super::TranscodeError;
use crate::png::Rgb;
use crate::tape::Instruction;

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// A pixel's meaning: one of the eight tape instructions, a turn, or
/// nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Right,
    Left,
    Increment,
    Decrement,
    Output,
    Input,
    LoopStart,
    LoopEnd,
    /// `R`: rotate the heading 90° clockwise.
    TurnRight,
    /// `L`: rotate the heading 90° counter-clockwise.
    TurnLeft,
    /// No recognized command.
    None,
}

impl Token {
    /// The ten tokens that own a palette colour, in palette order.
    pub const COMMANDS: [Token; 10] = [
        Self::Right,
        Self::Left,
        Self::Increment,
        Self::Decrement,
        Self::Output,
        Self::Input,
        Self::LoopStart,
        Self::LoopEnd,
        Self::TurnRight,
        Self::TurnLeft,
    ];

    pub const fn instruction(self) -> Option<Instruction> {
        match self {
            Self::Right => Some(Instruction::Right),
            Self::Left => Some(Instruction::Left),
            Self::Increment => Some(Instruction::Increment),
            Self::Decrement => Some(Instruction::Decrement),
            Self::Output => Some(Instruction::Output),
            Self::Input => Some(Instruction::Input),
            Self::LoopStart => Some(Instruction::LoopStart),
            Self::LoopEnd => Some(Instruction::LoopEnd),
            Self::TurnRight | Self::TurnLeft | Self::None => None,
        }
    }

    pub const fn as_char(self) -> Option<char> {
        match self {
            Self::TurnRight => Some('R'),
            Self::TurnLeft => Some('L'),
            Self::None => None,
            _ => match self.instruction() {
                Some(i) => Some(i.as_char()),
                None => None,
            },
        }
    }
}

impl From<Instruction> for Token {
    fn from(i: Instruction) -> Self {
        match i {
            Instruction::Right => Self::Right,
            Instruction::Left => Self::Left,
            Instruction::Increment => Self::Increment,
            Instruction::Decrement => Self::Decrement,
            Instruction::Output => Self::Output,
            Instruction::Input => Self::Input,
            Instruction::LoopStart => Self::LoopStart,
            Instruction::LoopEnd => Self::LoopEnd,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_char() {
            Some(c) => write!(f, "{c}"),
            None => write!(f, "none"),
        }
    }
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Built-in colours, indexed like [`Token::COMMANDS`].
pub const COMMAND_COLORS: [Rgb; 10] = [
    Rgb::new(255, 0, 0),   // >  red
    Rgb::new(128, 0, 0),   // <  dark red
    Rgb::new(0, 255, 0),   // +  green
    Rgb::new(0, 128, 0),   // -  dark green
    Rgb::new(0, 0, 255),   // .  blue
    Rgb::new(0, 0, 128),   // ,  dark blue
    Rgb::new(255, 255, 0), // [  yellow
    Rgb::new(128, 128, 0), // ]  dark yellow
    Rgb::new(0, 255, 255), // R  cyan
    Rgb::new(0, 128, 128), // L  dark cyan
];

const fn colors_unique(colors: &[Rgb; 10]) -> bool {
    let mut i = 0;
    while i < colors.len() {
        let mut j = i + 1;
        while j < colors.len() {
            let (a, b) = (colors[i], colors[j]);
            if a.r == b.r && a.g == b.g && a.b == b.b {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const _: () = assert!(colors_unique(&COMMAND_COLORS), "command colours must be distinct");

static BUILTIN: LazyLock<CommandPalette> = LazyLock::new(|| CommandPalette::build(COMMAND_COLORS));

/// Bidirectional token <-> colour tables.
#[derive(Debug, Clone)]
pub struct CommandPalette {
    colors: [Rgb; 10],
    tokens: HashMap<Rgb, Token>,
}

impl CommandPalette {
    /// The process-wide built-in palette.
    pub fn builtin() -> &'static CommandPalette {
        &BUILTIN
    }

    /// Build a palette from colours ordered like [`Token::COMMANDS`].
    /// Fails if two tokens share a colour.
    pub fn new(colors: [Rgb; 10]) -> Result<Self, TranscodeError> {
        let palette = Self::build(colors);
        if palette.tokens.len() != colors.len() {
            return Err(TranscodeError::InvalidPalette(format!(
                "{} colours shared between tokens",
                colors.len() - palette.tokens.len()
            )));
        }
        Ok(palette)
    }

    fn build(colors: [Rgb; 10]) -> Self {
        let tokens = Token::COMMANDS
            .iter()
            .zip(colors.iter())
            .map(|(&token, &color)| (color, token))
            .collect();
        Self { colors, tokens }
    }

    /// Token for an exact colour; [`Token::None`] when unrecognized.
    #[inline]
    pub fn token(&self, color: Rgb) -> Token {
        self.tokens.get(&color).copied().unwrap_or(Token::None)
    }

    /// Colour of a token; `None` for [`Token::None`].
    #[inline]
    pub fn color(&self, token: Token) -> Option<Rgb> {
        Token::COMMANDS
            .iter()
            .position(|&t| t == token)
            .map(|i| self.colors[i])
    }

    pub fn colors(&self) -> &[Rgb; 10] {
        &self.colors
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
