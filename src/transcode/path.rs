// Path dialect: the program is read by walking the pixel grid.
//
// The walk starts at the top-left pixel heading east. Turn pixels rotate
// the heading, instruction pixels append to the program, any other colour
// is skipped. The walk ends as soon as it steps off the grid.

use super::TranscodeError;
use super::palette::{CommandPalette, Token};
use crate::png::{Image, Rgb};
use crate::tape::compiler;

/// Direction of travel across the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    North,
    East,
    South,
    West,
}

impl Heading {
    /// Rotate 90° clockwise.
    pub const fn turn_right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Rotate 90° counter-clockwise.
    pub const fn turn_left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::East => Self::North,
            Self::South => Self::East,
            Self::West => Self::South,
        }
    }

    /// One step from `(x, y)`, or `None` when it leaves a `width`x`height` grid.
    pub fn step(self, x: usize, y: usize, width: usize, height: usize) -> Option<(usize, usize)> {
        let (nx, ny) = match self {
            Self::North => (Some(x), y.checked_sub(1)),
            Self::East => (Some(x + 1), Some(y)),
            Self::South => (Some(x), Some(y + 1)),
            Self::West => (x.checked_sub(1), Some(y)),
        };
        match (nx, ny) {
            (Some(nx), Some(ny)) if nx < width && ny < height => Some((nx, ny)),
            _ => None,
        }
    }
}

/// Read the program encoded in `image`.
pub fn decode(image: &Image) -> String {
    decode_grid(image.pixels())
}

/// Walk a rectangular grid and collect its instructions.
///
/// The walk always terminates: each step can be undone from the pixel's
/// turn and the incoming heading, and the starting state has no
/// predecessor inside the grid, so no state repeats. At most four visits
/// per pixel.
pub fn decode_grid(pixels: &[Vec<Rgb>]) -> String {
    let palette = CommandPalette::builtin();
    let height = pixels.len();
    let width = pixels.first().map_or(0, Vec::len);
    let mut program = String::new();
    if width == 0 {
        return program;
    }

    let mut heading = Heading::East;
    let (mut x, mut y) = (0, 0);

    loop {
        let token = palette.token(pixels[y][x]);
        log::trace!("pixel ({x}, {y}) {} -> {token}", pixels[y][x]);
        match token {
            Token::TurnRight => heading = heading.turn_right(),
            Token::TurnLeft => heading = heading.turn_left(),
            Token::None => {}
            _ => {
                if let Some(i) = token.instruction() {
                    program.push(i.as_char());
                }
            }
        }

        match heading.step(x, y, width, height) {
            Some((nx, ny)) => (x, y) = (nx, ny),
            None => break,
        }
    }

    log::debug!("path walk over {width}x{height} read {} instructions", program.len());
    program
}

/// Lay the program's instructions out on a single row.
///
/// Comments are dropped first. An empty program becomes one black pixel,
/// which carries no command.
pub fn encode(program: &str) -> Result<Image, TranscodeError> {
    let palette = CommandPalette::builtin();
    let mut row: Vec<Rgb> = compiler::instructions(program)
        .filter_map(|i| palette.color(Token::from(i)))
        .collect();
    if row.is_empty() {
        row.push(Rgb::BLACK);
    }
    Ok(Image::from_pixels(vec![row])?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn color(token: Token) -> Rgb {
        CommandPalette::builtin().color(token).unwrap_or(Rgb::BLACK)
    }

    fn grid(rows: &[&[Token]]) -> Vec<Vec<Rgb>> {
        rows.iter()
            .map(|row| row.iter().map(|&t| color(t)).collect())
            .collect()
    }

    #[test]
    fn headings_cycle() {
        let mut h = Heading::North;
        for _ in 0..4 {
            h = h.turn_right();
        }
        assert_eq!(h, Heading::North);
        assert_eq!(Heading::East.turn_left(), Heading::North);
        assert_eq!(Heading::North.turn_left(), Heading::West);
    }

    #[test]
    fn step_stops_at_edges() {
        assert_eq!(Heading::West.step(0, 0, 2, 2), None);
        assert_eq!(Heading::North.step(1, 0, 2, 2), None);
        assert_eq!(Heading::East.step(1, 1, 2, 2), None);
        assert_eq!(Heading::South.step(1, 1, 2, 2), None);
        assert_eq!(Heading::South.step(1, 0, 2, 2), Some((1, 1)));
    }

    #[test]
    fn single_row_reads_left_to_right() {
        use Token::*;
        let pixels = grid(&[&[Increment, None, Increment, Output]]);
        assert_eq!(decode_grid(&pixels), "++.");
    }

    #[test]
    fn turns_follow_a_snake() {
        use Token::*;
        // + + R
        // . - R     read: + + - .
        let pixels = grid(&[&[Increment, Increment, TurnRight], &[Output, Decrement, TurnRight]]);
        assert_eq!(decode_grid(&pixels), "++-.");
    }

    #[test]
    fn left_turn_exits_north() {
        use Token::*;
        // Turning left on the first pixel walks straight off the top.
        let pixels = grid(&[&[TurnLeft, Increment], &[Increment, Increment]]);
        assert_eq!(decode_grid(&pixels), "");
    }

    #[test]
    fn turn_cycles_still_exit() {
        use Token::*;
        let pixels = grid(&[
            &[TurnRight, TurnRight, TurnRight],
            &[TurnRight, TurnRight, TurnRight],
            &[TurnLeft, TurnRight, TurnLeft],
        ]);
        assert_eq!(decode_grid(&pixels), "");
    }

    #[test]
    fn encode_drops_comments() {
        let img = encode("+ hello [ - ] .").unwrap();
        assert_eq!(img.height(), 1);
        assert_eq!(img.width(), 5);
        assert_eq!(img.pixel(0, 0), Some(Rgb::new(0, 255, 0)));
        assert_eq!(decode(&img), "+[-].");
    }

    #[test]
    fn encode_empty_program() {
        let img = encode("no commands here").unwrap();
        assert_eq!(img.pixel_count(), 1);
        assert_eq!(decode(&img), "");
    }
}
