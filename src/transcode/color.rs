// Colour-embedding dialect.
//
// Every pixel maps to one of eleven tokens through
//
//     index = (-2R + 3G + B) mod 11
//
// into the path palette followed by a no-op sentinel. Decoding remaps the
// grid and walks it as a path image; encoding nudges the blue channel of
// a host picture until each pixel lands on the wanted index.

use super::TranscodeError;
use super::palette::{CommandPalette, Token};
use super::path;
use crate::png::{Image, Rgb};
use crate::tape::compiler;

/// Number of colour classes.
pub const MODULUS: i32 = 11;

/// Remapped colour of the no-op class.
pub const SENTINEL: Rgb = Rgb::BLACK;

/// Token of each colour class.
pub const CLASSES: [Token; 11] = [
    Token::Right,
    Token::Left,
    Token::Increment,
    Token::Decrement,
    Token::Output,
    Token::Input,
    Token::LoopStart,
    Token::LoopEnd,
    Token::TurnRight,
    Token::TurnLeft,
    Token::None,
];

/// Colour class of a pixel.
#[inline]
pub fn class_of(color: Rgb) -> usize {
    let (r, g, b) = (i32::from(color.r), i32::from(color.g), i32::from(color.b));
    (-2 * r + 3 * g + b).rem_euclid(MODULUS) as usize
}

/// Colour class carrying `token`.
#[inline]
pub fn class_for(token: Token) -> usize {
    CLASSES
        .iter()
        .position(|&t| t == token)
        .unwrap_or(CLASSES.len() - 1)
}

/// Path palette colour a pixel stands for.
pub fn remap(color: Rgb) -> Rgb {
    CommandPalette::builtin()
        .color(CLASSES[class_of(color)])
        .unwrap_or(SENTINEL)
}

/// Read the program hidden in `image`.
///
/// The remap goes into a fresh grid; `image` is left as it was.
pub fn decode(image: &Image) -> String {
    let remapped: Vec<Vec<Rgb>> = image
        .pixels()
        .iter()
        .map(|row| row.iter().map(|&p| remap(p)).collect())
        .collect();
    path::decode_grid(&remapped)
}

/// Closest colour to `color` in the class of `token`.
///
/// Only blue moves: it is raised by `(wanted - current) mod 11` and
/// pulled back by 11 if that overflows a byte, which keeps the class.
pub fn nearest_color(color: Rgb, token: Token) -> Rgb {
    let current = class_of(color) as i32;
    let wanted = class_for(token) as i32;
    let mut blue = i32::from(color.b) + (wanted - current).rem_euclid(MODULUS);
    if blue > i32::from(u8::MAX) {
        blue -= MODULUS;
    } else if blue < 0 {
        blue += MODULUS;
    }
    Rgb::new(color.r, color.g, blue as u8)
}

/// One pixel of the serpentine walk, with the turn it must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    x: usize,
    y: usize,
    turn: Option<Token>,
}

/// Serpentine pixel order matching what `path::decode_grid` walks.
///
/// Even rows run east, odd rows west. Leaving a row takes two turns of
/// the same hand: one on the row's last pixel and one on the next row's
/// first pixel (`R R` after an eastward row, `L L` after a westward one).
/// A one-pixel-wide image turns south once and runs straight down.
fn serpentine(width: usize, height: usize) -> impl Iterator<Item = Step> {
    (0..height).flat_map(move |y| {
        let eastward = y % 2 == 0;
        (0..width).map(move |i| {
            if width == 1 {
                let turn = (y == 0 && height > 1).then_some(Token::TurnRight);
                return Step { x: 0, y, turn };
            }
            let x = if eastward { i } else { width - 1 - i };
            let hand = |east: bool| if east { Token::TurnRight } else { Token::TurnLeft };
            let turn = if i == width - 1 && y + 1 < height {
                Some(hand(eastward))
            } else if i == 0 && y > 0 {
                Some(hand(!eastward))
            } else {
                None
            };
            Step { x, y, turn }
        })
    })
}

/// Hide `program` in a copy of `host`.
///
/// Pixels past the end of the program get the no-op class. Fails with
/// [`TranscodeError::Capacity`] when instructions remain after the last
/// pixel.
pub fn encode(program: &str, host: &Image) -> Result<Image, TranscodeError> {
    let (width, height) = (host.width(), host.height());
    let mut tokens = compiler::instructions(program).map(Token::from);
    let mut pixels = host.pixels().to_vec();

    for step in serpentine(width, height) {
        let token = match step.turn {
            Some(turn) => turn,
            None => tokens.next().unwrap_or(Token::None),
        };
        let pixel = &mut pixels[step.y][step.x];
        *pixel = nearest_color(*pixel, token);
    }

    let left = tokens.count();
    if left > 0 {
        let total = compiler::instructions(program).count();
        return Err(TranscodeError::Capacity {
            tokens: total,
            width,
            height,
        });
    }

    log::debug!("embedded program into {width}x{height} host");
    Ok(Image::from_pixels(pixels)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn host(width: usize, height: usize) -> Image {
        let pixels = (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| Rgb::new((x * 40) as u8, (y * 60) as u8, ((x + y) * 25) as u8))
                    .collect()
            })
            .collect();
        Image::from_pixels(pixels).unwrap()
    }

    #[test]
    fn remap_goes_through_class_table() {
        // Class 0 reads as '>', class 10 as the sentinel.
        assert_eq!(remap(Rgb::BLACK), Rgb::new(255, 0, 0));
        assert_eq!(remap(Rgb::new(0, 0, 10)), SENTINEL);
        assert_eq!(remap(Rgb::new(0, 0, 2)), Rgb::new(0, 255, 0));
    }

    #[test]
    fn class_uses_euclidean_modulo() {
        // -2 * 1 = -2 -> 9
        assert_eq!(class_of(Rgb::new(1, 0, 0)), 9);
        assert_eq!(class_of(Rgb::new(0, 0, 11)), 0);
    }

    #[test]
    fn nearest_color_from_black() {
        assert_eq!(nearest_color(Rgb::BLACK, Token::Increment), Rgb::new(0, 0, 2));
        assert_eq!(nearest_color(Rgb::BLACK, Token::None), Rgb::new(0, 0, 10));
        assert_eq!(nearest_color(Rgb::BLACK, Token::Right), Rgb::BLACK);
    }

    #[test]
    fn nearest_color_wraps_instead_of_clamping() {
        // 255 is class 2; +8 would overflow, so blue drops by 3 instead.
        let c = nearest_color(Rgb::new(0, 0, 255), Token::None);
        assert_eq!(c, Rgb::new(0, 0, 252));
        assert_eq!(class_of(c), class_for(Token::None));
    }

    #[test]
    fn nearest_color_always_hits_class() {
        for b in 0..=255u8 {
            for token in CLASSES {
                let c = nearest_color(Rgb::new(17, 99, b), token);
                assert_eq!(class_of(c), class_for(token));
                assert!((i32::from(c.b) - i32::from(b)).abs() <= 10);
            }
        }
    }

    #[test]
    fn serpentine_turns() {
        let steps: Vec<Step> = serpentine(3, 3).collect();
        let turns: Vec<_> = steps
            .iter()
            .filter_map(|s| s.turn.map(|t| (s.x, s.y, t)))
            .collect();
        assert_eq!(
            turns,
            vec![
                (2, 0, Token::TurnRight),
                (2, 1, Token::TurnRight),
                (0, 1, Token::TurnLeft),
                (0, 2, Token::TurnLeft),
            ]
        );
        let order: Vec<_> = steps.iter().map(|s| (s.x, s.y)).collect();
        assert_eq!(&order[3..6], &[(2, 1), (1, 1), (0, 1)]);
    }

    #[test]
    fn roundtrip_in_host() {
        let program = "++[>+<-]>.";
        let img = encode(program, &host(5, 4)).unwrap();
        assert_eq!(decode(&img), program);
    }

    #[test]
    fn roundtrip_single_column() {
        let img = encode("+.", &host(1, 4)).unwrap();
        assert_eq!(decode(&img), "+.");
    }

    #[test]
    fn roundtrip_single_row() {
        let img = encode("+-+", &host(6, 1)).unwrap();
        assert_eq!(decode(&img), "+-+");
    }

    #[test]
    fn host_is_not_mutated() {
        let h = host(4, 4);
        let before = h.clone();
        let _ = encode("+++", &h).unwrap();
        let _ = decode(&h);
        assert_eq!(h, before);
    }

    #[test]
    fn capacity_error() {
        // 3x2 host: 6 pixels, 2 of them turns -> room for 4 instructions.
        assert!(encode("++++", &host(3, 2)).is_ok());
        let err = encode("+++++", &host(3, 2)).unwrap_err();
        assert!(matches!(
            err,
            TranscodeError::Capacity {
                tokens: 5,
                width: 3,
                height: 2
            }
        ));
    }
}
