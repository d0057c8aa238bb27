// Source dialect detection.
//
// Anything that is not a readable PNG is tape text. Images are told apart
// by how many of their pixels are exact command colours: path images are
// made of them, colour-embedded images almost never are.

use std::fmt;

use crate::png::{self, Image, PNG_SIGNATURE};
use crate::transcode::{CommandPalette, Token};

/// Share of pixels (and of rows scanned) that decides the dialect.
pub const THRESHOLD: f64 = 0.8;

/// The three source dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Plain program text.
    Tape,
    /// Image read by walking exact command colours.
    Path,
    /// Image whose colours map to commands through a modular transform.
    Color,
}

impl Dialect {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tape => "tape",
            Self::Path => "path",
            Self::Color => "color",
        }
    }

    pub const fn is_image(self) -> bool {
        !matches!(self, Self::Tape)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether `bytes` start with the PNG signature.
#[inline]
pub fn looks_like_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&PNG_SIGNATURE)
}

/// Guess the dialect of raw source bytes.
pub fn detect(bytes: &[u8]) -> Dialect {
    if !looks_like_png(bytes) {
        return Dialect::Tape;
    }
    match png::decode(bytes) {
        Ok(image) => classify(&image),
        Err(e) => {
            log::debug!("not a readable image ({e}), treating as text");
            Dialect::Tape
        }
    }
}

/// Tell a path image from a colour-embedded one.
///
/// Rows are scanned top-down until the row index passes 80% of the
/// height; the image is a path image when more than 80% of the scanned
/// pixels are exact command colours.
pub fn classify(image: &Image) -> Dialect {
    let palette = CommandPalette::builtin();
    let stop = image.height() as f64 * THRESHOLD;

    let mut scanned = 0usize;
    let mut hits = 0usize;
    for (y, row) in image.pixels().iter().enumerate() {
        scanned += row.len();
        hits += row
            .iter()
            .filter(|&&p| palette.token(p) != Token::None)
            .count();
        if y as f64 > stop {
            break;
        }
    }

    let dialect = if scanned as f64 * THRESHOLD < hits as f64 {
        Dialect::Path
    } else {
        Dialect::Color
    };
    log::debug!("{hits}/{scanned} command pixels, detected {dialect}");
    dialect
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::png::Rgb;
    use crate::transcode::{color, path};

    #[test]
    fn text_is_tape() {
        assert_eq!(detect(b"++[>+<-]."), Dialect::Tape);
        assert_eq!(detect(b""), Dialect::Tape);
    }

    #[test]
    fn broken_png_is_tape() {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(b"garbage");
        assert_eq!(detect(&bytes), Dialect::Tape);
    }

    #[test]
    fn path_image_detected() {
        let img = path::encode("++++[>++<-]>.").unwrap();
        let bytes = png::encode(&img).unwrap();
        assert_eq!(detect(&bytes), Dialect::Path);
    }

    #[test]
    fn color_image_detected() {
        let host = Image::from_pixels(vec![vec![Rgb::new(90, 140, 30); 8]; 8]).unwrap();
        let img = color::encode("+++.", &host).unwrap();
        let bytes = png::encode(&img).unwrap();
        assert_eq!(detect(&bytes), Dialect::Color);
    }

    #[test]
    fn exactly_threshold_is_color() {
        // 4 of 5 pixels are commands: 5 * 0.8 < 4 is false.
        let red = Rgb::new(255, 0, 0);
        let img = Image::from_pixels(vec![vec![red, red, red, red, Rgb::new(1, 1, 1)]]).unwrap();
        assert_eq!(classify(&img), Dialect::Color);
    }
}
