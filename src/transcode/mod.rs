// Image <-> program transcoders.
//
// - `palette` — Command tokens and the fixed colour bijection
// - `path`    — Directional walk over a pixel grid (path dialect)
// - `color`   — Modular colour transform and host-image embedding
//               (colour-embedding dialect), built on `path`

pub mod color;
pub mod palette;
pub mod path;

pub use palette::{CommandPalette, Token};
pub use path::Heading;

use crate::png::PngError;

/// Errors raised while converting between images and programs.
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    /// The host image runs out of pixels before the program does.
    #[error("program of {tokens} instructions does not fit in a {width}x{height} host image")]
    Capacity {
        tokens: usize,
        width: usize,
        height: usize,
    },

    /// A command palette is not a bijection.
    #[error("invalid command palette: {0}")]
    InvalidPalette(String),

    /// Building the output image failed.
    #[error(transparent)]
    Image(#[from] PngError),
}
