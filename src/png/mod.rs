// Simplified PNG codec.
//
// Reads truecolor (depth 8) and indexed (depth 1/2/4/8) non-interlaced
// images, and writes truecolor depth 8.
//
// # Modules
//
// - `image`   — Pixel grid, header and palette types
// - `chunk`   — Signature, chunk framing, CRC32, IHDR/PLTE records
// - `filter`  — Scanline filter reversal (None/Sub/Up/Average/Paeth)
// - `decoder` — Bytes → Image
// - `encoder` — Image → bytes

pub mod chunk;
pub mod decoder;
pub mod encoder;
pub mod filter;
pub mod image;

pub use chunk::{Chunk, ChunkStream, PNG_SIGNATURE};
pub use decoder::decode;
pub use encoder::encode;
pub use filter::FilterType;
pub use image::{ColorMode, Header, Image, Palette, Rgb};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors raised while reading, writing or editing an image.
#[derive(Debug, thiserror::Error)]
pub enum PngError {
    /// Malformed byte stream or a header outside the supported profile.
    #[error("invalid PNG at byte {offset}: {msg}")]
    Format { offset: usize, msg: String },

    /// The concatenated IDAT stream failed to inflate.
    #[error("PNG data cannot be decompressed: {0}")]
    Decompression(#[source] std::io::Error),

    /// A pixel grid or color failed its invariants.
    #[error("invalid pixel data: {0}")]
    Validation(String),

    /// Writing the encoded stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PngError {
    pub(crate) fn format(offset: usize, msg: impl Into<String>) -> Self {
        Self::Format {
            offset,
            msg: msg.into(),
        }
    }
}
