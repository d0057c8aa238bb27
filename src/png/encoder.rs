// PNG encoder. Always writes the simplified truecolor profile: depth 8,
// colour type 2, one IDAT chunk of unfiltered scanlines.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;

use super::PngError;
use super::chunk::{Chunk, IDAT, IEND, IHDR, Ihdr, PNG_SIGNATURE};
use super::filter::FilterType;
use super::image::{Header, Image};

/// Encode `image` as a truecolor PNG, whatever its source colour mode.
pub fn encode(image: &Image) -> Result<Vec<u8>, PngError> {
    let mut out = Vec::new();
    encode_to(&mut out, image)?;
    Ok(out)
}

/// Encode `image` into a writer.
pub fn encode_to<W: Write>(w: &mut W, image: &Image) -> Result<(), PngError> {
    let header = Header::truecolor(image.header().width, image.header().height);

    let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
    for row in image.pixels() {
        zlib.write_all(&[FilterType::None.as_byte()])?;
        for pixel in row {
            zlib.write_all(&pixel.to_bytes())?;
        }
    }
    let idat = zlib.finish()?;
    log::debug!(
        "encoding {}x{} truecolor, {} compressed bytes",
        header.width,
        header.height,
        idat.len()
    );

    w.write_all(&PNG_SIGNATURE)?;
    Chunk::write(w, &IHDR, &Ihdr::from(&header).to_bytes())?;
    Chunk::write(w, &IDAT, &idat)?;
    Chunk::write(w, &IEND, &[])?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
