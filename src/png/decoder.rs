// PNG decoder: chunk stream -> inflate -> unfilter -> pixels.

use std::io::Read;

use flate2::read::ZlibDecoder;

use super::PngError;
use super::chunk::ChunkStream;
use super::filter::{self, FilterType};
use super::image::{ColorMode, Header, Image, Palette, Rgb};

/// Decode a simplified PNG file held in memory.
pub fn decode(bytes: &[u8]) -> Result<Image, PngError> {
    let stream = ChunkStream::parse(bytes)?;
    let header = stream.header;
    let offset = stream.idat_offset();
    log::debug!(
        "decoding {}x{} {:?} depth {} ({} chunks)",
        header.width,
        header.height,
        header.color_mode,
        header.bit_depth,
        stream.chunks.len()
    );

    if header.color_mode == ColorMode::Indexed && stream.palette.is_none() {
        return Err(PngError::format(offset, "indexed image without PLTE chunk"));
    }

    let needed = scanline_bytes(&header, offset)?;
    let inflated = inflate(&stream.idat(), needed)?;
    let rows = unfilter_scanlines(&header, &inflated, needed, offset)?;

    let pixels = match (header.color_mode, &stream.palette) {
        (ColorMode::Indexed, Some(palette)) => resolve_indexed(&header, palette, &rows, offset)?,
        _ => rows
            .iter()
            .map(|row| {
                row.chunks_exact(3)
                    .map(|p| Rgb::new(p[0], p[1], p[2]))
                    .collect()
            })
            .collect(),
    };

    Ok(Image::from_parts(header, stream.palette, pixels))
}

/// Filtered image size announced by the header: one filter byte plus
/// `row_bytes` per scanline.
fn scanline_bytes(header: &Header, offset: usize) -> Result<usize, PngError> {
    (header.row_bytes() + 1)
        .checked_mul(header.height as usize)
        .ok_or_else(|| PngError::format(offset, "image dimensions overflow"))
}

/// Inflate the concatenated IDAT payload, stopping one byte past `limit`.
///
/// The extra byte only tells surplus data apart from an exact fit.
fn inflate(data: &[u8], limit: usize) -> Result<Vec<u8>, PngError> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .take(limit as u64 + 1)
        .read_to_end(&mut out)
        .map_err(PngError::Decompression)?;
    Ok(out)
}

/// Split the inflated stream into scanlines and reverse their filters.
fn unfilter_scanlines(
    header: &Header,
    inflated: &[u8],
    needed: usize,
    offset: usize,
) -> Result<Vec<Vec<u8>>, PngError> {
    let row_bytes = header.row_bytes();
    let line = row_bytes + 1;
    let height = header.height as usize;
    if inflated.len() < needed {
        return Err(PngError::format(
            offset,
            format!(
                "image data has {} bytes, {height} scanlines need {needed}",
                inflated.len()
            ),
        ));
    }
    if inflated.len() > needed {
        log::debug!("ignoring image data past {needed} bytes");
    }

    let stride = header.filter_stride();
    let zero = vec![0u8; row_bytes];
    let mut rows: Vec<Vec<u8>> = Vec::with_capacity(height);
    for (y, scan) in inflated[..needed].chunks_exact(line).enumerate() {
        let filter_type = FilterType::from_byte(scan[0]).ok_or_else(|| {
            PngError::format(offset, format!("unknown filter type {} on row {y}", scan[0]))
        })?;
        let mut row = scan[1..].to_vec();
        let prev = rows.last().map_or(zero.as_slice(), Vec::as_slice);
        filter::unfilter(filter_type, &mut row, prev, stride);
        rows.push(row);
    }
    Ok(rows)
}

/// Unpack `8 / depth` indices per byte, most significant bits first.
fn unpack_indices(row: &[u8], depth: u8, width: usize) -> impl Iterator<Item = usize> + '_ {
    let per_byte = 8 / depth;
    let mask = ((1u16 << depth) - 1) as u8;
    row.iter()
        .flat_map(move |&byte| {
            (0..per_byte).map(move |i| ((byte >> (8 - depth * (i + 1))) & mask) as usize)
        })
        .take(width)
}

fn resolve_indexed(
    header: &Header,
    palette: &Palette,
    rows: &[Vec<u8>],
    offset: usize,
) -> Result<Vec<Vec<Rgb>>, PngError> {
    let width = header.width as usize;
    rows.iter()
        .enumerate()
        .map(|(y, row)| {
            unpack_indices(row, header.bit_depth, width)
                .enumerate()
                .map(|(x, index)| {
                    palette.get(index).ok_or_else(|| {
                        PngError::format(
                            offset,
                            format!(
                                "palette index {index} at ({x}, {y}) out of range ({} entries)",
                                palette.len()
                            ),
                        )
                    })
                })
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    use super::*;
    use crate::png::chunk::{Chunk, IDAT, IEND, IHDR, Ihdr, PLTE, PNG_SIGNATURE};

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn build(ihdr: Ihdr, palette: Option<&[u8]>, raw: &[u8]) -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();
        Chunk::write(&mut out, &IHDR, &ihdr.to_bytes()).unwrap();
        if let Some(p) = palette {
            Chunk::write(&mut out, &PLTE, p).unwrap();
        }
        Chunk::write(&mut out, &IDAT, &zlib(raw)).unwrap();
        Chunk::write(&mut out, &IEND, &[]).unwrap();
        out
    }

    fn indexed(width: u32, height: u32, depth: u8) -> Ihdr {
        Ihdr {
            width,
            height,
            bit_depth: depth,
            color_type: 3,
            compression: 0,
            filter: 0,
            interlace: 0,
        }
    }

    fn truecolor(width: u32, height: u32) -> Ihdr {
        Ihdr::from(&Header::truecolor(width, height))
    }

    const PAL: [u8; 12] = [0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255];

    #[test]
    fn truecolor_unfiltered() {
        let raw = [0, 1, 2, 3, 4, 5, 6, 0, 7, 8, 9, 10, 11, 12];
        let img = decode(&build(truecolor(2, 2), None, &raw)).unwrap();
        assert_eq!(img.pixel(0, 0), Some(Rgb::new(1, 2, 3)));
        assert_eq!(img.pixel(1, 1), Some(Rgb::new(10, 11, 12)));
    }

    #[test]
    fn indexed_depth_two_unpacks_msb_first() {
        // 0b00_01_10_11 -> indices 0 1 2 3; width 3 drops the last.
        let img = decode(&build(indexed(3, 1, 2), Some(&PAL), &[0, 0b0001_1011])).unwrap();
        assert_eq!(
            img.pixels()[0],
            vec![Rgb::new(0, 0, 0), Rgb::new(255, 0, 0), Rgb::new(0, 255, 0)]
        );
        assert_eq!(img.header().color_mode, ColorMode::Indexed);
        assert_eq!(img.palette().map(Palette::len), Some(4));
    }

    #[test]
    fn indexed_depth_one_and_four() {
        let img = decode(&build(indexed(9, 1, 1), Some(&PAL), &[0, 0b1010_0000, 0b1000_0000])).unwrap();
        let reds: Vec<bool> = img.pixels()[0].iter().map(|p| p.r == 255).collect();
        assert_eq!(
            reds,
            vec![true, false, true, false, false, false, false, false, true]
        );

        let img = decode(&build(indexed(2, 1, 4), Some(&PAL), &[0, 0x32])).unwrap();
        assert_eq!(img.pixels()[0], vec![Rgb::new(0, 0, 255), Rgb::new(0, 255, 0)]);
    }

    #[test]
    fn indexed_index_out_of_range() {
        let err = decode(&build(indexed(1, 1, 8), Some(&PAL), &[0, 4])).unwrap_err();
        assert!(matches!(err, PngError::Format { ref msg, .. } if msg.contains("(0, 0)")));
    }

    #[test]
    fn indexed_requires_palette() {
        assert!(decode(&build(indexed(1, 1, 8), None, &[0, 0])).is_err());
    }

    #[test]
    fn indexed_sub_filter_uses_single_byte_stride() {
        // Sub on indices: raw 1, 1 -> 1, 2.
        let img = decode(&build(indexed(2, 1, 8), Some(&PAL), &[1, 1, 1])).unwrap();
        assert_eq!(img.pixels()[0], vec![Rgb::new(255, 0, 0), Rgb::new(0, 255, 0)]);
    }

    #[test]
    fn rejects_unknown_filter() {
        let err = decode(&build(truecolor(1, 1), None, &[5, 0, 0, 0])).unwrap_err();
        assert!(matches!(err, PngError::Format { ref msg, .. } if msg.contains("row 0")));
    }

    #[test]
    fn rejects_short_image_data() {
        assert!(decode(&build(truecolor(2, 2), None, &[0, 1, 2, 3])).is_err());
    }

    #[test]
    fn rejects_corrupt_zlib() {
        let mut out = PNG_SIGNATURE.to_vec();
        Chunk::write(&mut out, &IHDR, &truecolor(1, 1).to_bytes()).unwrap();
        Chunk::write(&mut out, &IDAT, b"definitely not zlib").unwrap();
        Chunk::write(&mut out, &IEND, &[]).unwrap();
        assert!(matches!(decode(&out), Err(PngError::Decompression(_))));
    }

    #[test]
    fn split_idat_chunks_are_joined() {
        let data = zlib(&[0, 9, 8, 7]);
        let (a, b) = data.split_at(data.len() / 2);
        let mut out = PNG_SIGNATURE.to_vec();
        Chunk::write(&mut out, &IHDR, &truecolor(1, 1).to_bytes()).unwrap();
        Chunk::write(&mut out, &IDAT, a).unwrap();
        Chunk::write(&mut out, &IDAT, b).unwrap();
        Chunk::write(&mut out, &IEND, &[]).unwrap();
        assert_eq!(decode(&out).unwrap().pixel(0, 0), Some(Rgb::new(9, 8, 7)));
    }

    #[test]
    fn surplus_image_data_is_not_inflated() {
        // 1x1 image followed by 16 MiB of zeros, with a broken checksum at
        // the very end of the stream. Only the first scanline is read, so
        // the checksum is never reached.
        let mut raw = vec![0, 9, 8, 7];
        raw.resize(16 << 20, 0);
        let mut data = zlib(&raw);
        let n = data.len();
        data[n - 1] ^= 0xFF;

        let mut out = PNG_SIGNATURE.to_vec();
        Chunk::write(&mut out, &IHDR, &truecolor(1, 1).to_bytes()).unwrap();
        Chunk::write(&mut out, &IDAT, &data).unwrap();
        Chunk::write(&mut out, &IEND, &[]).unwrap();
        assert!(out.len() < 64 * 1024);
        assert_eq!(decode(&out).unwrap().pixel(0, 0), Some(Rgb::new(9, 8, 7)));
    }

    #[test]
    fn inflate_stops_past_limit() {
        let data = zlib(&[1u8; 4096]);
        assert_eq!(inflate(&data, 10).unwrap().len(), 11);
        assert_eq!(inflate(&data, 8192).unwrap().len(), 4096);
    }
}
