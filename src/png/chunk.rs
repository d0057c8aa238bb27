// PNG signature and chunk framing.
//
// A chunk is `length (u32 BE) | type (4 bytes) | data | CRC32(type ‖ data)`.
// Parsing walks an explicit cursor over the in-memory file; the whole
// file is available before decoding starts.

use std::fmt;
use std::io::{self, Write};

use super::PngError;
use super::image::{ColorMode, Header, Palette, Rgb};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

pub const IHDR: [u8; 4] = *b"IHDR";
pub const PLTE: [u8; 4] = *b"PLTE";
pub const IDAT: [u8; 4] = *b"IDAT";
pub const IEND: [u8; 4] = *b"IEND";

/// CRC32 of the data-less IEND chunk.
pub const IEND_CRC: u32 = 0xAE42_6082;

/// IHDR payload size.
pub const IHDR_LEN: usize = 13;

/// Largest legal chunk length (2^31 - 1).
pub const MAX_CHUNK_LEN: u32 = 0x7FFF_FFFF;

/// Largest PLTE payload: 256 entries of 3 bytes.
const MAX_PLTE_LEN: usize = Palette::MAX_ENTRIES * 3;

// ---------------------------------------------------------------------------
// CRC
// ---------------------------------------------------------------------------

/// CRC32 over a chunk's type and data, as stored after the data.
pub fn crc32(kind: &[u8; 4], data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(kind);
    crc.update(data);
    crc.sum()
}

// ---------------------------------------------------------------------------
// Byte cursor
// ---------------------------------------------------------------------------

/// Forward-only cursor over a byte buffer. Errors carry the offset at
/// which the read was attempted.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Take the next `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], PngError> {
        if n > self.remaining() {
            return Err(PngError::format(
                self.pos,
                format!(
                    "unexpected end of file: need {n} bytes, {} left",
                    self.remaining()
                ),
            ));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PngError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u32_be(&mut self) -> Result<u32, PngError> {
        self.read_array::<4>().map(u32::from_be_bytes)
    }
}

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// Generic chunk record with a verified CRC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Byte offset of the length field in the file.
    pub offset: usize,
    pub kind: [u8; 4],
    pub data: Vec<u8>,
    pub crc: u32,
}

impl Chunk {
    /// Read one chunk and verify its CRC.
    pub fn read(r: &mut ByteReader<'_>) -> Result<Self, PngError> {
        let offset = r.position();
        let length = r.read_u32_be()?;
        if length > MAX_CHUNK_LEN {
            return Err(PngError::format(
                offset,
                format!("chunk length {length} exceeds {MAX_CHUNK_LEN}"),
            ));
        }
        let kind = r.read_array::<4>()?;
        let data = r.take(length as usize)?.to_vec();
        let crc = r.read_u32_be()?;

        let computed = crc32(&kind, &data);
        if computed != crc {
            return Err(PngError::format(
                offset,
                format!(
                    "{} chunk CRC mismatch: stored {crc:#010X}, computed {computed:#010X}",
                    kind_name(&kind)
                ),
            ));
        }

        log::trace!("chunk {} at {offset}, {length} bytes", kind_name(&kind));
        Ok(Self {
            offset,
            kind,
            data,
            crc,
        })
    }

    /// Write one chunk, computing its CRC.
    pub fn write<W: Write>(w: &mut W, kind: &[u8; 4], data: &[u8]) -> io::Result<()> {
        let length = u32::try_from(data.len())
            .ok()
            .filter(|&len| len <= MAX_CHUNK_LEN)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("chunk data too large: {} bytes", data.len()),
                )
            })?;
        w.write_all(&length.to_be_bytes())?;
        w.write_all(kind)?;
        w.write_all(data)?;
        w.write_all(&crc32(kind, data).to_be_bytes())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @{} len={} crc={:08X}",
            kind_name(&self.kind),
            self.offset,
            self.data.len(),
            self.crc
        )
    }
}

fn kind_name(kind: &[u8; 4]) -> String {
    String::from_utf8_lossy(kind).into_owned()
}

// ---------------------------------------------------------------------------
// IHDR
// ---------------------------------------------------------------------------

/// Raw IHDR fields, before checking them against the supported profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ihdr {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub compression: u8,
    pub filter: u8,
    pub interlace: u8,
}

impl Ihdr {
    pub fn parse(chunk: &Chunk) -> Result<Self, PngError> {
        let d = &chunk.data;
        if d.len() != IHDR_LEN {
            return Err(PngError::format(
                chunk.offset,
                format!("IHDR payload is {} bytes, expected {IHDR_LEN}", d.len()),
            ));
        }
        Ok(Self {
            width: u32::from_be_bytes([d[0], d[1], d[2], d[3]]),
            height: u32::from_be_bytes([d[4], d[5], d[6], d[7]]),
            bit_depth: d[8],
            color_type: d[9],
            compression: d[10],
            filter: d[11],
            interlace: d[12],
        })
    }

    pub fn to_bytes(&self) -> [u8; IHDR_LEN] {
        let mut out = [0u8; IHDR_LEN];
        out[0..4].copy_from_slice(&self.width.to_be_bytes());
        out[4..8].copy_from_slice(&self.height.to_be_bytes());
        out[8] = self.bit_depth;
        out[9] = self.color_type;
        out[10] = self.compression;
        out[11] = self.filter;
        out[12] = self.interlace;
        out
    }

    /// Check the fields against the supported profile.
    pub fn to_header(&self, offset: usize) -> Result<Header, PngError> {
        if self.width == 0 || self.height == 0 {
            return Err(PngError::format(
                offset,
                format!("zero image dimension {}x{}", self.width, self.height),
            ));
        }
        let color_mode = ColorMode::from_code(self.color_type).ok_or_else(|| {
            PngError::format(
                offset,
                format!(
                    "unsupported colour type {} (only truecolor 2 and indexed 3)",
                    self.color_type
                ),
            )
        })?;
        let header = Header {
            width: self.width,
            height: self.height,
            bit_depth: self.bit_depth,
            color_mode,
            compression: self.compression,
            filter: self.filter,
            interlace: self.interlace,
        };
        if !header.is_simplified() {
            return Err(PngError::format(
                offset,
                format!(
                    "not a simplified PNG: depth {}, colour type {}, compression {}, filter {}, interlace {}",
                    self.bit_depth, self.color_type, self.compression, self.filter, self.interlace
                ),
            ));
        }
        Ok(header)
    }
}

impl From<&Header> for Ihdr {
    fn from(h: &Header) -> Self {
        Self {
            width: h.width,
            height: h.height,
            bit_depth: h.bit_depth,
            color_type: h.color_mode.code(),
            compression: h.compression,
            filter: h.filter,
            interlace: h.interlace,
        }
    }
}

// ---------------------------------------------------------------------------
// PLTE
// ---------------------------------------------------------------------------

pub fn parse_palette(chunk: &Chunk) -> Result<Palette, PngError> {
    let d = &chunk.data;
    if d.is_empty() || d.len() % 3 != 0 || d.len() > MAX_PLTE_LEN {
        return Err(PngError::format(
            chunk.offset,
            format!(
                "PLTE payload must be a non-zero multiple of 3 up to {MAX_PLTE_LEN} bytes, got {}",
                d.len()
            ),
        ));
    }
    let entries = d
        .chunks_exact(3)
        .map(|c| Rgb::new(c[0], c[1], c[2]))
        .collect();
    Palette::new(entries)
}

// ---------------------------------------------------------------------------
// Chunk stream
// ---------------------------------------------------------------------------

/// A parsed file: typed IHDR/PLTE records plus every other chunk up to IEND.
#[derive(Debug, Clone)]
pub struct ChunkStream {
    pub header: Header,
    pub palette: Option<Palette>,
    /// IDAT and any other non-IEND chunks, in file order.
    pub chunks: Vec<Chunk>,
}

impl ChunkStream {
    pub fn parse(bytes: &[u8]) -> Result<Self, PngError> {
        let mut r = ByteReader::new(bytes);
        let signature = r.take(PNG_SIGNATURE.len())?;
        if signature != PNG_SIGNATURE {
            return Err(PngError::format(0, "signature doesn't match"));
        }

        let mut header: Option<Header> = None;
        let mut palette: Option<Palette> = None;
        let mut chunks = Vec::new();

        loop {
            let chunk = Chunk::read(&mut r)?;
            match chunk.kind {
                IHDR => {
                    if header.is_some() {
                        return Err(PngError::format(chunk.offset, "duplicate IHDR chunk"));
                    }
                    header = Some(Ihdr::parse(&chunk)?.to_header(chunk.offset)?);
                }
                _ if header.is_none() => {
                    return Err(PngError::format(
                        chunk.offset,
                        format!("first chunk is {}, expected IHDR", kind_name(&chunk.kind)),
                    ));
                }
                PLTE => {
                    if palette.is_some() {
                        return Err(PngError::format(chunk.offset, "duplicate PLTE chunk"));
                    }
                    palette = Some(parse_palette(&chunk)?);
                }
                IEND => {
                    if !chunk.is_empty() {
                        return Err(PngError::format(
                            chunk.offset,
                            format!("IEND carries {} data bytes", chunk.len()),
                        ));
                    }
                    break;
                }
                _ => chunks.push(chunk),
            }
        }

        if r.remaining() > 0 {
            log::debug!("ignoring {} trailing bytes after IEND", r.remaining());
        }

        // The loop only breaks after IHDR has been seen.
        let header = header.ok_or_else(|| PngError::format(PNG_SIGNATURE.len(), "missing IHDR"))?;
        Ok(Self {
            header,
            palette,
            chunks,
        })
    }

    /// Concatenated payload of every IDAT chunk.
    pub fn idat(&self) -> Vec<u8> {
        self.chunks
            .iter()
            .filter(|c| c.kind == IDAT)
            .flat_map(|c| c.data.iter().copied())
            .collect()
    }

    /// Offset of the first IDAT chunk, for error context.
    pub fn idat_offset(&self) -> usize {
        self.chunks
            .iter()
            .find(|c| c.kind == IDAT)
            .map_or(PNG_SIGNATURE.len(), |c| c.offset)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
