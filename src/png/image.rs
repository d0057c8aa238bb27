// Decoded image model: header metadata, optional palette, RGB pixel grid.

use std::fmt;

use super::PngError;

// ---------------------------------------------------------------------------
// Rgb
// ---------------------------------------------------------------------------

/// One RGB triple. Components are bytes, so the 0-255 range holds by
/// construction; [`Rgb::try_from`] guards conversions from wider integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl TryFrom<[i32; 3]> for Rgb {
    type Error = PngError;

    fn try_from(value: [i32; 3]) -> Result<Self, Self::Error> {
        let mut out = [0u8; 3];
        for (i, (&c, slot)) in value.iter().zip(out.iter_mut()).enumerate() {
            *slot = u8::try_from(c).map_err(|_| {
                PngError::Validation(format!(
                    "component {i} of ({}, {}, {}) is outside 0-255",
                    value[0], value[1], value[2]
                ))
            })?;
        }
        Ok(Self::from(out))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// The two supported IHDR colour types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Truecolor,
    Indexed,
}

impl ColorMode {
    /// IHDR colour type byte.
    pub const fn code(self) -> u8 {
        match self {
            Self::Truecolor => 2,
            Self::Indexed => 3,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            2 => Some(Self::Truecolor),
            3 => Some(Self::Indexed),
            _ => None,
        }
    }
}

/// Header metadata of a decoded image, restricted to the simplified profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_mode: ColorMode,
    pub compression: u8,
    pub filter: u8,
    pub interlace: u8,
}

impl Header {
    /// Depth 8 truecolor header, the only profile the encoder writes.
    pub const fn truecolor(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bit_depth: 8,
            color_mode: ColorMode::Truecolor,
            compression: 0,
            filter: 0,
            interlace: 0,
        }
    }

    /// True when the header lies inside the supported profile.
    pub fn is_simplified(&self) -> bool {
        let depth_ok = match self.color_mode {
            ColorMode::Truecolor => self.bit_depth == 8,
            ColorMode::Indexed => matches!(self.bit_depth, 1 | 2 | 4 | 8),
        };
        depth_ok && self.compression == 0 && self.filter == 0 && self.interlace == 0
    }

    /// Distance in bytes to the filter's left neighbour.
    #[inline]
    pub const fn filter_stride(&self) -> usize {
        match self.color_mode {
            ColorMode::Truecolor => 3,
            ColorMode::Indexed => 1,
        }
    }

    /// Bytes of pixel data per scanline, excluding the filter byte.
    pub fn row_bytes(&self) -> usize {
        let width = self.width as usize;
        match self.color_mode {
            ColorMode::Truecolor => width * 3,
            ColorMode::Indexed => (width * self.bit_depth as usize).div_ceil(8),
        }
    }
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// PLTE entries, 1 to 256 colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette(Vec<Rgb>);

impl Palette {
    pub const MAX_ENTRIES: usize = 256;

    pub fn new(entries: Vec<Rgb>) -> Result<Self, PngError> {
        if entries.is_empty() || entries.len() > Self::MAX_ENTRIES {
            return Err(PngError::Validation(format!(
                "palette must hold 1-{} entries, got {}",
                Self::MAX_ENTRIES,
                entries.len()
            )));
        }
        Ok(Self(entries))
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.0.get(index).copied()
    }

    pub fn entries(&self) -> &[Rgb] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// A decoded image: header, optional palette and a rectangular RGB grid
/// stored row-major (`pixels[y][x]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    header: Header,
    palette: Option<Palette>,
    pixels: Vec<Vec<Rgb>>,
}

impl Image {
    /// Build a truecolor image from a pixel grid.
    pub fn from_pixels(pixels: Vec<Vec<Rgb>>) -> Result<Self, PngError> {
        let (width, height) = validate_grid(&pixels)?;
        Ok(Self {
            header: Header::truecolor(width, height),
            palette: None,
            pixels,
        })
    }

    /// Assemble a decoded image. The decoder guarantees the grid matches
    /// the header dimensions.
    pub(crate) fn from_parts(header: Header, palette: Option<Palette>, pixels: Vec<Vec<Rgb>>) -> Self {
        debug_assert_eq!(pixels.len(), header.height as usize);
        Self {
            header,
            palette,
            pixels,
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    pub fn pixels(&self) -> &[Vec<Rgb>] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<Vec<Rgb>> {
        self.pixels
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.header.width as usize
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.header.height as usize
    }

    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Pixel at column `x`, row `y`.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        self.pixels.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Replace the pixel grid.
    ///
    /// The grid must be non-empty and rectangular. On success the image
    /// becomes depth 8 truecolor sized to the new grid and any palette is
    /// dropped. On failure the image is left untouched.
    pub fn set_pixels(&mut self, pixels: Vec<Vec<Rgb>>) -> Result<(), PngError> {
        let (width, height) = validate_grid(&pixels)?;
        self.header = Header::truecolor(width, height);
        self.palette = None;
        self.pixels = pixels;
        Ok(())
    }
}

/// Check a grid is non-empty and rectangular; returns `(width, height)`.
fn validate_grid(pixels: &[Vec<Rgb>]) -> Result<(u32, u32), PngError> {
    let first = pixels
        .first()
        .ok_or_else(|| PngError::Validation("pixel grid has no rows".into()))?;
    if first.is_empty() {
        return Err(PngError::Validation("pixel grid has empty rows".into()));
    }
    if let Some((y, row)) = pixels
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != first.len())
    {
        return Err(PngError::Validation(format!(
            "row {y} has {} pixels, expected {}",
            row.len(),
            first.len()
        )));
    }
    let width = u32::try_from(first.len())
        .map_err(|_| PngError::Validation(format!("width {} too large", first.len())))?;
    let height = u32::try_from(pixels.len())
        .map_err(|_| PngError::Validation(format!("height {} too large", pixels.len())))?;
    Ok((width, height))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: usize, height: usize) -> Vec<Vec<Rgb>> {
        (0..height)
            .map(|y| (0..width).map(|x| Rgb::new(x as u8, y as u8, 7)).collect())
            .collect()
    }

    #[test]
    fn from_pixels_sets_truecolor_header() {
        let img = Image::from_pixels(grid(4, 3)).unwrap();
        assert_eq!(img.header().width, 4);
        assert_eq!(img.header().height, 3);
        assert_eq!(img.header().color_mode, ColorMode::Truecolor);
        assert_eq!(img.header().bit_depth, 8);
        assert_eq!(img.pixel(3, 2), Some(Rgb::new(3, 2, 7)));
        assert_eq!(img.pixel(4, 0), None);
    }

    #[test]
    fn set_pixels_recomputes_dimensions() {
        let mut img = Image::from_pixels(grid(2, 2)).unwrap();
        img.set_pixels(grid(5, 1)).unwrap();
        assert_eq!((img.width(), img.height()), (5, 1));
        assert_eq!(img.pixel_count(), 5);
    }

    #[test]
    fn set_pixels_turns_indexed_into_truecolor() {
        let header = Header {
            bit_depth: 2,
            color_mode: ColorMode::Indexed,
            ..Header::truecolor(2, 2)
        };
        let palette = Palette::new(vec![Rgb::BLACK, Rgb::new(1, 2, 3)]).unwrap();
        let mut img = Image::from_parts(header, Some(palette), grid(2, 2));

        img.set_pixels(grid(3, 1)).unwrap();
        assert_eq!(*img.header(), Header::truecolor(3, 1));
        assert_eq!(img.header().row_bytes(), 9);
        assert!(img.palette().is_none());
    }

    #[test]
    fn set_pixels_rejects_ragged_grid() {
        let mut img = Image::from_pixels(grid(2, 2)).unwrap();
        let mut ragged = grid(3, 3);
        ragged[1].pop();
        let err = img.set_pixels(ragged).unwrap_err();
        assert!(matches!(err, PngError::Validation(ref m) if m.contains("row 1")));
        // Untouched on failure.
        assert_eq!((img.width(), img.height()), (2, 2));
    }

    #[test]
    fn set_pixels_rejects_empty_grid() {
        let mut img = Image::from_pixels(grid(1, 1)).unwrap();
        assert!(img.set_pixels(Vec::new()).is_err());
        assert!(img.set_pixels(vec![Vec::new()]).is_err());
    }

    #[test]
    fn rgb_try_from_checks_range() {
        assert_eq!(Rgb::try_from([0, 128, 255]).unwrap(), Rgb::new(0, 128, 255));
        assert!(matches!(
            Rgb::try_from([256, 0, 0]),
            Err(PngError::Validation(_))
        ));
        assert!(Rgb::try_from([0, -1, 0]).is_err());
    }

    #[test]
    fn row_bytes_per_mode() {
        let tc = Header::truecolor(5, 1);
        assert_eq!(tc.row_bytes(), 15);
        assert_eq!(tc.filter_stride(), 3);

        let idx = Header {
            bit_depth: 2,
            color_mode: ColorMode::Indexed,
            ..Header::truecolor(5, 1)
        };
        assert_eq!(idx.row_bytes(), 2);
        assert_eq!(idx.filter_stride(), 1);
        assert!(idx.is_simplified());
    }

    #[test]
    fn truecolor_requires_depth_eight() {
        let hdr = Header {
            bit_depth: 4,
            ..Header::truecolor(1, 1)
        };
        assert!(!hdr.is_simplified());
    }
}
