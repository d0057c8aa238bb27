// Scanline filters (PNG spec, section 9).
//
// Each scanline starts with a filter type byte; the remaining bytes are
// deltas against a predictor built from already reconstructed bytes:
//
//   c b      a = byte `stride` to the left in the current row
//   a x      b = byte above, c = byte above-left
//
// Reconstruction is `x = raw + predictor (mod 256)`. Neighbours outside
// the image are zero.

/// Per-scanline filter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    None,
    Sub,
    Up,
    Average,
    Paeth,
}

impl FilterType {
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::None),
            1 => Some(Self::Sub),
            2 => Some(Self::Up),
            3 => Some(Self::Average),
            4 => Some(Self::Paeth),
            _ => None,
        }
    }

    pub const fn as_byte(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Sub => 1,
            Self::Up => 2,
            Self::Average => 3,
            Self::Paeth => 4,
        }
    }
}

/// Paeth predictor. The tie order a, b, c is mandated by the format.
#[inline]
pub const fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let (ia, ib, ic) = (a as i16, b as i16, c as i16);
    let p = ia + ib - ic;
    let pa = (p - ia).abs();
    let pb = (p - ib).abs();
    let pc = (p - ic).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

#[inline]
fn predict(filter: FilterType, a: u8, b: u8, c: u8) -> u8 {
    match filter {
        FilterType::None => 0,
        FilterType::Sub => a,
        FilterType::Up => b,
        FilterType::Average => ((u16::from(a) + u16::from(b)) / 2) as u8,
        FilterType::Paeth => paeth_predictor(a, b, c),
    }
}

/// Reverse `filter` on `row` in place.
///
/// `prev` is the reconstructed previous scanline (all zeros above the
/// first row) and must be as long as `row`.
pub fn unfilter(filter: FilterType, row: &mut [u8], prev: &[u8], stride: usize) {
    debug_assert_eq!(row.len(), prev.len());
    if filter == FilterType::None {
        return;
    }
    for i in 0..row.len() {
        let a = if i >= stride { row[i - stride] } else { 0 };
        let b = prev[i];
        let c = if i >= stride { prev[i - stride] } else { 0 };
        row[i] = row[i].wrapping_add(predict(filter, a, b, c));
    }
}

/// Apply `filter` to a raw scanline, the inverse of [`unfilter`].
///
/// The encoder always writes filter type 0; this is used to build
/// filtered fixtures and by the benchmarks.
pub fn filter(filter: FilterType, row: &[u8], prev: &[u8], stride: usize) -> Vec<u8> {
    debug_assert_eq!(row.len(), prev.len());
    (0..row.len())
        .map(|i| {
            let a = if i >= stride { row[i - stride] } else { 0 };
            let b = prev[i];
            let c = if i >= stride { prev[i - stride] } else { 0 };
            row[i].wrapping_sub(predict(filter, a, b, c))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
