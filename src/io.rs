// Source loading and output writing.
//
// Ties the codec, the transcoders and the tape machine together for
// callers that work with files and standard streams: read a source,
// resolve its dialect, turn it into program text or into another dialect,
// and write the result.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::detect::{self, Dialect};
use crate::png::{self, Image, PngError};
use crate::tape::{self, TapeError};
use crate::transcode::{self, TranscodeError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file-level operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("image error: {0}")]
    Png(#[from] PngError),

    #[error("program error: {0}")]
    Tape(#[from] TapeError),

    #[error("transcode error: {0}")]
    Transcode(#[from] TranscodeError),

    /// A text source handed to an image dialect, or the other way round.
    #[error("expected {expected} source, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("colour output needs a host image")]
    MissingHost,

    #[error("output file exists, use -f to overwrite: {}", .0.display())]
    OutputExists(PathBuf),
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// A loaded source, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Text(String),
    Image(Image),
}

impl Source {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
        }
    }
}

/// Read all bytes from a file, or from stdin when `path` is `None`.
pub fn read_bytes(path: Option<&Path>) -> Result<Vec<u8>, IoError> {
    let mut bytes = Vec::new();
    match path {
        Some(path) => {
            File::open(path)?.read_to_end(&mut bytes)?;
        }
        None => {
            io::stdin().lock().read_to_end(&mut bytes)?;
        }
    }
    Ok(bytes)
}

/// Interpret raw bytes as a source of `dialect`, detecting it when `None`.
///
/// Auto-detection decodes anything carrying the PNG signature, so a
/// damaged image is reported as such instead of being run as text.
pub fn load(bytes: Vec<u8>, dialect: Option<Dialect>) -> Result<(Dialect, Source), IoError> {
    let dialect = match dialect {
        Some(d) => d,
        None if detect::looks_like_png(&bytes) => {
            let image = png::decode(&bytes)?;
            let d = detect::classify(&image);
            return Ok((d, Source::Image(image)));
        }
        None => Dialect::Tape,
    };

    let source = if dialect.is_image() {
        Source::Image(png::decode(&bytes)?)
    } else {
        // Non-UTF-8 bytes can only sit in comments or bound input.
        Source::Text(String::from_utf8_lossy(&bytes).into_owned())
    };
    log::debug!("loaded {} source as {dialect}", source.kind());
    Ok((dialect, source))
}

/// [`read_bytes`] followed by [`load`].
pub fn load_path(path: Option<&Path>, dialect: Option<Dialect>) -> Result<(Dialect, Source), IoError> {
    load(read_bytes(path)?, dialect)
}

/// Program text of a source read in `dialect`.
///
/// Tape text is returned unchanged, bound input included.
pub fn to_program(source: &Source, dialect: Dialect) -> Result<String, IoError> {
    match (source, dialect) {
        (Source::Text(text), Dialect::Tape) => Ok(text.clone()),
        (Source::Image(image), Dialect::Path) => Ok(transcode::path::decode(image)),
        (Source::Image(image), Dialect::Color) => Ok(transcode::color::decode(image)),
        (source, dialect) => Err(IoError::TypeMismatch {
            expected: if dialect.is_image() { "image" } else { "text" },
            found: source.kind(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Running and converting
// ---------------------------------------------------------------------------

/// Run a source, writing program output to `out`.
///
/// `,` reads the bound input when the program text has one, stdin
/// otherwise.
pub fn run<W: Write + ?Sized>(source: &Source, dialect: Dialect, out: &mut W) -> Result<tape::Tape, IoError> {
    let program = to_program(source, dialect)?;
    let mut stdin = tape::Interactive::stdin();
    Ok(tape::run_source(&program, out, &mut stdin)?)
}

/// Result of a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Text(String),
    Png(Vec<u8>),
}

impl Output {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Png(bytes) => bytes,
        }
    }
}

/// Summary of a conversion, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertStats {
    pub source: Dialect,
    pub output: Dialect,
    /// Instructions carried over.
    pub instructions: usize,
    /// Pixel dimensions of an image output.
    pub dimensions: Option<(usize, usize)>,
    pub output_size: usize,
}

/// Convert a source into `target`.
///
/// Image targets drop the bound input and comments; `host` is required
/// for the colour dialect. Converting text to text keeps it verbatim.
pub fn convert(
    source: &Source,
    from: Dialect,
    target: Dialect,
    host: Option<&Image>,
) -> Result<(Output, ConvertStats), IoError> {
    let program = to_program(source, from)?;
    let code = tape::preprocess(&program).program;
    let instructions = tape::compiler::instructions(code).count();

    let image = match target {
        Dialect::Tape => None,
        Dialect::Path => Some(transcode::path::encode(code)?),
        Dialect::Color => {
            let host = host.ok_or(IoError::MissingHost)?;
            Some(transcode::color::encode(code, host)?)
        }
    };

    let (output, dimensions) = match image {
        Some(image) => (
            Output::Png(png::encode(&image)?),
            Some((image.width(), image.height())),
        ),
        None => (Output::Text(program), None),
    };

    let stats = ConvertStats {
        source: from,
        output: target,
        instructions,
        dimensions,
        output_size: output.as_bytes().len(),
    };
    log::info!("converted {from} -> {target}: {instructions} instructions");
    Ok((output, stats))
}

/// Write `data` to a file, or to stdout when `path` is `None`.
///
/// An existing file is only replaced when `force` is set.
pub fn write_output(path: Option<&Path>, data: &[u8], force: bool) -> Result<(), IoError> {
    match path {
        Some(path) => {
            if path.exists() && !force {
                return Err(IoError::OutputExists(path.to_path_buf()));
            }
            let mut w = BufWriter::new(File::create(path)?);
            w.write_all(data)?;
            w.flush()?;
        }
        None => {
            let mut out = io::stdout().lock();
            out.write_all(data)?;
            out.flush()?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::png::Rgb;

    const CAT: &str = ",[.,]!hi";

    fn path_png(program: &str) -> Vec<u8> {
        png::encode(&transcode::path::encode(program).unwrap()).unwrap()
    }

    #[test]
    fn load_detects_text() {
        let (d, src) = load(b"+++.".to_vec(), None).unwrap();
        assert_eq!(d, Dialect::Tape);
        assert_eq!(src, Source::Text("+++.".into()));
    }

    #[test]
    fn load_detects_path_image() {
        let (d, src) = load(path_png("+++."), None).unwrap();
        assert_eq!(d, Dialect::Path);
        assert_eq!(to_program(&src, d).unwrap(), "+++.");
    }

    #[test]
    fn damaged_png_is_an_error() {
        let mut bytes = path_png("+");
        let n = bytes.len();
        bytes[n - 5] ^= 0xFF;
        assert!(matches!(load(bytes, None), Err(IoError::Png(_))));
    }

    #[test]
    fn text_as_image_mismatch() {
        let src = Source::Text("+".into());
        let err = to_program(&src, Dialect::Path).unwrap_err();
        assert!(matches!(
            err,
            IoError::TypeMismatch {
                expected: "image",
                found: "text"
            }
        ));
    }

    #[test]
    fn image_as_text_mismatch() {
        let img = Image::from_pixels(vec![vec![Rgb::BLACK]]).unwrap();
        let err = to_program(&Source::Image(img), Dialect::Tape).unwrap_err();
        assert!(matches!(err, IoError::TypeMismatch { found: "image", .. }));
    }

    #[test]
    fn run_uses_bound_input() {
        let mut out = Vec::new();
        run(&Source::Text(CAT.into()), Dialect::Tape, &mut out).unwrap_err();
        // The third `,` finds the bound input exhausted.
        assert_eq!(out, b"hi");
    }

    #[test]
    fn convert_text_to_path_drops_input() {
        let (out, stats) = convert(&Source::Text(CAT.into()), Dialect::Tape, Dialect::Path, None).unwrap();
        let Output::Png(bytes) = out else {
            panic!("expected image output");
        };
        let img = png::decode(&bytes).unwrap();
        assert_eq!(transcode::path::decode(&img), ",[.,]");
        assert_eq!(stats.instructions, 5);
        assert_eq!(stats.dimensions, Some((5, 1)));
        assert_eq!(stats.output_size, bytes.len());
    }

    #[test]
    fn convert_to_color_needs_host() {
        let src = Source::Text("+".into());
        assert!(matches!(
            convert(&src, Dialect::Tape, Dialect::Color, None),
            Err(IoError::MissingHost)
        ));

        let host = Image::from_pixels(vec![vec![Rgb::new(10, 20, 30); 3]; 3]).unwrap();
        let (out, _) = convert(&src, Dialect::Tape, Dialect::Color, Some(&host)).unwrap();
        let img = png::decode(out.as_bytes()).unwrap();
        assert_eq!(transcode::color::decode(&img), "+");
    }

    #[test]
    fn convert_image_to_text() {
        let (d, src) = load(path_png("-[>]"), None).unwrap();
        let (out, stats) = convert(&src, d, Dialect::Tape, None).unwrap();
        assert_eq!(out, Output::Text("-[>]".into()));
        assert_eq!(stats.dimensions, None);
    }

    #[test]
    fn write_output_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_output(Some(&path), b"one", false).unwrap();
        assert!(matches!(
            write_output(Some(&path), b"two", false),
            Err(IoError::OutputExists(_))
        ));
        write_output(Some(&path), b"two", true).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"two");
    }

    #[test]
    fn read_bytes_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prog.b");
        std::fs::write(&path, b"+.").unwrap();
        let (d, src) = load_path(Some(&path), Some(Dialect::Tape)).unwrap();
        assert_eq!(d, Dialect::Tape);
        assert_eq!(src, Source::Text("+.".into()));
    }
}
