//! Oxibrain: an interpreter and converter for a tape language and two
//! image dialects that encode it in PNG pixels.
//!
//! The crate provides:
//! - A simplified PNG codec (`png`)
//! - The tape compiler and machine (`tape`)
//! - Image <-> program transcoders (`transcode`)
//! - Dialect detection (`detect`) and file-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use oxibrain::{png, tape, transcode};
//!
//! let image = transcode::path::encode("++++++++[>++++++++<-]>+.").unwrap();
//! let bytes = png::encode(&image).unwrap();
//!
//! let program = transcode::path::decode(&png::decode(&bytes).unwrap());
//! let mut out = Vec::new();
//! tape::run_source(&program, &mut out, &mut tape::BoundInput::new(Vec::<u8>::new())).unwrap();
//! assert_eq!(out, b"A");
//! ```

pub mod detect;
pub mod io;
pub mod png;
pub mod tape;
pub mod transcode;

#[cfg(feature = "cli")]
pub mod cli;
