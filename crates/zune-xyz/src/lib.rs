/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */
//! Decoding and encoding the XYZ indexed color image format
//!
//! XYZ stores a 256 color palette and one palette index per pixel,
//! the whole payload is zlib compressed. It has the following format:
//! ```text
//! ╔════════╤═════════════════════════════════════════════════════════╗
//! ║ Bytes  │ Description                                             ║
//! ╠════════╪═════════════════════════════════════════════════════════╣
//! ║ 4      │ "XYZ1" magic value                                      ║
//! ╟────────┼─────────────────────────────────────────────────────────╢
//! ║ 2      │ 16-Bit LE unsigned integer (width)                      ║
//! ╟────────┼─────────────────────────────────────────────────────────╢
//! ║ 2      │ 16-Bit LE unsigned integer (height)                     ║
//! ╟────────┼─────────────────────────────────────────────────────────╢
//! ║ [...]  │ zlib stream, to end of file, which inflates to:         ║
//! ║ 768    │   256 x [R, G, B] palette entries                       ║
//! ║ [1]    │   palette index / pixel, row-major                      ║
//! ╚════════╧═════════════════════════════════════════════════════════╝
//!```
//! The length of the compressed stream is not stored, a decoder reads
//! until the source is exhausted.
//!
//! # Features
//! - Decoding and encoding from memory, files or any custom channel
//! - Pluggable compression
//! - Fuzz tested
//!
//! # Example
//! ```
//! use zune_core::bytestream::ZCursor;
//! use zune_xyz::{XyzErrors, XyzFormat, XyzImage, XyzPaletteEntry};
//!
//! fn main() -> Result<(), XyzErrors> {
//!     let mut image = XyzImage::alloc(2, 1, XyzFormat::Indexed8)?;
//!     image.palette_mut()?[0] = XyzPaletteEntry::new(255, 0, 0);
//!
//!     let mut file: Vec<u8> = vec![];
//!     zune_xyz::encode(&mut image, &mut file)?;
//!
//!     let decoded = zune_xyz::decode(ZCursor::new(&file))?;
//!     assert_eq!(decoded.dimensions(), (2, 1));
//!     assert_eq!(decoded.palette()?[0], XyzPaletteEntry::new(255, 0, 0));
//!     Ok(())
//! }
//! ```
#![macro_use]

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub use channel::*;
pub use compress::*;
pub use constants::{XYZ_HEADER_SIZE, XYZ_MAGIC, XYZ_PALETTE_ENTRIES, XYZ_PALETTE_SIZE};
pub use decoder::*;
pub use encoder::*;
pub use errors::*;
pub use format::*;
pub use image::*;
pub use palette::*;
use zune_core::log::warn;
pub use zune_core;

mod channel;
mod compress;
mod constants;
mod decoder;
mod encoder;
mod errors;
mod format;
mod image;
mod palette;

/// Decode an image from `source`
///
/// A shorthand for [`XyzDecoder::new`] followed by [`XyzDecoder::decode`]
pub fn decode<T: XyzReader>(source: T) -> Result<XyzImage, XyzErrors> {
    XyzDecoder::new(source).decode()
}

/// Encode `image` into `sink` with the compressor configured on the image
///
/// Returns the number of bytes written
pub fn encode<T: XyzWriter>(image: &mut XyzImage, sink: T) -> Result<usize, XyzErrors> {
    XyzEncoder::new(image).encode(sink)
}

/// Decode the image stored in the file at `path`
///
/// A file that cannot be opened is reported as [`XyzErrors::BadHandle`]
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<XyzImage, XyzErrors> {
    let channel = match File::open(path.as_ref()) {
        Ok(file) => XyzChannel::new(BufReader::new(file)),
        Err(e) => {
            warn!("Could not open {:?}: {}", path.as_ref(), e);
            XyzChannel::detached()
        }
    };
    decode(channel)
}

/// Encode `image` into a file at `path`, truncating an existing file
///
/// A file that cannot be created is reported as [`XyzErrors::BadHandle`],
/// the file is not touched when `image` is invalid.
pub fn encode_file<P: AsRef<Path>>(image: &mut XyzImage, path: P) -> Result<usize, XyzErrors> {
    image.check_valid()?;

    let channel = match File::create(path.as_ref()) {
        Ok(file) => XyzChannel::new(BufWriter::new(file)),
        Err(e) => {
            warn!("Could not create {:?}: {}", path.as_ref(), e);
            XyzChannel::detached()
        }
    };
    encode(image, channel)
}
