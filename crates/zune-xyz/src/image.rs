/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */
//! The in-memory representation of an XYZ image
use core::fmt::{Debug, Formatter};
use std::sync::Arc;

use zune_core::log::trace;

use crate::compress::{DeflateCompressor, XyzCompressor};
use crate::constants::{
    IMAGE_SIGNATURE, IMAGE_STRUCT_VERSION, RELEASED_SIGNATURE, XYZ_HEADER_SIZE, XYZ_PALETTE_SIZE
};
use crate::errors::XyzErrors;
use crate::format::XyzFormat;
use crate::palette::XyzPalette;

/// Shared handle to a compressor, images can be sent across threads
pub type SharedCompressor = Arc<dyn XyzCompressor + Send + Sync>;

/// An XYZ image
///
/// Holds the dimensions, the pixel format, a 256 entry palette and the raw
/// pixel bytes, `width * height * bytes_per_pixel` of them.
///
/// Images are created by [`alloc`](XyzImage::alloc) (black, all pixels
/// zero) or by the [decoder](crate::XyzDecoder). Every image carries an
/// internal validity marker, once [`release`](XyzImage::release) is called
/// the marker is destroyed and all accessors report
/// [`XyzErrors::InvalidHandle`] (or zero for plain getters).
///
/// # Example
/// ```
/// use zune_xyz::{XyzFormat, XyzImage, XyzPaletteEntry};
///
/// let mut image = XyzImage::alloc(2, 1, XyzFormat::Indexed8).unwrap();
/// image.palette_mut().unwrap()[0] = XyzPaletteEntry::new(255, 0, 0);
/// image.pixels_mut().unwrap().copy_from_slice(&[0, 0]);
///
/// assert_eq!(image.filesize(), 2 + 768 + 8);
/// ```
#[derive(Clone)]
pub struct XyzImage {
    signature:       [u8; 4],
    version:         u32,
    width:           u16,
    height:          u16,
    format:          XyzFormat,
    palette:         XyzPalette,
    pixels:          Vec<u8>,
    compressed_size: usize,
    compressor:      SharedCompressor
}

impl XyzImage {
    /// Create a new, empty (black) image providing a buffer in the
    /// specified format
    ///
    /// # Arguments
    /// - `width`: Width of the image in pixels
    /// - `height`: Height of the image in pixels
    /// - `format`: Pixel format of the image buffer
    ///
    /// # Errors
    /// - [`XyzErrors::FormatNotSupported`]: `format` cannot back a pixel buffer
    /// - [`XyzErrors::OutOfMemory`]: the pixel buffer could not be allocated
    pub fn alloc(width: u16, height: u16, format: XyzFormat) -> Result<XyzImage, XyzErrors> {
        let bytes_per_pixel = format
            .bytes_per_pixel()
            .ok_or(XyzErrors::FormatNotSupported(format))?;

        let size = usize::from(width)
            .checked_mul(usize::from(height))
            .and_then(|x| x.checked_mul(bytes_per_pixel))
            .ok_or(XyzErrors::OutOfMemory)?;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(size)
            .map_err(|_| XyzErrors::OutOfMemory)?;
        pixels.resize(size, 0);

        trace!("Allocated {}x{} image in {:?} format", width, height, format);

        Ok(XyzImage {
            signature: IMAGE_SIGNATURE,
            version: IMAGE_STRUCT_VERSION,
            width,
            height,
            format,
            palette: XyzPalette::default(),
            pixels,
            compressed_size: 0,
            compressor: Arc::new(DeflateCompressor::default())
        })
    }

    /// Check whether the image is still valid
    ///
    /// This only fails once the image was released
    pub fn is_valid(&self) -> bool {
        self.signature == IMAGE_SIGNATURE && self.version == IMAGE_STRUCT_VERSION
    }

    pub(crate) fn check_valid(&self) -> Result<(), XyzErrors> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(XyzErrors::InvalidHandle)
        }
    }

    /// Release the memory held by the image
    ///
    /// The validity marker is destroyed first, after this every operation
    /// on the image reports an invalid handle.
    ///
    /// # Errors
    /// [`XyzErrors::InvalidHandle`] when the image was already released
    pub fn release(&mut self) -> Result<(), XyzErrors> {
        self.check_valid()?;

        self.signature = RELEASED_SIGNATURE;
        self.pixels = Vec::new();
        self.palette = XyzPalette::default();
        self.compressed_size = 0;

        Ok(())
    }

    /// Width of the image, `0` when the image is invalid
    pub fn width(&self) -> u16 {
        if self.is_valid() {
            self.width
        } else {
            0
        }
    }

    /// Height of the image, `0` when the image is invalid
    pub fn height(&self) -> u16 {
        if self.is_valid() {
            self.height
        } else {
            0
        }
    }

    /// Width and height of the image, `(0, 0)` when the image is invalid
    pub fn dimensions(&self) -> (u16, u16) {
        (self.width(), self.height())
    }

    /// Pixel format of the image, [`XyzFormat::None`] when the image is invalid
    pub fn format(&self) -> XyzFormat {
        if self.is_valid() {
            self.format
        } else {
            XyzFormat::None
        }
    }

    /// The palette of the image
    ///
    /// # Errors
    /// - [`XyzErrors::InvalidHandle`]: the image was released
    /// - [`XyzErrors::ImageNotIndexed`]: the pixel format doesn't use a palette
    pub fn palette(&self) -> Result<&XyzPalette, XyzErrors> {
        self.check_valid()?;
        self.check_indexed()?;
        Ok(&self.palette)
    }

    /// The palette of the image for read/write operations
    ///
    /// Same errors as [`palette`](XyzImage::palette)
    pub fn palette_mut(&mut self) -> Result<&mut XyzPalette, XyzErrors> {
        self.check_valid()?;
        self.check_indexed()?;
        Ok(&mut self.palette)
    }

    /// Replace the whole palette
    pub fn set_palette(&mut self, palette: XyzPalette) -> Result<(), XyzErrors> {
        *self.palette_mut()? = palette;
        Ok(())
    }

    fn check_indexed(&self) -> Result<(), XyzErrors> {
        if self.format.is_indexed() {
            Ok(())
        } else {
            Err(XyzErrors::ImageNotIndexed)
        }
    }

    /// The pixel buffer of the image
    ///
    /// For [`XyzFormat::Indexed8`] each byte is an index into the palette,
    /// rows are stored top to bottom without padding.
    pub fn pixels(&self) -> Result<&[u8], XyzErrors> {
        self.check_valid()?;
        Ok(&self.pixels)
    }

    /// The pixel buffer of the image for read/write operations
    ///
    /// The buffer can be modified but not resized
    pub fn pixels_mut(&mut self) -> Result<&mut [u8], XyzErrors> {
        self.check_valid()?;
        Ok(&mut self.pixels)
    }

    /// Overwrite all pixels with `data`
    ///
    /// # Errors
    /// - [`XyzErrors::InvalidHandle`]: the image was released
    /// - [`XyzErrors::LengthMismatch`]: `data` doesn't have exactly
    ///   [`pixels_len`](XyzImage::pixels_len) bytes, the image is left untouched
    pub fn set_pixels(&mut self, data: &[u8]) -> Result<(), XyzErrors> {
        self.check_valid()?;

        if data.len() != self.pixels.len() {
            return Err(XyzErrors::LengthMismatch(self.pixels.len(), data.len()));
        }
        self.pixels.copy_from_slice(data);
        Ok(())
    }

    /// Size of the pixel buffer in bytes, `0` when the image is invalid
    pub fn pixels_len(&self) -> usize {
        if self.is_valid() {
            self.pixels.len()
        } else {
            0
        }
    }

    /// Size of palette plus pixel buffer, the size of the payload before compression
    pub(crate) fn plaintext_len(&self) -> usize {
        XYZ_PALETTE_SIZE + self.pixels.len()
    }

    /// Size the file would have if it was saved uncompressed
    ///
    /// Calculated as `width * height + 256 * 3 + 8`, `0` when the image is invalid
    pub fn filesize(&self) -> usize {
        if !self.is_valid() {
            return 0;
        }
        usize::from(self.width) * usize::from(self.height) + XYZ_PALETTE_SIZE + XYZ_HEADER_SIZE
    }

    /// Size of the compressed file
    ///
    /// After decoding this is the amount of payload bytes read, after encoding
    /// the amount of payload bytes written, plus the 8 header bytes.
    /// For an image that did neither this only accounts for the header.
    ///
    /// `0` when the image is invalid
    pub fn compressed_filesize(&self) -> usize {
        if !self.is_valid() {
            return 0;
        }
        self.compressed_size + XYZ_HEADER_SIZE
    }

    /// Last observed size of the compressed payload, without the header
    ///
    /// `0` when the image is invalid or no I/O happened yet
    pub fn compressed_size_hint(&self) -> usize {
        if self.is_valid() {
            self.compressed_size
        } else {
            0
        }
    }

    pub(crate) fn set_compressed_size(&mut self, size: usize) {
        self.compressed_size = size;
    }

    /// Use a custom compressor for subsequent encodes of this image
    ///
    /// Only for advanced use cases, see [`XyzCompressor`] for the contract
    /// the compressor has to follow.
    pub fn set_compressor<C>(&mut self, compressor: C) -> Result<(), XyzErrors>
    where
        C: XyzCompressor + Send + Sync + 'static
    {
        self.set_shared_compressor(Arc::new(compressor))
    }

    /// Use an already shared compressor for subsequent encodes of this image
    pub fn set_shared_compressor(&mut self, compressor: SharedCompressor) -> Result<(), XyzErrors> {
        self.check_valid()?;
        self.compressor = compressor;
        Ok(())
    }

    /// Go back to the built-in compressor, zlib at the best compression level
    pub fn reset_compressor(&mut self) -> Result<(), XyzErrors> {
        self.set_compressor(DeflateCompressor::default())
    }

    /// The compressor the next encode will use
    pub fn compressor(&self) -> Result<SharedCompressor, XyzErrors> {
        self.check_valid()?;
        Ok(Arc::clone(&self.compressor))
    }
}

impl Debug for XyzImage {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("XyzImage")
            .field("valid", &self.is_valid())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("pixels_len", &self.pixels.len())
            .field("compressed_size", &self.compressed_size)
            .finish()
    }
}
