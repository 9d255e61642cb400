/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use zune_core::log::{error, trace, warn};

use crate::channel::XyzWriter;
use crate::compress::XyzCompressor;
use crate::constants::{XYZ_HEADER_SIZE, XYZ_MAGIC, XYZ_PALETTE_SIZE};
use crate::errors::XyzErrors;
use crate::image::XyzImage;

/// An XYZ image encoder
///
/// Writes the magic, little endian width and height and the compressed
/// palette plus pixels.
///
/// The compressor is first offered an output buffer the size of the
/// uncompressed payload. If it reports [`XyzErrors::BufferTooSmall`] it
/// is retried once with twice the capacity, a second failure is reported
/// as [`XyzErrors::CompressionFailed`].
///
/// # Example
/// - Encode a 100 by 100 image
///
/// ```
/// use zune_xyz::{XyzEncoder, XyzErrors, XyzFormat, XyzImage};
///
/// fn main() -> Result<(), XyzErrors> {
///     let mut image = XyzImage::alloc(100, 100, XyzFormat::Indexed8)?;
///     image.pixels_mut()?.iter_mut().enumerate().for_each(|(i, px)| *px = (i % 256) as u8);
///
///     let mut sink: Vec<u8> = vec![];
///     let written = XyzEncoder::new(&mut image).encode(&mut sink)?;
///     assert_eq!(written, sink.len());
///     Ok(())
/// }
/// ```
pub struct XyzEncoder<'a> {
    image:      &'a mut XyzImage,
    compressor: Option<&'a dyn XyzCompressor>
}

impl<'a> XyzEncoder<'a> {
    /// Create a new encoder for `image`
    ///
    /// The encoder updates the compressed size hint of the image
    pub fn new(image: &'a mut XyzImage) -> XyzEncoder<'a> {
        XyzEncoder {
            image,
            compressor: None
        }
    }

    /// Use `compressor` for this encoder only instead of the
    /// one configured on the image
    pub fn set_compressor(&mut self, compressor: &'a dyn XyzCompressor) {
        self.compressor = Some(compressor);
    }

    /// Return the maximum number of bytes a successful encode can write
    ///
    /// `0` for an invalid image
    pub fn max_size(&self) -> usize {
        if !self.image.is_valid() {
            return 0;
        }
        XYZ_HEADER_SIZE + 2 * self.image.plaintext_len()
    }

    /// Encode the image into `sink`
    ///
    /// # Returns
    /// - Ok(size): Bytes written to the sink, header included
    /// - Err: The error encountered during encoding, the sink may
    ///   have received a partial file
    pub fn encode<T: XyzWriter>(&mut self, mut sink: T) -> Result<usize, XyzErrors> {
        self.image.check_valid()?;

        if !sink.is_attached() {
            return Err(XyzErrors::BadHandle);
        }
        let format = self.image.format();

        if !format.is_encodable() {
            return Err(XyzErrors::FormatNotSupported(format));
        }

        let plaintext = self.plaintext()?;
        let compressed = self.compress(&plaintext)?;
        drop(plaintext);

        self.image.set_compressed_size(compressed.len());

        let mut written = write_all(&mut sink, &XYZ_MAGIC)?;
        written += write_all(&mut sink, &self.image.width().to_le_bytes())?;
        written += write_all(&mut sink, &self.image.height().to_le_bytes())?;
        written += write_all(&mut sink, &compressed)?;

        sink.xyz_flush()?;

        trace!("Wrote {} bytes", written);

        Ok(written)
    }

    /// Palette followed by the pixels, the payload before compression
    fn plaintext(&self) -> Result<Vec<u8>, XyzErrors> {
        let pixels = self.image.pixels()?;
        let mut plaintext = zeroed_buffer(self.image.plaintext_len())?;

        let (palette_bytes, pixel_bytes) = plaintext.split_at_mut(XYZ_PALETTE_SIZE);

        self.image.palette()?.write_bytes(palette_bytes)?;
        pixel_bytes.copy_from_slice(pixels);

        Ok(plaintext)
    }

    fn compress(&self, plaintext: &[u8]) -> Result<Vec<u8>, XyzErrors> {
        let shared;
        let compressor: &dyn XyzCompressor = match self.compressor {
            Some(compressor) => compressor,
            None => {
                shared = self.image.compressor()?;
                &*shared
            }
        };

        let capacity = plaintext.len();
        let mut output = zeroed_buffer(capacity)?;

        let size = match compressor.compress(plaintext, &mut output) {
            Ok(size) => size,
            Err(XyzErrors::BufferTooSmall(needed, _)) => {
                let doubled = capacity.checked_mul(2).ok_or(XyzErrors::OutOfMemory)?;

                trace!(
                    "Compressed output doesn't fit in {} bytes (needs {}), retrying with {}",
                    capacity,
                    needed,
                    doubled
                );
                output = zeroed_buffer(doubled)?;

                compressor.compress(plaintext, &mut output).map_err(|e| {
                    error!("Compression failed with doubled capacity {}: {:?}", doubled, e);
                    XyzErrors::CompressionFailed
                })?
            }
            Err(e) => return Err(e)
        };

        if size == 0 || size > output.len() {
            warn!(
                "Compressor reported {} bytes for a buffer of {}",
                size,
                output.len()
            );
            return Err(XyzErrors::CompressionFailed);
        }
        output.truncate(size);

        trace!("Plaintext size: {}, compressed size: {}", capacity, size);

        Ok(output)
    }
}

fn write_all<T: XyzWriter>(sink: &mut T, buf: &[u8]) -> Result<usize, XyzErrors> {
    let written = sink.xyz_write(buf)?;

    if written != buf.len() {
        warn!("Sink accepted {} of {} bytes", written, buf.len());
        return Err(XyzErrors::WriteFailed);
    }
    Ok(written)
}

fn zeroed_buffer(size: usize) -> Result<Vec<u8>, XyzErrors> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(size)
        .map_err(|_| XyzErrors::OutOfMemory)?;
    buffer.resize(size, 0);
    Ok(buffer)
}
