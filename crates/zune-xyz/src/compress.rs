/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */
//! Compression capabilities used by the encoder and decoder
//!
//! The payload of an XYZ file is a zlib wrapped DEFLATE stream.
//! By default it is produced with [flate2] at the best compression
//! level and read back with [zune_inflate].
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use zune_core::log::{trace, warn};
use zune_inflate::{DeflateDecoder, DeflateOptions};

use crate::errors::XyzErrors;

/// A function that compresses the plaintext of an XYZ image
///
/// The output must be a zlib wrapped DEFLATE stream, otherwise
/// written images will be corrupted.
///
/// The length of `output` is the capacity the encoder offers. It is
/// advisory: when the compressed result does not fit, an implementation
/// must write nothing and return [`XyzErrors::BufferTooSmall`] so that
/// the encoder can retry with a bigger buffer.
///
/// Closures with a matching signature implement this trait.
pub trait XyzCompressor {
    /// Compress `input` into `output`
    ///
    /// # Returns
    /// - `Ok(usize)`: Number of bytes written to the start of `output`
    /// - `Err(XyzErrors::BufferTooSmall)`: `output` cannot hold the result
    /// - `Err(_)`: Any other failure
    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, XyzErrors>;
}

impl<F> XyzCompressor for F
where
    F: Fn(&[u8], &mut [u8]) -> Result<usize, XyzErrors>
{
    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, XyzErrors> {
        self(input, output)
    }
}

/// A function that decompresses the payload of an XYZ image
pub trait XyzDecompressor {
    /// Decompress `input`, a zlib wrapped DEFLATE stream
    ///
    /// `expected` is the exact size the payload should decompress to,
    /// implementations may use it to bound their output.
    ///
    /// Failures of the backend are reported as [`XyzErrors::CompressionBackendError`],
    /// the caller checks the length of the returned bytes.
    fn decompress(&self, input: &[u8], expected: usize) -> Result<Vec<u8>, XyzErrors>;
}

/// The default compressor, zlib at a configurable level
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DeflateCompressor {
    level: u32
}

impl DeflateCompressor {
    /// Create a compressor using the zlib `level`,
    /// values above `9` are clamped to `9`
    pub fn new(level: u32) -> DeflateCompressor {
        DeflateCompressor {
            level: level.min(9)
        }
    }

    pub const fn level(&self) -> u32 {
        self.level
    }
}

impl Default for DeflateCompressor {
    /// Best compression ratio
    fn default() -> Self {
        DeflateCompressor {
            level: Compression::best().level()
        }
    }
}

impl XyzCompressor for DeflateCompressor {
    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, XyzErrors> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(self.level));

        let compressed = encoder
            .write_all(input)
            .and_then(|_| encoder.finish())
            .map_err(|e| {
                warn!("zlib compression failed: {}", e);
                XyzErrors::CompressionFailed
            })?;

        if compressed.len() > output.len() {
            trace!(
                "Compressed size {} exceeds capacity {}",
                compressed.len(),
                output.len()
            );
            return Err(XyzErrors::BufferTooSmall(compressed.len(), output.len()));
        }
        output[..compressed.len()].copy_from_slice(&compressed);

        Ok(compressed.len())
    }
}

/// The default decompressor, backed by `zune-inflate`
#[derive(Copy, Clone, Debug)]
pub struct InflateDecompressor {
    confirm_checksum: bool
}

impl InflateDecompressor {
    pub const fn new() -> InflateDecompressor {
        InflateDecompressor {
            confirm_checksum: true
        }
    }

    /// Whether the adler32 checksum of the stream should be confirmed
    ///
    /// Default is true
    pub const fn set_confirm_checksum(mut self, yes: bool) -> Self {
        self.confirm_checksum = yes;
        self
    }
}

impl Default for InflateDecompressor {
    fn default() -> Self {
        InflateDecompressor::new()
    }
}

impl XyzDecompressor for InflateDecompressor {
    fn decompress(&self, input: &[u8], expected: usize) -> Result<Vec<u8>, XyzErrors> {
        // oversized streams either hit the limit or come back longer than `expected`
        let options = DeflateOptions::default()
            .set_size_hint(expected)
            .set_limit(expected.saturating_add(1))
            .set_confirm_checksum(self.confirm_checksum);

        let mut decoder = DeflateDecoder::new_with_options(input, options);

        decoder.decode_zlib().map_err(|e| {
            warn!("Inflating the payload failed: {:?}", e);
            XyzErrors::CompressionBackendError
        })
    }
}
