/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use zune_core::bit_depth::BitDepth;
use zune_core::log::{trace, warn};
use zune_core::options::DecoderOptions;

use crate::channel::XyzReader;
use crate::compress::{InflateDecompressor, XyzDecompressor};
use crate::constants::{XYZ_MAGIC, XYZ_PALETTE_SIZE};
use crate::errors::XyzErrors;
use crate::format::XyzFormat;
use crate::image::XyzImage;
use crate::palette::XyzPalette;

/// Where the decoder currently is, used for tracing failures
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum DecodeStage {
    ReadMagic,
    ReadDimensions,
    ProbePayload,
    Decompress,
    Validate,
    Done
}

/// Result of asking the channel to fill a buffer
enum Fill {
    Complete,
    /// The source ran dry after this many bytes
    Exhausted(usize)
}

/// An XYZ image decoder
///
/// The decoder is initialized by calling `new`
/// and either of [`decode_headers`] to decode the header
/// or [`decode`] to return a fully populated [`XyzImage`]
///
/// The length of the compressed payload is not stored in the file,
/// the decoder reads until the source signals the end of the stream.
/// A first read asks for `256 * 3 + width * height` bytes, the size
/// of the payload once decompressed. If the source is not exhausted by
/// then, a single additional read of the same size is made. A source that
/// still isn't exhausted is rejected with [`XyzErrors::PayloadTooLarge`].
///
/// [`decode_headers`]:XyzDecoder::decode_headers
/// [`decode`]:XyzDecoder::decode
pub struct XyzDecoder<T>
where
    T: XyzReader
{
    width:           u16,
    height:          u16,
    decoded_headers: bool,
    compressed_len:  Option<usize>,
    stage:           DecodeStage,
    stream:          T,
    options:         DecoderOptions,
    decompressor:    Box<dyn XyzDecompressor + Send + Sync>
}

impl<T> XyzDecoder<T>
where
    T: XyzReader
{
    /// Create a new XYZ decoder accepting every size the format can express
    ///
    /// Other options keep their defaults, the decoder is lenient towards
    /// channels that return short reads without signaling and does not
    /// confirm the zlib checksum.
    ///
    /// # Example
    ///
    /// ```
    /// use zune_core::bytestream::ZCursor;
    /// use zune_xyz::XyzDecoder;
    /// let mut decoder = XyzDecoder::new(ZCursor::new([0_u8; 0]));
    /// // additional code
    /// ```
    pub fn new(data: T) -> XyzDecoder<T> {
        let options = DecoderOptions::default()
            .set_max_width(usize::from(u16::MAX))
            .set_max_height(usize::from(u16::MAX));

        XyzDecoder::new_with_options(data, options)
    }

    /// Create a new XYZ decoder that obeys specified restrictions
    ///
    /// E.g can be used to set width and height limits to prevent OOM attacks
    ///
    /// - `strict_mode` makes unsignaled short reads fail with [`XyzErrors::ReadFailed`]
    /// - `inflate_confirm_adler` makes the default decompressor check the zlib checksum
    ///
    /// # Example
    /// ```
    /// use zune_core::bytestream::ZCursor;
    /// use zune_core::options::DecoderOptions;
    /// use zune_xyz::XyzDecoder;
    /// // only decode images less than 10 in both width and height
    ///
    /// let options = DecoderOptions::default().set_max_width(10).set_max_height(10);
    ///
    /// let mut decoder = XyzDecoder::new_with_options(ZCursor::new([0_u8; 0]), options);
    /// ```
    pub fn new_with_options(data: T, options: DecoderOptions) -> XyzDecoder<T> {
        XyzDecoder {
            width: 0,
            height: 0,
            decoded_headers: false,
            compressed_len: None,
            stage: DecodeStage::ReadMagic,
            stream: data,
            decompressor: Box::new(
                InflateDecompressor::new().set_confirm_checksum(options.inflate_get_confirm_adler())
            ),
            options
        }
    }

    /// Use a different backend to decompress the payload
    pub fn set_decompressor<D>(&mut self, decompressor: D)
    where
        D: XyzDecompressor + Send + Sync + 'static
    {
        self.decompressor = Box::new(decompressor);
    }

    /// Decode the XYZ header storing width and height into
    /// the decoder instance
    ///
    /// # Errors
    /// - [`XyzErrors::BadHandle`]: the channel isn't attached to a source
    /// - [`XyzErrors::BadHeader`]: the stream doesn't start with `XYZ1`
    /// - [`XyzErrors::EndOfStream`]: the stream ended inside the header
    /// - [`XyzErrors::DimensionsTooLarge`]: a dimension exceeds the configured limits
    pub fn decode_headers(&mut self) -> Result<(), XyzErrors> {
        if !self.stream.is_attached() {
            return Err(XyzErrors::BadHandle);
        }
        self.set_stage(DecodeStage::ReadMagic);

        let magic = self.read_header_bytes::<4>()?;

        if magic != XYZ_MAGIC {
            return Err(XyzErrors::BadHeader(magic));
        }

        self.set_stage(DecodeStage::ReadDimensions);
        // little endian, whatever the host is
        let width = u16::from_le_bytes(self.read_header_bytes::<2>()?);
        let height = u16::from_le_bytes(self.read_header_bytes::<2>()?);

        if usize::from(width) > self.options.max_width() {
            return Err(XyzErrors::DimensionsTooLarge(
                "width",
                usize::from(width),
                self.options.max_width()
            ));
        }
        if usize::from(height) > self.options.max_height() {
            return Err(XyzErrors::DimensionsTooLarge(
                "height",
                usize::from(height),
                self.options.max_height()
            ));
        }

        self.width = width;
        self.height = height;

        trace!("Image width: {:?}", self.width);
        trace!("Image height: {:?}", self.height);
        self.decoded_headers = true;

        Ok(())
    }

    /// Decode the XYZ image from the stream
    ///
    /// # Returns
    /// - On success: A valid image in [`XyzFormat::Indexed8`] format
    /// - On error: The reason the image could not be decoded, no image
    ///   is returned in that case
    pub fn decode(&mut self) -> Result<XyzImage, XyzErrors> {
        let result = self.decode_inner();

        match &result {
            Ok(_) => self.set_stage(DecodeStage::Done),
            Err(e) => warn!("Decoding failed in stage {:?}: {:?}", self.stage, e)
        }
        result
    }

    fn decode_inner(&mut self) -> Result<XyzImage, XyzErrors> {
        if !self.decoded_headers {
            self.decode_headers()?;
        }
        // allocate before touching the payload, failures below drop it
        let mut image = XyzImage::alloc(self.width, self.height, XyzFormat::Indexed8)?;
        let expected = image.plaintext_len();

        self.set_stage(DecodeStage::ProbePayload);
        let compressed = self.probe_payload(expected)?;

        self.compressed_len = Some(compressed.len());
        image.set_compressed_size(compressed.len());

        self.set_stage(DecodeStage::Decompress);
        let decompressed = self.decompressor.decompress(&compressed, expected)?;
        drop(compressed);

        if decompressed.len() < expected {
            return Err(XyzErrors::PayloadTruncated(expected, decompressed.len()));
        }
        if decompressed.len() > expected {
            warn!(
                "Payload decompresses to more than {} bytes, expected exactly that",
                expected
            );
            return Err(XyzErrors::CompressionBackendError);
        }

        self.set_stage(DecodeStage::Validate);
        let (palette, pixels) = decompressed.split_at(XYZ_PALETTE_SIZE);

        image.set_palette(XyzPalette::from_bytes(palette)?)?;
        image.set_pixels(pixels)?;

        trace!("Finished decoding image");

        Ok(image)
    }

    /// Read the compressed payload whose length is not known up front
    ///
    /// `chunk` is the decompressed size, used as the first guess
    fn probe_payload(&mut self, chunk: usize) -> Result<Vec<u8>, XyzErrors> {
        let mut compressed = zeroed_buffer(chunk)?;

        let consumed = match self.fill(&mut compressed)? {
            Fill::Exhausted(read) => read,
            Fill::Complete => {
                let doubled = chunk.checked_mul(2).ok_or(XyzErrors::OutOfMemory)?;

                trace!(
                    "Payload not exhausted after {} bytes, growing buffer to {}",
                    chunk,
                    doubled
                );
                compressed
                    .try_reserve_exact(chunk)
                    .map_err(|_| XyzErrors::OutOfMemory)?;
                compressed.resize(doubled, 0);

                match self.fill(&mut compressed[chunk..])? {
                    Fill::Exhausted(read) => chunk + read,
                    Fill::Complete => return Err(XyzErrors::PayloadTooLarge(doubled))
                }
            }
        };
        compressed.truncate(consumed);

        trace!("Compressed payload size: {}", consumed);

        Ok(compressed)
    }

    fn set_stage(&mut self, stage: DecodeStage) {
        trace!("Decoder stage: {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    fn read_header_bytes<const N: usize>(&mut self) -> Result<[u8; N], XyzErrors> {
        let mut bytes = [0; N];

        match self.fill(&mut bytes)? {
            Fill::Complete => Ok(bytes),
            Fill::Exhausted(read) => Err(XyzErrors::EndOfStream(read))
        }
    }

    /// Ask the channel to fill `buf`, separating exhaustion from failure
    fn fill(&mut self, buf: &mut [u8]) -> Result<Fill, XyzErrors> {
        let wanted = buf.len();

        match self.stream.xyz_read(buf) {
            Ok(read) if read == wanted => Ok(Fill::Complete),
            Ok(read) if read > wanted => {
                warn!("Channel claims {} bytes were read into a {} byte buffer", read, wanted);
                Err(XyzErrors::ReadFailed)
            }
            Ok(read) => {
                if self.options.strict_mode() {
                    warn!(
                        "Channel returned {} of {} bytes without signaling the end of the stream",
                        read,
                        wanted
                    );
                    return Err(XyzErrors::ReadFailed);
                }
                warn!(
                    "Channel returned {} of {} bytes without a signal, treating it as end of stream",
                    read,
                    wanted
                );
                Ok(Fill::Exhausted(read))
            }
            Err(XyzErrors::EndOfStream(read)) => Ok(Fill::Exhausted(read.min(wanted))),
            Err(e) => Err(e)
        }
    }

    /// Return XYZ bit depth
    ///
    /// This is always 8, one palette index per pixel
    ///
    /// # Example
    ///
    /// ```
    /// use zune_core::bit_depth::BitDepth;
    /// use zune_core::bytestream::ZCursor;
    /// use zune_xyz::XyzDecoder;
    /// let decoder = XyzDecoder::new(ZCursor::new([0_u8; 0]));
    /// assert_eq!(decoder.bit_depth(), BitDepth::Eight)
    /// ```
    pub const fn bit_depth(&self) -> BitDepth {
        BitDepth::Eight
    }

    /// Return the width and height of the image
    ///
    /// Or none if the headers haven't been decoded
    pub const fn dimensions(&self) -> Option<(u16, u16)> {
        if self.decoded_headers {
            return Some((self.width, self.height));
        }
        None
    }

    /// Size of the compressed payload consumed by the last decode
    ///
    /// Or none if no payload was read yet
    pub const fn compressed_len(&self) -> Option<usize> {
        self.compressed_len
    }

    /// Return the channel the decoder reads from
    pub fn into_inner(self) -> T {
        self.stream
    }
}

fn zeroed_buffer(size: usize) -> Result<Vec<u8>, XyzErrors> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(size)
        .map_err(|_| XyzErrors::OutOfMemory)?;
    buffer.resize(size, 0);
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use zune_core::bytestream::ZCursor;
    use zune_core::options::DecoderOptions;

    use crate::{ReadFn, XyzDecoder, XyzDecompressor, XyzErrors, XyzPaletteEntry};

    /// Magic, then a single byte per call without ever signaling the end
    fn trickling_source() -> ReadFn<impl FnMut(&mut [u8]) -> Result<usize, XyzErrors>> {
        let mut header = Some(*b"XYZ1");

        ReadFn(move |buf: &mut [u8]| match header.take() {
            Some(magic) => {
                buf.copy_from_slice(&magic);
                Ok(4)
            }
            None => {
                buf[0] = 0;
                Ok(1)
            }
        })
    }

    /// A 1x1 image, palette entry 0 is red and the pixel points at it
    fn one_pixel_file() -> Vec<u8> {
        let mut plaintext = vec![0; 768 + 1];
        plaintext[0] = 255;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&plaintext).unwrap();

        let mut file = b"XYZ1\x01\x00\x01\x00".to_vec();
        file.extend(encoder.finish().unwrap());
        file
    }

    #[test]
    fn header_is_little_endian() {
        let data = [b'X', b'Y', b'Z', b'1', 0x34, 0x12, 0x02, 0x01];
        let mut decoder = XyzDecoder::new(ZCursor::new(data));

        decoder.decode_headers().unwrap();
        assert_eq!(decoder.dimensions(), Some((0x1234, 0x0102)));
    }

    #[test]
    fn short_header_is_end_of_stream() {
        let mut decoder = XyzDecoder::new(ZCursor::new(b"XYZ1\x01"));
        assert_eq!(decoder.decode_headers(), Err(XyzErrors::EndOfStream(1)));
        assert_eq!(decoder.dimensions(), None);
    }

    #[test]
    fn limits_are_respected() {
        let data = [b'X', b'Y', b'Z', b'1', 11, 0, 1, 0];
        let options = DecoderOptions::default()
            .set_max_width(10)
            .set_max_height(10);
        let mut decoder = XyzDecoder::new_with_options(ZCursor::new(data), options);

        assert_eq!(
            decoder.decode().unwrap_err(),
            XyzErrors::DimensionsTooLarge("width", 11, 10)
        );
    }

    #[test]
    fn read_failure_is_propagated() {
        let mut decoder = XyzDecoder::new(ReadFn(|_: &mut [u8]| Err(XyzErrors::ReadFailed)));
        assert_eq!(decoder.decode().unwrap_err(), XyzErrors::ReadFailed);
    }

    #[test]
    fn unsignaled_short_read_is_end_of_stream_by_default() {
        let mut decoder = XyzDecoder::new(trickling_source());
        assert_eq!(decoder.decode_headers(), Err(XyzErrors::EndOfStream(1)));

        let mut decoder = XyzDecoder::new_with_options(trickling_source(), DecoderOptions::default());
        assert_eq!(decoder.decode_headers(), Err(XyzErrors::EndOfStream(1)));
    }

    #[test]
    fn unsignaled_short_read_fails_in_strict_mode() {
        let options = DecoderOptions::default().set_strict_mode(true);
        let mut decoder = XyzDecoder::new_with_options(trickling_source(), options);

        assert_eq!(decoder.decode_headers(), Err(XyzErrors::ReadFailed));
    }

    #[test]
    fn overreporting_channel_fails() {
        let source = ReadFn(|buf: &mut [u8]| -> Result<usize, XyzErrors> {
            buf.fill(b'X');
            Ok(buf.len() + 5)
        });
        let mut decoder = XyzDecoder::new(source);

        assert_eq!(decoder.decode_headers(), Err(XyzErrors::ReadFailed));
    }

    #[test]
    fn custom_decompressor_is_used() {
        struct Blue;

        impl XyzDecompressor for Blue {
            fn decompress(&self, input: &[u8], expected: usize) -> Result<Vec<u8>, XyzErrors> {
                assert_eq!(input, b"not zlib");

                let mut plaintext = vec![0; expected];
                plaintext[2] = 255;
                Ok(plaintext)
            }
        }
        let mut file = b"XYZ1\x01\x00\x01\x00".to_vec();
        file.extend_from_slice(b"not zlib");

        let mut decoder = XyzDecoder::new(ZCursor::new(file));
        decoder.set_decompressor(Blue);

        let image = decoder.decode().unwrap();
        assert_eq!(image.palette().unwrap()[0], XyzPaletteEntry::new(0, 0, 255));
        assert_eq!(image.pixels().unwrap(), &[0]);
    }

    #[test]
    fn checksum_is_confirmed_when_asked() {
        let mut file = one_pixel_file();
        let last = file.len() - 1;
        file[last] ^= 0xFF;

        let image = XyzDecoder::new(ZCursor::new(&file)).decode().unwrap();
        assert_eq!(image.palette().unwrap()[0], XyzPaletteEntry::new(255, 0, 0));

        let options = DecoderOptions::default().inflate_set_confirm_adler(true);
        let mut decoder = XyzDecoder::new_with_options(ZCursor::new(&file), options);

        assert_eq!(
            decoder.decode().unwrap_err(),
            XyzErrors::CompressionBackendError
        );
    }
}
