/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Errors possible when reading, writing or manipulating XYZ images
use core::fmt::{Debug, Display, Formatter};

use crate::format::XyzFormat;

/// Possible errors that may occur during decoding, encoding
/// or when accessing an image
///
/// The set is flat, every failure maps to exactly one variant.
/// A fixed human readable sentence for each kind can be retrieved
/// via [`message`](XyzErrors::message)
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum XyzErrors {
    /// A channel has no underlying source or sink
    BadHandle,
    /// The stream does not start with the `XYZ1` magic
    ///
    /// The argument holds the four bytes found instead
    BadHeader([u8; 4]),
    /// The compressed payload did not end after two reads
    /// of `256 * 3 + width * height` bytes each
    ///
    /// The argument is the number of bytes consumed before giving up
    PayloadTooLarge(usize),
    /// The payload decompressed to fewer bytes than the header promises
    ///
    /// # Arguments
    /// - 1st argument is the number of bytes we expected
    /// - 2nd argument is the number of bytes actually produced
    PayloadTruncated(usize, usize),
    /// The DEFLATE backend was unable to decompress the payload
    CompressionBackendError,
    /// The compression step during saving failed
    CompressionFailed,
    /// The output buffer handed to a compressor cannot hold the result
    ///
    /// # Arguments
    /// - 1st argument is the number of bytes needed, `0` when unknown
    /// - 2nd argument is the capacity that was available
    BufferTooSmall(usize, usize),
    /// The requested format is not supported by this library version
    FormatNotSupported(XyzFormat),
    /// The palette can only be accessed for formats that are indexed
    ImageNotIndexed,
    /// A memory allocation failed
    OutOfMemory,
    /// The channel failed to read for a reason other than exhaustion
    ReadFailed,
    /// The channel wrote fewer bytes than requested
    WriteFailed,
    /// The source was exhausted
    ///
    /// The argument is the number of bytes read before the source ran dry,
    /// these bytes are valid and already stored in the caller's buffer
    EndOfStream(usize),
    /// The image was released or was never fully constructed
    InvalidHandle,
    /// A buffer handed to the image doesn't match the image size
    ///
    /// # Arguments
    /// - 1st argument is the expected length
    /// - 2nd argument is the length found
    LengthMismatch(usize, usize),
    /// A dimension is above the configured decoder limit
    ///
    /// # Arguments
    /// - which dimension, `"width"` or `"height"`
    /// - the value found in the header
    /// - the configured limit
    DimensionsTooLarge(&'static str, usize, usize)
}

impl XyzErrors {
    /// Convert the error kind to a textual representation
    ///
    /// The message depends only on the kind, not on the values
    /// carried by it, use the `Display` implementation for those.
    pub const fn message(&self) -> &'static str {
        match self {
            XyzErrors::BadHandle => "At least one mandatory handle has no underlying source or sink.",
            XyzErrors::BadHeader(_) => "The file does not have a XYZ1 magic.",
            XyzErrors::PayloadTooLarge(_) => {
                "The compressed image exceeds the size of 256 * 3 + width * height by a factor of 2 or more."
            }
            XyzErrors::PayloadTruncated(_, _) => {
                "The image is truncated (size < 256 * 3 + width * height after decompression)."
            }
            XyzErrors::CompressionBackendError => "The DEFLATE backend was unable to decompress the image.",
            XyzErrors::CompressionFailed => "The compression step during saving failed.",
            XyzErrors::BufferTooSmall(_, _) => "The passed buffer is not large enough.",
            XyzErrors::FormatNotSupported(_) => {
                "The requested format is not supported by this library version."
            }
            XyzErrors::ImageNotIndexed => {
                "The palette can only be accessed for color formats that are indexed."
            }
            XyzErrors::OutOfMemory => "A memory allocation failed.",
            XyzErrors::ReadFailed => "A read error occurred.",
            XyzErrors::WriteFailed => "Saving the picture failed due to a write error.",
            XyzErrors::EndOfStream(_) => "The end of the input was reached.",
            XyzErrors::InvalidHandle => "The passed XYZ image is invalid.",
            XyzErrors::LengthMismatch(_, _) => "The passed buffer does not match the image size.",
            XyzErrors::DimensionsTooLarge(_, _, _) => {
                "The image dimensions exceed the configured limits."
            }
        }
    }
}

impl Debug for XyzErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            XyzErrors::BadHeader(found) => {
                writeln!(f, "Wrong magic bytes, expected `XYZ1` but found {found:?}")
            }
            XyzErrors::PayloadTooLarge(consumed) => {
                writeln!(
                    f,
                    "Compressed payload not exhausted after reading {consumed} bytes"
                )
            }
            XyzErrors::PayloadTruncated(expected, found) => {
                writeln!(
                    f,
                    "Truncated payload, expected {expected} bytes after decompression but found {found}"
                )
            }
            XyzErrors::BufferTooSmall(needed, capacity) => {
                if *needed == 0 {
                    writeln!(f, "Buffer of {capacity} bytes is too small")
                } else {
                    writeln!(
                        f,
                        "Buffer too small, needed {needed} bytes but capacity is {capacity}"
                    )
                }
            }
            XyzErrors::FormatNotSupported(format) => {
                writeln!(f, "Format {format:?} is not supported")
            }
            XyzErrors::EndOfStream(read) => {
                writeln!(f, "End of stream reached after {read} bytes")
            }
            XyzErrors::LengthMismatch(expected, found) => {
                writeln!(f, "Length mismatch, expected {expected} bytes but found {found}")
            }
            XyzErrors::DimensionsTooLarge(which, value, limit) => {
                writeln!(
                    f,
                    "Image {which} {value} greater than max configured {which} {limit}"
                )
            }
            other => writeln!(f, "{}", other.message())
        }
    }
}

impl Display for XyzErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

impl std::error::Error for XyzErrors {}

#[cfg(test)]
mod tests {
    use crate::{XyzErrors, XyzFormat};

    #[test]
    fn messages_ignore_payload() {
        assert_eq!(
            XyzErrors::PayloadTruncated(10, 2).message(),
            XyzErrors::PayloadTruncated(0, 0).message()
        );
        assert_eq!(
            XyzErrors::BadHeader(*b"XYZ2").message(),
            "The file does not have a XYZ1 magic."
        );
    }

    #[test]
    fn display_carries_details() {
        let err = XyzErrors::FormatNotSupported(XyzFormat::None).to_string();
        assert!(err.contains("None"));

        let err = XyzErrors::DimensionsTooLarge("width", 300, 200).to_string();
        assert!(err.contains("300") && err.contains("200"));
    }
}
