/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

/// The pixel format of an image buffer
///
/// During writing, the only format understood by the XYZ
/// file format is [`Indexed8`](XyzFormat::Indexed8), other
/// formats are rejected at allocation and again at encode time.
///
/// Per-format properties live in a single table, adding a new
/// format means adding a variant and a row there.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum XyzFormat {
    /// No format specified
    ///
    /// This is what an invalid image reports
    #[default]
    None,
    /// Default XYZ format: 1 byte per pixel referencing
    /// 256 colors in the palette
    Indexed8
}

struct FormatInfo {
    format:          XyzFormat,
    /// `None` marks a tag that cannot back a pixel buffer
    bytes_per_pixel: Option<usize>,
    indexed:         bool,
    encodable:       bool
}

const FORMAT_TABLE: [FormatInfo; 2] = [
    FormatInfo {
        format:          XyzFormat::None,
        bytes_per_pixel: None,
        indexed:         false,
        encodable:       false
    },
    FormatInfo {
        format:          XyzFormat::Indexed8,
        bytes_per_pixel: Some(1),
        indexed:         true,
        encodable:       true
    }
];

impl XyzFormat {
    fn info(self) -> Option<&'static FormatInfo> {
        FORMAT_TABLE.iter().find(|info| info.format == self)
    }

    /// Number of bytes a single pixel occupies in this format
    ///
    /// # Returns
    /// - `Some(bytes)`: The format can be allocated
    /// - `None`: The format is not supported by this library version
    pub fn bytes_per_pixel(self) -> Option<usize> {
        self.info().and_then(|info| info.bytes_per_pixel)
    }

    /// Whether pixels in this format reference the palette
    pub fn is_indexed(self) -> bool {
        self.info().map_or(false, |info| info.indexed)
    }

    /// Whether an image in this format can be written to an XYZ stream
    pub fn is_encodable(self) -> bool {
        self.info().map_or(false, |info| info.encodable)
    }
}

#[cfg(test)]
mod tests {
    use crate::XyzFormat;

    #[test]
    fn indexed8_lookup() {
        assert_eq!(XyzFormat::Indexed8.bytes_per_pixel(), Some(1));
        assert!(XyzFormat::Indexed8.is_indexed());
        assert!(XyzFormat::Indexed8.is_encodable());
    }

    #[test]
    fn none_is_not_allocatable() {
        assert_eq!(XyzFormat::None.bytes_per_pixel(), None);
        assert!(!XyzFormat::None.is_indexed());
        assert!(!XyzFormat::None.is_encodable());
    }
}
