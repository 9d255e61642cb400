/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use core::ops::{Index, IndexMut};

use crate::constants::{XYZ_PALETTE_ENTRIES, XYZ_PALETTE_SIZE};
use crate::errors::XyzErrors;

/// The color information of one palette entry
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct XyzPaletteEntry {
    /// Red color component
    pub red:   u8,
    /// Green color component
    pub green: u8,
    /// Blue color component
    pub blue:  u8
}

impl XyzPaletteEntry {
    pub const fn new(red: u8, green: u8, blue: u8) -> XyzPaletteEntry {
        XyzPaletteEntry { red, green, blue }
    }
}

/// Color palette of the XYZ format consisting of 256 palette entries
///
/// The position of an entry is the color index used by pixel
/// bytes, entries are never reordered.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct XyzPalette {
    entries: [XyzPaletteEntry; XYZ_PALETTE_ENTRIES]
}

impl Default for XyzPalette {
    fn default() -> Self {
        XyzPalette {
            entries: [XyzPaletteEntry::default(); XYZ_PALETTE_ENTRIES]
        }
    }
}

impl XyzPalette {
    /// Build a palette from its on-disk layout, `256` RGB triples
    ///
    /// # Errors
    /// [`XyzErrors::LengthMismatch`] when `bytes` is not exactly `768` bytes long
    pub fn from_bytes(bytes: &[u8]) -> Result<XyzPalette, XyzErrors> {
        if bytes.len() != XYZ_PALETTE_SIZE {
            return Err(XyzErrors::LengthMismatch(XYZ_PALETTE_SIZE, bytes.len()));
        }
        let mut palette = XyzPalette::default();

        for (entry, rgb) in palette.entries.iter_mut().zip(bytes.chunks_exact(3)) {
            *entry = XyzPaletteEntry::new(rgb[0], rgb[1], rgb[2]);
        }
        Ok(palette)
    }

    /// Write the palette in its on-disk layout into `out`
    ///
    /// `out` must be exactly `768` bytes long
    pub fn write_bytes(&self, out: &mut [u8]) -> Result<(), XyzErrors> {
        if out.len() != XYZ_PALETTE_SIZE {
            return Err(XyzErrors::LengthMismatch(XYZ_PALETTE_SIZE, out.len()));
        }
        self.fill(out);
        Ok(())
    }

    /// Return the palette in its on-disk layout
    pub fn to_bytes(&self) -> [u8; XYZ_PALETTE_SIZE] {
        let mut out = [0; XYZ_PALETTE_SIZE];
        self.fill(&mut out);
        out
    }

    fn fill(&self, out: &mut [u8]) {
        for (entry, rgb) in self.entries.iter().zip(out.chunks_exact_mut(3)) {
            rgb.copy_from_slice(&[entry.red, entry.green, entry.blue]);
        }
    }

    pub fn entries(&self) -> &[XyzPaletteEntry; XYZ_PALETTE_ENTRIES] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [XyzPaletteEntry; XYZ_PALETTE_ENTRIES] {
        &mut self.entries
    }
}

impl Index<u8> for XyzPalette {
    type Output = XyzPaletteEntry;

    fn index(&self, index: u8) -> &Self::Output {
        &self.entries[usize::from(index)]
    }
}

impl IndexMut<u8> for XyzPalette {
    fn index_mut(&mut self, index: u8) -> &mut Self::Output {
        &mut self.entries[usize::from(index)]
    }
}
