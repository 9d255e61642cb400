/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

/// Magic bytes every XYZ file starts with
pub const XYZ_MAGIC: [u8; 4] = *b"XYZ1";

/// Magic, width and height
pub const XYZ_HEADER_SIZE: usize = 8;

/// Number of palette entries (colors) in the XYZ color palette
pub const XYZ_PALETTE_ENTRIES: usize = 256;

/// Size of the whole palette in bytes, three bytes per entry
pub const XYZ_PALETTE_SIZE: usize = XYZ_PALETTE_ENTRIES * 3;

/// Marker carried by every live [`XyzImage`](crate::XyzImage).
///
/// This is not part of the file format, it only lives in memory.
pub(crate) const IMAGE_SIGNATURE: [u8; 4] = *b"LXYZ";

/// Marker written over the signature on release, never produced by construction.
pub(crate) const RELEASED_SIGNATURE: [u8; 4] = *b"!XYZ";

/// Increment when the layout of `XyzImage` changes
pub(crate) const IMAGE_STRUCT_VERSION: u32 = 1;
