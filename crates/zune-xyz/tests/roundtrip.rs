/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use std::io::{Cursor, Read};

use flate2::read::ZlibDecoder;
use nanorand::{Rng, WyRand};
use zune_core::bytestream::ZCursor;
use zune_xyz::{
    DeflateCompressor, XyzCompressor, XyzDecoder, XyzErrors, XyzFormat, XyzImage, XyzPaletteEntry
};

fn random_image(width: u16, height: u16, seed: u64) -> XyzImage {
    let mut rand = WyRand::new_seed(seed);
    let mut image = XyzImage::alloc(width, height, XyzFormat::Indexed8).unwrap();

    for entry in image.palette_mut().unwrap().entries_mut() {
        *entry = XyzPaletteEntry::new(
            rand.generate::<u8>(),
            rand.generate::<u8>(),
            rand.generate::<u8>()
        );
    }
    image
        .pixels_mut()
        .unwrap()
        .iter_mut()
        .for_each(|px| *px = rand.generate::<u8>());

    image
}

fn encode_to_vec(image: &mut XyzImage) -> Vec<u8> {
    let mut output: Vec<u8> = vec![];
    zune_xyz::encode(image, &mut output).unwrap();
    output
}

fn assert_same_image(a: &XyzImage, b: &XyzImage) {
    assert_eq!(a.dimensions(), b.dimensions());
    assert_eq!(a.format(), b.format());
    assert_eq!(a.palette().unwrap(), b.palette().unwrap());
    assert_eq!(a.pixels().unwrap(), b.pixels().unwrap());
}

#[test]
fn test_two_by_one() {
    let mut image = XyzImage::alloc(2, 1, XyzFormat::Indexed8).unwrap();
    image.palette_mut().unwrap()[0] = XyzPaletteEntry::new(255, 0, 0);
    image.pixels_mut().unwrap().copy_from_slice(&[0, 0]);

    let file = encode_to_vec(&mut image);

    assert_eq!(&file[..8], b"XYZ1\x02\x00\x01\x00");

    let mut plaintext: Vec<u8> = vec![];
    ZlibDecoder::new(&file[8..])
        .read_to_end(&mut plaintext)
        .unwrap();

    assert_eq!(plaintext.len(), 768 + 2);
    assert_eq!(&plaintext[..3], &[0xFF, 0x00, 0x00]);
    assert!(plaintext[3..768].iter().all(|x| *x == 0));
    assert_eq!(&plaintext[768..], &[0, 0]);

    let decoded = zune_xyz::decode(ZCursor::new(&file)).unwrap();
    assert_same_image(&image, &decoded);
}

#[test]
fn test_random_roundtrip() {
    // random data doesn't compress, the encoder and the decoder both
    // have to go past their first buffer
    let mut image = random_image(100, 100, 42);
    let file = encode_to_vec(&mut image);

    assert!(file.len() > image.filesize());
    assert_eq!(image.compressed_filesize(), file.len());

    let mut decoder = XyzDecoder::new(ZCursor::new(&file));
    let decoded = decoder.decode().unwrap();

    assert_eq!(decoder.compressed_len(), Some(file.len() - 8));
    assert_same_image(&image, &decoded);
}

#[test]
fn test_std_cursor_source() {
    let mut image = random_image(20, 10, 11);
    let file = encode_to_vec(&mut image);

    let decoded = zune_xyz::decode(Cursor::new(file)).unwrap();
    assert_same_image(&image, &decoded);
}

#[test]
fn test_empty_image_roundtrip() {
    let mut image = XyzImage::alloc(0, 0, XyzFormat::Indexed8).unwrap();
    let file = encode_to_vec(&mut image);

    let decoded = zune_xyz::decode(ZCursor::new(&file)).unwrap();

    assert_eq!(decoded.dimensions(), (0, 0));
    assert!(decoded.pixels().unwrap().is_empty());
}

#[test]
fn test_compression_level_doesnt_change_pixels() {
    let mut fast = random_image(64, 32, 7);
    let mut best = fast.clone();

    fast.set_compressor(DeflateCompressor::new(0)).unwrap();

    let fast_file = encode_to_vec(&mut fast);
    let best_file = encode_to_vec(&mut best);

    let a = zune_xyz::decode(ZCursor::new(&fast_file)).unwrap();
    let b = zune_xyz::decode(ZCursor::new(&best_file)).unwrap();
    assert_same_image(&a, &b);
}

#[test]
fn test_compressor_retried_with_double_capacity() {
    let mut image = random_image(16, 16, 3);
    let capacity = image.filesize() - 8;

    // refuses anything smaller than twice the plaintext
    image
        .set_compressor(move |input: &[u8], output: &mut [u8]| -> Result<usize, XyzErrors> {
            if output.len() < 2 * capacity {
                return Err(XyzErrors::BufferTooSmall(0, output.len()));
            }
            DeflateCompressor::default().compress(input, output)
        })
        .unwrap();

    let file = encode_to_vec(&mut image);
    let decoded = zune_xyz::decode(ZCursor::new(&file)).unwrap();

    assert_same_image(&image, &decoded);
}

#[test]
fn test_compressor_failing_twice() {
    let mut image = random_image(16, 16, 4);
    image
        .set_compressor(|_: &[u8], output: &mut [u8]| -> Result<usize, XyzErrors> {
            Err(XyzErrors::BufferTooSmall(0, output.len()))
        })
        .unwrap();

    let mut output: Vec<u8> = vec![];
    assert_eq!(
        zune_xyz::encode(&mut image, &mut output),
        Err(XyzErrors::CompressionFailed)
    );
    assert!(output.is_empty());

    image.reset_compressor().unwrap();
    assert!(zune_xyz::encode(&mut image, &mut output).is_ok());
}

#[test]
fn test_compressor_error_is_propagated() {
    let mut image = random_image(4, 4, 5);
    image
        .set_compressor(|_: &[u8], _: &mut [u8]| -> Result<usize, XyzErrors> {
            Err(XyzErrors::OutOfMemory)
        })
        .unwrap();

    let mut output: Vec<u8> = vec![];
    assert_eq!(
        zune_xyz::encode(&mut image, &mut output),
        Err(XyzErrors::OutOfMemory)
    );
}

#[test]
fn test_file_roundtrip() {
    let path = std::env::temp_dir().join(format!("zune-xyz-roundtrip-{}.xyz", std::process::id()));

    let mut image = random_image(33, 17, 9);
    let written = zune_xyz::encode_file(&mut image, &path).unwrap();

    assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, written);

    let decoded = zune_xyz::decode_file(&path);
    std::fs::remove_file(&path).unwrap();

    assert_same_image(&image, &decoded.unwrap());
}
