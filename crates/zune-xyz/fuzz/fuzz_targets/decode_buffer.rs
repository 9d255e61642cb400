#![no_main]

use libfuzzer_sys::fuzz_target;
use zune_xyz::zune_core::bytestream::ZCursor;
use zune_xyz::zune_core::options::DecoderOptions;
use zune_xyz::XyzDecoder;

fuzz_target!(|data: &[u8]| {
    let options = DecoderOptions::default()
        .set_max_width(512)
        .set_max_height(512);

    let mut decoder = XyzDecoder::new_with_options(ZCursor::new(data), options);

    if let Ok(image) = decoder.decode() {
        let (width, height) = image.dimensions();
        assert_eq!(
            image.pixels().unwrap().len(),
            usize::from(width) * usize::from(height)
        );
    }
});
