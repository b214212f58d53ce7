// cargo fuzz run decode corpus/decode -- -timeout=30

#![no_main]

use libfuzzer_sys::fuzz_target;

use giflet::GifDecoder;

fuzz_target!(|data: &[u8]| {
    let decoder = GifDecoder::new();
    let count = decoder.image_count(data);
    let cover = decoder.cover_image(data);
    let animation = pollster::block_on(decoder.decode(data, None));
    if let Ok(animation) = animation {
        assert_eq!(count.ok(), Some(animation.frame_count()));
        let cover = cover.expect("cover failed on a valid GIF");
        assert_eq!(cover.pixels(), animation.frames()[0].raster().pixels());
    }
});
