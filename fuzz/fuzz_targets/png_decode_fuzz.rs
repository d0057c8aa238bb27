#![no_main]
use libfuzzer_sys::fuzz_target;
use oxibrain::png;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must only ever produce errors, never panics.
    let _ = png::decode(data);

    // Skip the signature check to reach the chunk parser.
    let mut framed = png::PNG_SIGNATURE.to_vec();
    framed.extend_from_slice(data);
    if let Ok(image) = png::decode(&framed) {
        let _ = oxibrain::detect::classify(&image);
        let _ = oxibrain::transcode::color::decode(&image);
    }
});
