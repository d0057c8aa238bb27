#![no_main]
use libfuzzer_sys::fuzz_target;
use oxibrain::png::{self, Image, Rgb};
use oxibrain::tape::compiler;
use oxibrain::transcode::{color, path};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let (dims, rest) = data.split_at(2);
    let (width, height) = (usize::from(dims[0] % 32) + 1, usize::from(dims[1] % 32) + 1);
    let text = String::from_utf8_lossy(rest);
    let code = compiler::strip_comments(&text);

    let img = path::encode(&text).unwrap();
    let back = png::decode(&png::encode(&img).unwrap()).unwrap();
    assert_eq!(path::decode(&back), code);

    let host = Image::from_pixels(vec![vec![Rgb::new(dims[0], dims[1], 77); width]; height]).unwrap();
    if let Ok(img) = color::encode(&text, &host) {
        assert_eq!(color::decode(&img), code);
    }
});
