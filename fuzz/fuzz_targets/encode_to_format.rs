#![no_main]

//! Fuzz target for encoding to every output format.
//! Exercises the JPEG alpha drop and the PNG/BMP colour-type mapping.

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use rasterkit::engine::{encode_to_vec, PixelBuffer};
use rasterkit::ops::OutputFormat;

#[derive(Arbitrary, Debug)]
struct EncodeSeed {
    format: u8,
    quality: u8,
    channels: u8,
    width: u8,
    height: u8,
}

fn build_buffer(data: &[u8], seed: &EncodeSeed) -> Option<PixelBuffer> {
    // Limit dimensions to avoid OOM (max 128x128x4 = 64KB)
    let w = (u32::from(seed.width) % 128).max(1);
    let h = (u32::from(seed.height) % 128).max(1);
    let channels = [1u32, 3, 4][usize::from(seed.channels % 3)];
    let bytes = (0..(w * h * channels) as usize)
        .map(|i| data.get(i % data.len().max(1)).copied().unwrap_or(128))
        .collect();
    PixelBuffer::from_raw(w, h, channels, bytes).ok()
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 5 {
        return;
    }

    let mut unstructured = Unstructured::new(data);
    let seed = match EncodeSeed::arbitrary(&mut unstructured) {
        Ok(s) => s,
        Err(_) => return,
    };
    let Some(buf) = build_buffer(data, &seed) else {
        return;
    };

    let format = match seed.format % 3 {
        0 => OutputFormat::Jpeg {
            quality: seed.quality,
        },
        1 => OutputFormat::Png,
        _ => OutputFormat::Bmp,
    };
    // We only care about panics/crashes, not encoding errors
    let _ = encode_to_vec(&buf, format);
});
