#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use rasterkit::engine::{apply_ops, decode_bytes, PixelBuffer, RowExecutor};
use rasterkit::ops::{BlurKind, Operation};

#[derive(Arbitrary, Debug)]
struct OperationSeed {
    kind: u8,
    a: i32,
    b: i32,
    c: i32,
    d: i32,
}

fn build_buffer(data: &[u8]) -> Option<PixelBuffer> {
    if let Ok(buf) = decode_bytes(data) {
        if buf.width() <= 256 && buf.height() <= 256 {
            return Some(buf);
        }
    }

    let width = data.first().copied().unwrap_or(0) as u32 % 64 + 1;
    let height = data.get(1).copied().unwrap_or(0) as u32 % 64 + 1;
    let bytes = (0..(width * height * 3) as usize)
        .map(|i| data.get(i % data.len()).copied().unwrap_or(0))
        .collect();
    PixelBuffer::from_raw(width, height, 3, bytes).ok()
}

fn seeds_to_ops(seeds: Vec<OperationSeed>) -> Vec<Operation> {
    seeds
        .into_iter()
        .take(8)
        .map(|seed| match seed.kind % 12 {
            0 => Operation::Resize {
                width: seed.a % 512,
                height: seed.b % 512,
            },
            1 => Operation::Crop {
                x: seed.a,
                y: seed.b,
                width: seed.c,
                height: seed.d,
            },
            2 => Operation::Rotate {
                degrees: seed.a as f32 / 7.0,
            },
            3 => Operation::Blur {
                kind: match seed.b % 3 {
                    0 => BlurKind::Gaussian,
                    1 => BlurKind::Median,
                    _ => BlurKind::Average,
                },
                size: (seed.c as usize) % 16,
                sigma: seed.d as f32 / 100.0,
            },
            4 => Operation::Sobel,
            5 => Operation::Canny {
                low: seed.a as f32,
                high: seed.b as f32,
            },
            6 => Operation::Threshold {
                thresh: seed.a,
                maxval: seed.b,
            },
            7 => Operation::Otsu,
            8 => Operation::AdaptiveThreshold {
                block_size: seed.a % 64,
                c: seed.b,
            },
            9 => Operation::Erode {
                size: (seed.a as usize) % 16,
            },
            10 => Operation::Dilate {
                size: (seed.a as usize) % 16,
            },
            _ => Operation::Grayscale,
        })
        .collect()
}

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let mut unstructured = Unstructured::new(data);
    let seeds: Vec<OperationSeed> = match Vec::arbitrary(&mut unstructured) {
        Ok(v) => v,
        Err(_) => return,
    };
    let Some(buf) = build_buffer(data) else {
        return;
    };
    let Ok(exec) = RowExecutor::new(2) else {
        return;
    };

    // apply_ops may return errors for invalid operations; we're
    // interested only in panics or memory issues.
    let _ = apply_ops(buf, &seeds_to_ops(seeds), &exec);
});
