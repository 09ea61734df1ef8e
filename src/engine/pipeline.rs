// src/engine/pipeline.rs
//
// In-memory operation chaining.
// Each Operation consumes one buffer and yields the next; nothing is
// persisted between stages, so open/close and multi-step recipes never
// round-trip through disk.

use crate::engine::buffer::PixelBuffer;
use crate::engine::common::EngineResult;
use crate::engine::pool::RowExecutor;
use crate::engine::{edges, filters, morphology, raster, threshold, transform};
use crate::ops::Operation;
use std::time::Instant;

/// Apply a single operation.
pub fn apply_op(buf: PixelBuffer, op: &Operation, executor: &RowExecutor) -> EngineResult<PixelBuffer> {
    match op {
        Operation::Grayscale => buf.to_grayscale(),
        Operation::Resize { width, height } => transform::resize(&buf, *width, *height),
        Operation::Crop {
            x,
            y,
            width,
            height,
        } => transform::crop(&buf, *x, *y, *width, *height),
        Operation::Rotate { degrees } => transform::rotate(&buf, *degrees),
        Operation::Blur { kind, size, sigma } => filters::blur(&buf, *kind, *size, *sigma, executor),
        Operation::Sobel => edges::sobel(&buf),
        Operation::Canny { low, high } => edges::canny(&buf, *low, *high),
        Operation::Threshold { thresh, maxval } => threshold::threshold(&buf, *thresh, *maxval),
        Operation::Otsu => threshold::otsu(&buf),
        Operation::AdaptiveThreshold { block_size, c } => {
            threshold::adaptive_threshold(&buf, *block_size, *c)
        }
        Operation::Erode { size } => morphology::erode(&buf, *size),
        Operation::Dilate { size } => morphology::dilate(&buf, *size),
        Operation::Open { size } => morphology::open(&buf, *size),
        Operation::Close { size } => morphology::close(&buf, *size),
        Operation::DrawLine {
            x1,
            y1,
            x2,
            y2,
            color,
            thickness,
        } => {
            let mut buf = buf;
            raster::draw_line(&mut buf, *x1, *y1, *x2, *y2, *color, *thickness);
            Ok(buf)
        }
        Operation::DrawRect {
            x,
            y,
            width,
            height,
            color,
            thickness,
        } => {
            let mut buf = buf;
            raster::draw_rect(&mut buf, *x, *y, *width, *height, *color, *thickness);
            Ok(buf)
        }
        Operation::FillRect {
            x,
            y,
            width,
            height,
            color,
        } => {
            let mut buf = buf;
            raster::fill_rect(&mut buf, *x, *y, *width, *height, *color);
            Ok(buf)
        }
        Operation::DrawCircle {
            cx,
            cy,
            radius,
            color,
            thickness,
        } => {
            let mut buf = buf;
            raster::draw_circle(&mut buf, *cx, *cy, *radius, *color, *thickness);
            Ok(buf)
        }
        Operation::DrawText {
            x,
            y,
            text,
            color,
            scale,
        } => {
            let mut buf = buf;
            raster::draw_text(&mut buf, *x, *y, text, *color, *scale);
            Ok(buf)
        }
    }
}

/// Apply `ops` in order. An empty list returns the buffer unchanged.
pub fn apply_ops(buf: PixelBuffer, ops: &[Operation], executor: &RowExecutor) -> EngineResult<PixelBuffer> {
    let mut current = buf;
    for op in ops {
        let started = Instant::now();
        current = apply_op(current, op, executor)?;
        tracing::debug!(
            op = op.name(),
            width = current.width(),
            height = current.height(),
            channels = current.channels(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "operation applied"
        );
    }
    Ok(current)
}
