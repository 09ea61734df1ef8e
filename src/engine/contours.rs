// src/engine/contours.rs
//
// Connected-component extraction ("contours") over a binary-ish buffer.
//
// Any pixel whose gray value is > 0 is foreground. The default labeling is a
// single raster pass where a pixel inherits its left neighbour's label, else
// its top neighbour's, else a fresh one. Labels are never merged, so a
// U-shaped component is reported as more than one box. `Labeling::UnionFind`
// resolves those equivalences instead.

use crate::engine::buffer::PixelBuffer;
use crate::engine::common::EngineResult;
use crate::engine::edges::canny;
use crate::engine::raster::draw_rect;
use crate::ops::Color;

/// Components are reported only when both bounding-box extents exceed this.
pub const MIN_CONTOUR_EXTENT: i32 = 20;

/// At most this many rectangles are returned; the rest are dropped.
pub const MAX_CONTOURS: usize = 100;

/// Axis-aligned bounding box of a component.
///
/// `width`/`height` are `max - min` of the covered coordinates, so a box
/// drawn with `draw_rect` touches the extreme pixels exactly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Labeling {
    /// Left-then-top inheritance without merging.
    #[default]
    NeighborOnly,
    /// Left/top labels that meet are unioned before boxes are measured.
    UnionFind,
}

/// Disjoint-set forest over label ids; `parent[id] == id` marks a root.
struct Equivalences {
    parent: Vec<u32>,
}

impl Equivalences {
    fn new() -> Self {
        // label 0 is background
        Self { parent: vec![0] }
    }

    fn fresh(&mut self) -> u32 {
        let id = self.parent.len() as u32;
        self.parent.push(id);
        id
    }

    fn find(&mut self, mut id: u32) -> u32 {
        while self.parent[id as usize] != id {
            let grand = self.parent[self.parent[id as usize] as usize];
            self.parent[id as usize] = grand;
            id = grand;
        }
        id
    }

    fn union(&mut self, a: u32, b: u32) -> u32 {
        let (ra, rb) = (self.find(a), self.find(b));
        let (keep, drop) = if ra <= rb { (ra, rb) } else { (rb, ra) };
        self.parent[drop as usize] = keep;
        keep
    }

    fn len(&self) -> usize {
        self.parent.len()
    }
}

#[derive(Clone, Copy)]
struct Bounds {
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
}

/// Find component boxes with the default single-pass labeling.
pub fn find_contours(src: &PixelBuffer) -> Vec<Rect> {
    find_contours_with(src, Labeling::NeighborOnly)
}

pub fn find_contours_with(src: &PixelBuffer, labeling: Labeling) -> Vec<Rect> {
    let (w, h) = (src.width() as usize, src.height() as usize);
    let mut labels = vec![0u32; w * h];
    let mut sets = Equivalences::new();

    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            if src.gray_at(x, y) == 0 {
                continue;
            }
            let left = labels[y * w + x - 1];
            let top = labels[(y - 1) * w + x];
            labels[y * w + x] = match (left, top) {
                (0, 0) => sets.fresh(),
                (l, t) if l != 0 && t != 0 && l != t && labeling == Labeling::UnionFind => {
                    sets.union(l, t)
                }
                (0, t) => t,
                (l, _) => l,
            };
        }
    }

    if labeling == Labeling::UnionFind {
        for label in labels.iter_mut().filter(|l| **l != 0) {
            *label = sets.find(*label);
        }
    }

    let empty = Bounds {
        min_x: w as i32,
        min_y: h as i32,
        max_x: 0,
        max_y: 0,
    };
    let mut bounds = vec![empty; sets.len()];
    for y in 0..h {
        for x in 0..w {
            let label = labels[y * w + x] as usize;
            if label == 0 {
                continue;
            }
            let b = &mut bounds[label];
            b.min_x = b.min_x.min(x as i32);
            b.min_y = b.min_y.min(y as i32);
            b.max_x = b.max_x.max(x as i32);
            b.max_y = b.max_y.max(y as i32);
        }
    }

    let mut rects = Vec::new();
    let mut dropped = 0usize;
    for b in bounds.iter().skip(1) {
        let (bw, bh) = (b.max_x - b.min_x, b.max_y - b.min_y);
        if bw <= MIN_CONTOUR_EXTENT || bh <= MIN_CONTOUR_EXTENT {
            continue;
        }
        if rects.len() == MAX_CONTOURS {
            dropped += 1;
            continue;
        }
        rects.push(Rect {
            x: b.min_x,
            y: b.min_y,
            width: bw,
            height: bh,
            confidence: 1.0,
        });
    }
    if dropped > 0 {
        tracing::debug!(dropped, cap = MAX_CONTOURS, "contour list truncated");
    }
    rects
}

/// Edge-map the image, extract component boxes and outline them on a copy
/// of `src`. Returns the annotated copy and the number of boxes drawn.
pub fn detect_contours(
    src: &PixelBuffer,
    color: Color,
    thickness: i32,
) -> EngineResult<(PixelBuffer, usize)> {
    let edges = canny(&src.to_grayscale()?, 50.0, 150.0)?;
    let rects = find_contours(&edges);
    let mut out = src.clone();
    for r in &rects {
        draw_rect(&mut out, r.x, r.y, r.width, r.height, color, thickness);
    }
    Ok((out, rects.len()))
}
