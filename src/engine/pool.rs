// src/engine/pool.rs
//
// Row-parallel executor.
//
// **Architecture Decision**: the worker pool is an explicit object owned by
// the caller (ImageEngine holds one) rather than a process-wide static.
// Filters borrow it for the duration of one pass.
//
// **Band rule**:
// - The band count equals the worker count, fixed at construction and
//   independent of image size or detected hardware (default 4)
// - rows_per_band = height / workers; the last band absorbs the remainder
// - Each destination row is written by exactly one band; `src` is shared
//   read-only across all bands
//
// **IMPORTANT**:
// - run() blocks until every band has finished (fork-join)
// - A panic inside a band propagates to the caller after the join

use crate::engine::buffer::PixelBuffer;
use crate::error::RasterError;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::ops::Range;

/// Default band/worker count
pub const DEFAULT_WORKERS: usize = 4;

/// Upper bound accepted from configuration
const MAX_WORKERS: usize = 256;

/// Environment variable that overrides the worker count
pub const WORKERS_ENV: &str = "RASTERKIT_WORKERS";

/// Fixed-size fork-join executor over destination row bands.
pub struct RowExecutor {
    pool: ThreadPool,
    workers: usize,
}

impl std::fmt::Debug for RowExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowExecutor")
            .field("workers", &self.workers)
            .finish()
    }
}

impl RowExecutor {
    /// Build an executor with exactly `workers` threads (clamped to 1..=256).
    pub fn new(workers: usize) -> Result<Self, RasterError> {
        let workers = workers.clamp(1, MAX_WORKERS);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("rasterkit-band-{i}"))
            .build()
            .map_err(|e| RasterError::executor_failed(e.to_string()))?;
        Ok(Self { pool, workers })
    }

    pub fn with_default_workers() -> Result<Self, RasterError> {
        Self::new(DEFAULT_WORKERS)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Partition `[0, height)` into `workers` contiguous bands.
    /// Leading bands are empty when `height < workers`.
    pub fn bands(&self, height: usize) -> Vec<Range<usize>> {
        let rows_per_band = height / self.workers;
        (0..self.workers)
            .map(|i| {
                let start = i * rows_per_band;
                let end = if i == self.workers - 1 {
                    height
                } else {
                    (i + 1) * rows_per_band
                };
                start..end
            })
            .collect()
    }

    /// Run `row_fn(src, band_bytes, rows)` once per non-empty band.
    ///
    /// `band_bytes` holds exactly the destination rows `rows` (row `y` starts
    /// at `(y - rows.start) * dst.stride()`). `src` and `dst` must share width
    /// and height; channel counts may differ.
    pub fn run<F>(&self, src: &PixelBuffer, dst: &mut PixelBuffer, row_fn: F) -> Result<(), RasterError>
    where
        F: Fn(&PixelBuffer, &mut [u8], Range<usize>) + Sync,
    {
        if src.width() != dst.width() || src.height() != dst.height() {
            return Err(RasterError::invalid_argument(
                "dst",
                format!("{}x{}", dst.width(), dst.height()),
                format!("must match source {}x{}", src.width(), src.height()),
            ));
        }

        let stride = dst.stride();
        let mut rest: &mut [u8] = dst.data_mut();
        let mut jobs = Vec::with_capacity(self.workers);
        for rows in self.bands(src.height() as usize) {
            let (band, tail) = std::mem::take(&mut rest).split_at_mut(rows.len() * stride);
            rest = tail;
            if !rows.is_empty() {
                jobs.push((rows, band));
            }
        }

        let row_fn = &row_fn;
        self.pool.scope(|scope| {
            for (rows, band) in jobs {
                scope.spawn(move |_| row_fn(src, band, rows));
            }
        });
        Ok(())
    }
}

/// Worker count from `RASTERKIT_WORKERS`, or [`DEFAULT_WORKERS`].
pub fn configured_workers() -> usize {
    std::env::var(WORKERS_ENV)
        .ok()
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_WORKERS)
}
