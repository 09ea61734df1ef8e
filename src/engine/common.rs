// src/engine/common.rs
//
// Common utilities shared across engine modules.
// Provides the unified result alias and the panic policy for the public surface.

use crate::error::RasterError;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Unified Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, RasterError>;

/// Run `f`, converting a panic into `RasterError::InternalPanic`.
///
/// Public operations go through this so that no panic crosses the
/// filter/raster/transform boundary; callers always get a `Result`.
pub fn run_with_panic_policy<T, F>(label: &'static str, f: F) -> EngineResult<T>
where
    F: FnOnce() -> EngineResult<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            tracing::error!(op = label, %detail, "operation panicked");
            Err(RasterError::internal_panic(format!("{label}: {detail}")))
        }
    }
}
