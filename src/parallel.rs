//! Parallelization helpers for per-pixel and per-row work
//!
//! Callers decide once whether the input is large enough to be worth
//! spreading over the rayon pool; small inputs stay on the calling thread.

use rayon::prelude::*;

use crate::constants::performance::PARALLEL_THRESHOLD;

/// True if `pixel_count` pixels is enough work to go parallel
pub fn should_parallelize(pixel_count: usize) -> bool {
    pixel_count >= PARALLEL_THRESHOLD
}

/// Map every `chunk_size` chunk of `data`, preserving order.
///
/// A trailing partial chunk is ignored.
pub fn map_chunks<T, U, F>(data: &[T], chunk_size: usize, parallel: bool, f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&[T]) -> U + Sync + Send,
{
    if parallel {
        data.par_chunks_exact(chunk_size).map(f).collect()
    } else {
        data.chunks_exact(chunk_size).map(f).collect()
    }
}

/// Map every index in `0..len`, preserving order
pub fn map_range<U, F>(len: usize, parallel: bool, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(usize) -> U + Sync + Send,
{
    if parallel {
        (0..len).into_par_iter().map(f).collect()
    } else {
        (0..len).map(f).collect()
    }
}
