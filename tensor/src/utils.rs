use anyhow::{Result, anyhow};
use core_types::{MAX_DIMS, ViewDescriptor};

/// Row-major view descriptor for `shape`.
pub fn view_for(shape: &[usize]) -> Result<ViewDescriptor> {
    ViewDescriptor::contiguous(shape)
        .ok_or_else(|| anyhow!("rank {} exceeds the {MAX_DIMS}-dimension limit", shape.len()))
}

/// Number of elements described by `shape` (1 for a scalar).
pub fn element_count(shape: &[usize]) -> Result<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| anyhow!("shape {shape:?} holds more elements than fit in usize"))
}
