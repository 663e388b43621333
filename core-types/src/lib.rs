use bytemuck::{Pod, Zeroable};
use std::fmt;

include!("generated_data_types.rs");

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type alias for a buffer identifier
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);
impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferId({})", self.0)
    }
}

/// Maximum number of dimensions for a view descriptor
pub const MAX_DIMS: usize = 8; // (B, C, H, W, D, T) + 2 should be enough

/// Descriptor for a view into a buffer
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq, Eq)]
pub struct ViewDescriptor {
    pub offset:  u32,
    pub ndim:    u32,
    pub shape:   [u32; MAX_DIMS],
    pub strides: [u32; MAX_DIMS],
}

impl ViewDescriptor {
    /// Row-major view over `shape`.
    ///
    /// `None` when the rank exceeds `MAX_DIMS`, or when a dimension or a
    /// stride does not fit the `u32` fields.
    pub fn contiguous(shape: &[usize]) -> Option<Self> {
        if shape.len() > MAX_DIMS {
            return None;
        }
        let mut vd = Self::zeroed();
        vd.ndim = shape.len() as u32;
        let mut stride = 1usize;
        for i in (0..shape.len()).rev() {
            vd.shape[i]   = u32::try_from(shape[i]).ok()?;
            vd.strides[i] = u32::try_from(stride).ok()?;
            stride = stride.checked_mul(shape[i].max(1))?;
        }
        Some(vd)
    }

    pub fn rank(&self) -> usize {
        self.ndim as usize
    }

    /// Logical dimensions, without the `MAX_DIMS` padding
    pub fn dims(&self) -> Vec<usize> {
        self.shape[..self.rank()].iter().map(|&d| d as usize).collect()
    }

    pub fn num_elements(&self) -> usize {
        self.shape[..self.rank()].iter().map(|&d| d as usize).product()
    }
}
