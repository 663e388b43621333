mod utils;

use anyhow::{Result, anyhow, bail};
use bytemuck::Zeroable;
use core_types::{BufferId, DataType, Element, ViewDescriptor};
use memory::{BufferHandle, MemoryManager};
use std::marker::PhantomData;

pub use utils::{element_count, view_for};

/// Lightweight handle: (BufferId, ViewDescriptor, device_id, dtype)
///
/// Cloning shares the underlying buffer; the buffer is reclaimed by the
/// memory manager once the last tensor referring to it is dropped.
#[derive(Clone, Debug)]
pub struct Tensor<T: Element> {
    buffer_id: BufferId,
    buffer:    BufferHandle,
    device_id: usize,
    view:      ViewDescriptor,
    dtype:     DataType,
    _marker:   PhantomData<T>,
}

impl<T: Element> Tensor<T> {
    /* --------------------------------------------------------------------- */
    /* Constructors                                                          */
    /* --------------------------------------------------------------------- */

    /// Allocate a zero-initialised tensor on the given device.
    pub fn empty(
        mgr:       &MemoryManager,
        shape:     &[usize],
        device_id: usize,
    ) -> Result<Self> {
        let view = view_for(shape)?;
        let bytes = element_count(shape)?
            .checked_mul(T::DTYPE.size_in_bytes())
            .ok_or_else(|| anyhow!("shape {:?} is too large to allocate", shape))?;
        let (buffer_id, buffer) = mgr.allocate(bytes)?;

        Ok(Tensor {
            buffer_id,
            buffer,
            device_id,
            view,
            dtype:    T::DTYPE,
            _marker:  PhantomData,
        })
    }

    /// Construct a tensor by uploading a host slice
    pub fn from_vec(
        mgr:       &MemoryManager,
        data:      &[T],
        shape:     &[usize],
        device_id: usize,
    ) -> Result<Self> {
        let expected = element_count(shape)?;
        if data.len() != expected {
            bail!("shape {:?} needs {} elements, got {}", shape, expected, data.len());
        }
        let t = Self::empty(mgr, shape, device_id)?;
        mgr.write_to_buffer(t.buffer_id, data)?;
        Ok(t)
    }

    /// Tensor with every element set to `value`.
    pub fn filled(
        mgr:       &MemoryManager,
        value:     T,
        shape:     &[usize],
        device_id: usize,
    ) -> Result<Self> {
        let t = Self::empty(mgr, shape, device_id)?;
        // freshly allocated buffers are already zeroed
        if value != T::zeroed() {
            mgr.write_to_buffer(t.buffer_id, &vec![value; t.num_elements()])?;
        }
        Ok(t)
    }

    /// Download the tensor into a `Vec<T>`.
    pub fn to_vec(&self, mgr: &MemoryManager) -> Result<Vec<T>> {
        mgr.download_raw(self.buffer_id)
    }

    /// Same data under a different shape; the buffer is shared, not copied.
    pub fn reshaped(&self, shape: &[usize]) -> Result<Self> {
        if element_count(shape)? != self.num_elements() {
            bail!(
                "cannot view {} elements as shape {:?}",
                self.num_elements(),
                shape
            );
        }
        let mut t = self.clone();
        t.view = view_for(shape)?;
        Ok(t)
    }

    /* --------------------------------------------------------------------- */
    /* Accessors                                                             */
    /* --------------------------------------------------------------------- */

    /// The view descriptor (shape, strides, offset)
    pub fn view(&self) -> &ViewDescriptor {
        &self.view
    }

    /// The internal BufferId
    pub fn buffer_id(&self) -> BufferId {
        self.buffer_id
    }

    /// The device index this tensor lives on
    pub fn device_id(&self) -> usize {
        self.device_id
    }

    /// The tensor’s DataType
    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn dims(&self) -> Vec<usize> {
        self.view.dims()
    }

    pub fn num_elements(&self) -> usize {
        self.view.num_elements()
    }

    pub fn shares_buffer_with(&self, other: &Tensor<T>) -> bool {
        self.buffer.same_buffer(&other.buffer)
    }
}

/* ------------------------------------------------------------------------- */
/*                                     Tests                                 */
/* ------------------------------------------------------------------------- */
