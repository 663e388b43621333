mod pool;

use anyhow::{Context, Result, anyhow};
use bytemuck::{cast_slice, Pod};
use core_types::BufferId;
use thiserror::Error;

pub use pool::{BufferHandle, BufferPool, HostBuffer};

/// Typed allocation failures, recoverable from an `anyhow::Error` with `downcast_ref`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocError {
    #[error("allocating {requested} bytes would exceed the {limit}-byte budget ({in_use} bytes in use)")]
    LimitExceeded { requested: usize, in_use: usize, limit: usize },
}

/// Owns the host buffers that hold tensor data.
pub struct MemoryManager {
    main_pool: BufferPool,
}

impl MemoryManager {
    /// `limit_bytes` caps the total size of live buffers; `None` means unbounded.
    pub fn new(limit_bytes: Option<usize>) -> Self {
        Self { main_pool: BufferPool::new(limit_bytes) }
    }

    /// Allocation returning both the id and a shared handle
    pub fn allocate(&self, size_bytes: usize) -> Result<(BufferId, BufferHandle)> {
        self.main_pool.create_buffer(size_bytes)
    }

    /// Raw allocation
    pub fn allocate_raw(&self, size_bytes: usize) -> Result<BufferId> {
        Ok(self.allocate(size_bytes)?.0)
    }

    /// Raw deallocation
    pub fn release(&self, id: BufferId) {
        self.main_pool.release_buffer(id);
    }

    /// Raw upload: host slice -> pooled buffer.
    pub fn write_to_buffer<T: Pod>(&self, dest_id: BufferId, data: &[T]) -> Result<()> {
        let bytes: &[u8] = cast_slice(data);
        let dst = self
            .get_ref(dest_id)
            .ok_or_else(|| anyhow!("missing buffer: {}", dest_id))?;
        dst.as_raw()
            .write(0, bytes)
            .with_context(|| format!("uploading into {dest_id}"))
    }

    /// Raw download: pooled buffer -> `Vec<T>`
    pub fn download_raw<T: Pod>(&self, id: BufferId) -> Result<Vec<T>> {
        let src = self.get_ref(id).ok_or_else(|| anyhow!("missing buffer: {}", id))?;
        let bytes = src.as_raw().read();
        let elem = std::mem::size_of::<T>();
        if elem == 0 || bytes.len() % elem != 0 {
            return Err(anyhow!("{} holds {} bytes, not a whole number of {}-byte elements", id, bytes.len(), elem));
        }
        // the byte vector carries no alignment guarantee for T
        Ok(bytes.chunks_exact(elem).map(bytemuck::pod_read_unaligned::<T>).collect())
    }

    /// Get a handle to a buffer in the main pool.
    pub fn get_ref(&self, id: BufferId) -> Option<BufferHandle> {
        self.main_pool.get(id)
    }

    /// Drop every buffer no tensor refers to any more; returns how many were freed.
    pub fn clear_unused(&self) -> usize {
        self.main_pool.clear_unused()
    }

    pub fn bytes_in_use(&self) -> usize {
        self.main_pool.bytes_in_use()
    }

    pub fn live_buffers(&self) -> usize {
        self.main_pool.len()
    }
}
