use std::collections::HashMap;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use parking_lot::{Mutex, RwLock};
use anyhow::{Result, bail};
use tracing::trace;

use core_types::BufferId;

use crate::AllocError;

/// Host-side byte storage backing one or more tensors.
#[derive(Debug)]
pub struct HostBuffer {
    bytes: RwLock<Vec<u8>>,
}

impl HostBuffer {
    fn zeroed(size: usize) -> Self {
        Self { bytes: RwLock::new(vec![0u8; size]) }
    }

    pub fn size(&self) -> usize {
        self.bytes.read().len()
    }

    /// Copy out the whole buffer.
    pub fn read(&self) -> Vec<u8> {
        self.bytes.read().clone()
    }

    /// Overwrite `data.len()` bytes starting at `offset`.
    pub fn write(&self, offset: usize, data: &[u8]) -> Result<()> {
        let mut bytes = self.bytes.write();
        let end = offset + data.len();
        if end > bytes.len() {
            bail!("write of {} bytes at offset {} overflows a {}-byte buffer", data.len(), offset, bytes.len());
        }
        bytes[offset..end].copy_from_slice(data);
        Ok(())
    }
}

/// Shared reference to a pooled buffer; the pool keeps one as well.
#[derive(Clone, Debug)]
pub struct BufferHandle(Arc<HostBuffer>);
impl BufferHandle {
    pub fn new(inner: Arc<HostBuffer>) -> Self { BufferHandle(inner) }
    pub fn as_raw(&self) -> &HostBuffer { &self.0 }
    pub fn strong_count(&self) -> usize { Arc::strong_count(&self.0) }
    pub fn same_buffer(&self, other: &BufferHandle) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

struct BufferEntry {
    buffer: Arc<HostBuffer>,
    size: usize,
}

/// thread-safe pool of host buffers with an optional byte budget
pub struct BufferPool {
    limit_bytes: Option<usize>,
    next_id: AtomicU64,
    entries: Mutex<HashMap<BufferId, BufferEntry>>,
}

impl BufferPool {
    pub fn new(limit_bytes: Option<usize>) -> Self {
        Self {
            limit_bytes,
            next_id: AtomicU64::new(0),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate a zeroed buffer of `size_bytes`, returning a unique ID and a shared handle
    pub fn create_buffer(&self, size_bytes: usize) -> Result<(BufferId, BufferHandle)> {
        let mut entries = self.entries.lock();

        if let Some(limit) = self.limit_bytes {
            let mut in_use: usize = entries.values().map(|e| e.size).sum();
            if in_use + size_bytes > limit {
                // reclaim buffers nobody references any more, then retry once
                entries.retain(|_, entry| Arc::strong_count(&entry.buffer) > 1);
                in_use = entries.values().map(|e| e.size).sum();
            }
            if in_use + size_bytes > limit {
                return Err(AllocError::LimitExceeded { requested: size_bytes, in_use, limit }.into());
            }
        }

        let id = BufferId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let buffer = Arc::new(HostBuffer::zeroed(size_bytes));
        entries.insert(id, BufferEntry { buffer: buffer.clone(), size: size_bytes });
        trace!(%id, size_bytes, "buffer allocated");
        Ok((id, BufferHandle::new(buffer)))
    }

    /// Retrieve a clonable handle to the buffer for a given ID
    pub fn get(&self, id: BufferId) -> Option<BufferHandle> {
        self.entries.lock().get(&id).map(|e| BufferHandle::new(e.buffer.clone()))
    }

    /// Explicitly release a buffer by its ID
    pub fn release_buffer(&self, id: BufferId) {
        self.entries.lock().remove(&id);
    }

    /// Clear entries with only one reference (the one in the pool)
    pub fn clear_unused(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| Arc::strong_count(&entry.buffer) > 1);
        before - entries.len()
    }

    pub fn bytes_in_use(&self) -> usize {
        self.entries.lock().values().map(|e| e.size).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
