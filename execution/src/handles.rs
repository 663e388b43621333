use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use opforge_core::{ContextId, Error, Result, TensorHandle};

/// thread-safe map from the handles a context hands out to whatever backs them
pub struct HandleTable<V> {
    context: ContextId,
    next:    AtomicU64,
    entries: Mutex<HashMap<u64, V>>,
}

impl<V: Clone> HandleTable<V> {
    pub fn new(context: ContextId) -> Self {
        Self {
            context,
            next:    AtomicU64::new(0),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store `value` under a fresh handle
    pub fn insert(&self, value: V) -> TensorHandle {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().insert(index, value);
        TensorHandle::new(self.context, index)
    }

    fn check_owner(&self, h: TensorHandle) -> Result<()> {
        if h.context() != self.context {
            return Err(Error::invalid_argument(format!(
                "{h} belongs to a different execution context"
            )));
        }
        Ok(())
    }

    /// Value behind `h`, or `InvalidArgument` for foreign or released handles
    pub fn resolve(&self, h: TensorHandle) -> Result<V> {
        self.check_owner(h)?;
        self.entries
            .lock()
            .get(&h.index())
            .cloned()
            .ok_or_else(|| Error::invalid_argument(format!("{h} is not a live tensor handle")))
    }

    pub fn contains(&self, h: TensorHandle) -> bool {
        h.context() == self.context && self.entries.lock().contains_key(&h.index())
    }

    /// Fails on the first handle that does not resolve
    pub fn check_all(&self, handles: &[TensorHandle]) -> Result<()> {
        for &h in handles {
            if !self.contains(h) {
                // resolve again for the precise message
                self.resolve(h)?;
            }
        }
        Ok(())
    }

    pub fn remove(&self, h: TensorHandle) -> Result<V> {
        self.check_owner(h)?;
        self.entries
            .lock()
            .remove(&h.index())
            .ok_or_else(|| Error::invalid_argument(format!("{h} is not a live tensor handle")))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
