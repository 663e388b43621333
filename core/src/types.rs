use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Error;

/// Identifies the context a handle was minted by.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    /// Fresh process-unique id.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        ContextId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Opaque, comparable reference to a tensor value (or pending value) owned by
/// an execution context. Operations hold these without owning the value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TensorHandle {
    context: ContextId,
    index:   u64,
}

impl TensorHandle {
    pub fn new(context: ContextId, index: u64) -> Self {
        Self { context, index }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn index(&self) -> u64 {
        self.index
    }
}

impl fmt::Display for TensorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tensor#{}.{}", self.context.0, self.index)
    }
}

/// One attached input: either a single tensor or an ordered group added as a list.
///
/// Groups are never flattened inside the builder so that consumers can recover
/// which inputs arrived together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputSlot {
    Single(TensorHandle),
    Group(Vec<TensorHandle>),
}

impl InputSlot {
    /// Number of tensors carried by the slot
    pub fn len(&self) -> usize {
        match self {
            InputSlot::Single(_) => 1,
            InputSlot::Group(g)  => g.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_group(&self) -> bool {
        matches!(self, InputSlot::Group(_))
    }

    pub fn handles(&self) -> &[TensorHandle] {
        match self {
            InputSlot::Single(h) => std::slice::from_ref(h),
            InputSlot::Group(g)  => g,
        }
    }
}

impl From<TensorHandle> for InputSlot {
    fn from(h: TensorHandle) -> Self {
        InputSlot::Single(h)
    }
}

impl From<Vec<TensorHandle>> for InputSlot {
    fn from(g: Vec<TensorHandle>) -> Self {
        InputSlot::Group(g)
    }
}

/// Kind of device an operation may be pinned to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Cpu,
    Gpu,
    Other(String),
}

/// Parsed device placement, e.g. `CPU:0` or `/job:localhost/replica:0/task:0/device:GPU:1`.
///
/// Only the trailing `device:` component is significant; job/replica/task
/// prefixes are accepted and dropped.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeviceSpec {
    pub kind:  DeviceKind,
    pub index: usize,
}

impl DeviceSpec {
    pub fn cpu(index: usize) -> Self {
        Self { kind: DeviceKind::Cpu, index }
    }
}

impl FromStr for DeviceSpec {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let bad = || Error::invalid_argument(format!("malformed device name '{raw}'"));

        let trimmed = raw.trim();
        let tail = match trimmed.rfind("device:") {
            Some(pos) => &trimmed[pos + "device:".len()..],
            None      => trimmed.rsplit('/').next().unwrap_or(trimmed),
        };
        if tail.is_empty() {
            return Err(bad());
        }

        let (kind, index) = match tail.split_once(':') {
            Some((k, i)) => (k, i.parse::<usize>().map_err(|_| bad())?),
            None         => (tail, 0),
        };
        let kind = match kind.to_ascii_uppercase().as_str() {
            "CPU" => DeviceKind::Cpu,
            "GPU" => DeviceKind::Gpu,
            ""    => return Err(bad()),
            other => DeviceKind::Other(other.to_string()),
        };
        Ok(Self { kind, index })
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DeviceKind::Cpu      => write!(f, "/device:CPU:{}", self.index),
            DeviceKind::Gpu      => write!(f, "/device:GPU:{}", self.index),
            DeviceKind::Other(k) => write!(f, "/device:{}:{}", k, self.index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;

    #[test]
    fn parses_short_and_full_device_names() {
        assert_eq!("CPU:0".parse::<DeviceSpec>().unwrap(), DeviceSpec::cpu(0));
        assert_eq!("cpu".parse::<DeviceSpec>().unwrap(), DeviceSpec::cpu(0));
        assert_eq!(
            "/job:localhost/replica:0/task:0/device:GPU:1".parse::<DeviceSpec>().unwrap(),
            DeviceSpec { kind: DeviceKind::Gpu, index: 1 },
        );
        assert_eq!(
            "/device:TPU:3".parse::<DeviceSpec>().unwrap().kind,
            DeviceKind::Other("TPU".into()),
        );
    }

    #[test]
    fn rejects_garbage_device_names() {
        for raw in ["", "CPU:x", "/device:", ":0"] {
            let err = raw.parse::<DeviceSpec>().unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidArgument, "input {raw:?}");
        }
    }

    #[test]
    fn display_round_trips() {
        let spec = DeviceSpec::cpu(2);
        assert_eq!(spec.to_string(), "/device:CPU:2");
        assert_eq!(spec.to_string().parse::<DeviceSpec>().unwrap(), spec);
    }

    #[test]
    fn input_slot_keeps_grouping() {
        let ctx = ContextId::next();
        let a = TensorHandle::new(ctx, 0);
        let b = TensorHandle::new(ctx, 1);
        let single = InputSlot::from(a);
        let group = InputSlot::from(vec![a, b]);
        assert!(!single.is_group());
        assert!(group.is_group());
        assert_eq!(group.handles(), &[a, b]);
        assert_eq!(single.len() + group.len(), 3);
    }

    #[test]
    fn context_ids_are_unique() {
        assert_ne!(ContextId::next(), ContextId::next());
    }
}
