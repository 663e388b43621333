use bytemuck::Zeroable;
use core_types::{BufferId, DataType, Element, ViewDescriptor};
use derive_more::From;
use memory::{AllocError, MemoryManager};
use opforge_core::Error;
use std::fmt;
use tensor::Tensor;

include!("generated_tensor_any.rs");

/// Constant used by the `*Like` fill kernels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fill {
    Zero,
    One,
}

impl Fill {
    pub fn value<T: Element>(self) -> T {
        match self {
            Fill::Zero => T::zeroed(),
            Fill::One  => T::ONE,
        }
    }
}

/// Whether an argument takes one tensor or an ordered list of tensors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgKind {
    Single,
    List { min_len: usize },
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgKind::Single           => f.write_str("single tensor"),
            ArgKind::List { min_len } => write!(f, "list of at least {min_len} tensors"),
        }
    }
}

/// One declared argument of an operation
#[derive(Debug, Clone)]
pub struct ArgSpec {
    pub name:   &'static str,
    pub kind:   ArgKind,
    pub dtypes: Vec<DataType>,
}

impl ArgSpec {
    pub fn single(name: &'static str, dtypes: &[DataType]) -> Self {
        Self { name, kind: ArgKind::Single, dtypes: dtypes.to_vec() }
    }

    pub fn list(name: &'static str, min_len: usize, dtypes: &[DataType]) -> Self {
        Self { name, kind: ArgKind::List { min_len }, dtypes: dtypes.to_vec() }
    }
}

/// How many results an operation produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputArity {
    Fixed(usize),
    /// One output per element of the list argument at this index
    ListLength(usize),
}

/// The full signature of an operation:
/// - `name`
/// - ordered arguments, each single or list, with allowed DataTypes
/// - output arity
#[derive(Debug, Clone)]
pub struct OpSignature {
    pub name:    &'static str,
    pub args:    Vec<ArgSpec>,
    pub outputs: OutputArity,
}

impl OpSignature {
    /// Output count for already validated input slots
    pub fn num_outputs(&self, slots: &[SlotTypes]) -> usize {
        match self.outputs {
            OutputArity::Fixed(n) => n,
            OutputArity::ListLength(arg) => slots.get(arg).map_or(0, SlotTypes::len),
        }
    }
}

/// Element types of one attached input slot, as seen by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotTypes {
    Single(DataType),
    List(Vec<DataType>),
}

impl SlotTypes {
    pub fn len(&self) -> usize {
        match self {
            SlotTypes::Single(_) => 1,
            SlotTypes::List(l)   => l.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtypes(&self) -> &[DataType] {
        match self {
            SlotTypes::Single(dt) => std::slice::from_ref(dt),
            SlotTypes::List(l)    => l,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            SlotTypes::Single(_) => "single tensor",
            SlotTypes::List(_)   => "list",
        }
    }
}

/// Errors during signature validation and kernel execution
#[derive(Debug, thiserror::Error)]
pub enum OpError {
    #[error("op type '{0}' is not registered")]
    UnknownOp(String),

    #[error("{op}: expected {expected} arguments, found {found}")]
    ArityMismatch { op: String, expected: usize, found: usize },

    #[error("{op}: argument {index} must be a {expected}, got a {found}")]
    SlotKindMismatch { op: String, index: usize, expected: ArgKind, found: &'static str },

    #[error("{op}: input {index} has dtype {found}, expected one of {expected:?}")]
    DtypeMismatch { op: String, index: usize, expected: Vec<DataType>, found: DataType },

    #[error("{op}: {reason}")]
    InvalidInput { op: String, reason: String },

    #[error("{op}: {reason}")]
    Allocation { op: String, reason: String },

    #[error("{op}: kernel failed: {reason}")]
    Kernel { op: String, reason: String },
}

impl OpError {
    pub fn invalid_input(op: &str, reason: impl Into<String>) -> Self {
        OpError::InvalidInput { op: op.to_string(), reason: reason.into() }
    }

    /// Classify a storage-layer failure raised while running `op`.
    pub fn from_storage(op: &str, err: anyhow::Error) -> Self {
        if let Some(alloc) = err.downcast_ref::<AllocError>() {
            return OpError::Allocation { op: op.to_string(), reason: alloc.to_string() };
        }
        OpError::Kernel { op: op.to_string(), reason: format!("{err:#}") }
    }
}

impl From<OpError> for Error {
    fn from(err: OpError) -> Self {
        let msg = err.to_string();
        match err {
            OpError::UnknownOp(_)              => Error::NotFound(msg),
            OpError::ArityMismatch { .. }
            | OpError::SlotKindMismatch { .. }
            | OpError::DtypeMismatch { .. }
            | OpError::InvalidInput { .. }     => Error::InvalidArgument(msg),
            OpError::Allocation { .. }         => Error::ResourceExhausted(msg),
            OpError::Kernel { .. }             => Error::Internal(msg),
        }
    }
}

/// Trait to implement for each Op to work with inventory
pub trait RegistrationInfo {
    /// Unique name for the operation
    const NAME: &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use opforge_core::ErrorCode;

    #[test]
    fn op_errors_map_onto_protocol_codes() {
        let cases = [
            (OpError::UnknownOp("Nope".into()), ErrorCode::NotFound),
            (
                OpError::ArityMismatch { op: "Identity".into(), expected: 1, found: 2 },
                ErrorCode::InvalidArgument,
            ),
            (OpError::invalid_input("ExpandDims", "dim out of range"), ErrorCode::InvalidArgument),
            (
                OpError::Allocation { op: "ZerosLike".into(), reason: "budget".into() },
                ErrorCode::ResourceExhausted,
            ),
            (OpError::Kernel { op: "Shape".into(), reason: "boom".into() }, ErrorCode::Internal),
        ];
        for (op_err, code) in cases {
            assert_eq!(Error::from(op_err).code(), code);
        }
    }

    #[test]
    fn storage_errors_are_classified() {
        let alloc = anyhow::Error::new(AllocError::LimitExceeded { requested: 8, in_use: 0, limit: 4 });
        assert!(matches!(OpError::from_storage("OnesLike", alloc), OpError::Allocation { .. }));

        let other = anyhow::anyhow!("disk on fire");
        assert!(matches!(OpError::from_storage("OnesLike", other), OpError::Kernel { .. }));
    }

    #[test]
    fn list_arity_follows_slot_length() {
        let sig = OpSignature {
            name:    "IdentityN",
            args:    vec![ArgSpec::list("input", 1, DataType::ALL)],
            outputs: OutputArity::ListLength(0),
        };
        let slots = [SlotTypes::List(vec![DataType::F32, DataType::I32, DataType::F32])];
        assert_eq!(sig.num_outputs(&slots), 3);
        assert_eq!(Fill::One.value::<u32>(), 1);
        assert_eq!(Fill::Zero.value::<f32>(), 0.0);
    }
}
