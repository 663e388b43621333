//! Uniform protocol for building and executing a single named primitive
//! against a pluggable execution backend.
//!
//! A caller obtains a fresh [`Operation`] from an [`ExecutionContext`], binds
//! the primitive name with [`Operation::reset`], optionally attaches a debug
//! label, appends inputs in order and finally consumes the builder with
//! [`Operation::execute`]. Every step returns a [`Result`]; the first failure
//! poisons the builder and must be propagated unchanged.

pub mod error;
pub mod invoke;
pub mod state;
pub mod types;

pub use error::{Error, ErrorCode, Result};
pub use invoke::{execute_into, run_op};
pub use state::{OperationState, Phase};
pub use types::{ContextId, DeviceKind, DeviceSpec, InputSlot, TensorHandle};

/// One pending invocation of a named primitive.
///
/// Single-use: built incrementally, then consumed by [`Operation::execute`].
/// Not meant to be shared between concurrent callers.
pub trait Operation {
    /// Builder state (name, label, device, attached inputs).
    fn state(&self) -> &OperationState;

    /// Bind the primitive name and optional device placement.
    ///
    /// Fails with `NotFound` for a primitive the backend does not know and
    /// with `InvalidArgument` when called twice or given a bad device.
    fn reset(&mut self, op_name: &str, device: Option<&str>) -> Result<()>;

    /// Attach a debug label; empty labels are a no-op.
    fn set_label(&mut self, label: &str) -> Result<()>;

    fn add_input(&mut self, input: TensorHandle) -> Result<()>;

    /// Append an ordered group of inputs, recorded as one slot.
    fn add_input_list(&mut self, inputs: &[TensorHandle]) -> Result<()>;

    /// Run the operation.
    ///
    /// `outputs.len()` is the capacity; on success the first `n` slots hold
    /// the results and `n` is returned. Slots past `n` are left untouched.
    /// Fails with `InvalidArgument` if the primitive produces more than
    /// `outputs.len()` results; nothing is truncated.
    fn execute(self: Box<Self>, outputs: &mut [Option<TensorHandle>]) -> Result<usize>;
}

/// Factory for [`Operation`] builders, one implementation per backend.
///
/// Builders borrow their context, so a context always outlives the
/// operations it created. Implementations document on their own whether
/// `create_operation` may be called concurrently.
pub trait ExecutionContext {
    fn id(&self) -> ContextId;

    /// Short backend name for logs ("eager", "graph", ...)
    fn backend(&self) -> &'static str;

    /// Fresh, unnamed builder. Never fails.
    fn create_operation(&self) -> Box<dyn Operation + '_>;
}
