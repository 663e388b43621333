use core_types::DataType;
use memory::MemoryManager;

use crate::types::{OpError, OpSignature, TensorAny};

/// What a host kernel gets to work with besides its inputs
pub struct KernelContext<'a> {
    pub memory:    &'a MemoryManager,
    /// Device freshly allocated outputs are placed on
    pub device_id: usize,
}

/// Trait to implement for each Op
pub trait Op: Send + Sync {
    /// Full signature
    fn signature(&self) -> &OpSignature;

    /// Result dtypes for the given flattened input dtypes.
    ///
    /// Lets backends that never run kernels (graph tracing) type their outputs.
    fn output_dtypes(&self, inputs: &[DataType]) -> Vec<DataType>;

    /// Run the primitive on host tensors. `inputs` is flattened in call order.
    fn compute(
        &self,
        inputs: &[TensorAny],
        kc:     &KernelContext<'_>,
    ) -> Result<Vec<TensorAny>, OpError>;
}


/// Wrapper for op factory functions
pub struct OpFactory {
    pub name: &'static str,
    pub factory: fn() -> Box<dyn Op>,
}

// Collect all registered ops
inventory::collect!(OpFactory);
