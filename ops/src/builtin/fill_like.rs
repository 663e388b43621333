use core_types::DataType;

use crate::op::{KernelContext, Op};
use crate::register_op;
use crate::types::{ArgSpec, Fill, OpError, OpSignature, OutputArity, RegistrationInfo, TensorAny};

fn fill_signature(name: &'static str) -> OpSignature {
    OpSignature {
        name,
        args:    vec![ ArgSpec::single("x", DataType::ALL) ],
        outputs: OutputArity::Fixed(1),
    }
}

fn fill_like(
    op:     &str,
    fill:   Fill,
    inputs: &[TensorAny],
    kc:     &KernelContext<'_>,
) -> Result<Vec<TensorAny>, OpError> {
    let y = inputs[0]
        .filled_like(kc.memory, fill, kc.device_id)
        .map_err(|e| OpError::from_storage(op, e))?;
    Ok(vec![ y ])
}


/// “ZerosLike” x → zeros with the shape and dtype of x
pub struct ZerosLikeOp {
    sig: OpSignature,
}

impl ZerosLikeOp {
    pub fn new() -> Self {
        Self { sig: fill_signature(Self::NAME) }
    }
}

impl Default for ZerosLikeOp {
    fn default() -> Self { Self::new() }
}

impl RegistrationInfo for ZerosLikeOp {
    const NAME: &'static str = "ZerosLike";
}

impl Op for ZerosLikeOp {
    fn signature(&self) -> &OpSignature { &self.sig }

    fn output_dtypes(&self, inputs: &[DataType]) -> Vec<DataType> {
        inputs.to_vec()
    }

    fn compute(&self, inputs: &[TensorAny], kc: &KernelContext<'_>) -> Result<Vec<TensorAny>, OpError> {
        fill_like(Self::NAME, Fill::Zero, inputs, kc)
    }
}


/// “OnesLike” x → ones with the shape and dtype of x
pub struct OnesLikeOp {
    sig: OpSignature,
}

impl OnesLikeOp {
    pub fn new() -> Self {
        Self { sig: fill_signature(Self::NAME) }
    }
}

impl Default for OnesLikeOp {
    fn default() -> Self { Self::new() }
}

impl RegistrationInfo for OnesLikeOp {
    const NAME: &'static str = "OnesLike";
}

impl Op for OnesLikeOp {
    fn signature(&self) -> &OpSignature { &self.sig }

    fn output_dtypes(&self, inputs: &[DataType]) -> Vec<DataType> {
        inputs.to_vec()
    }

    fn compute(&self, inputs: &[TensorAny], kc: &KernelContext<'_>) -> Result<Vec<TensorAny>, OpError> {
        fill_like(Self::NAME, Fill::One, inputs, kc)
    }
}

register_op!(ZerosLikeOp);
register_op!(OnesLikeOp);
