use core_types::DataType;

use crate::op::{KernelContext, Op};
use crate::register_op;
use crate::types::{ArgSpec, OpError, OpSignature, OutputArity, RegistrationInfo, TensorAny};


/// “IdentityN” [x0..xn] → [x0..xn], one output per list element, order kept
pub struct IdentityNOp {
    sig: OpSignature,
}

impl IdentityNOp {
    pub fn new() -> Self {
        Self {
            sig: OpSignature {
                name:    Self::NAME,
                args:    vec![ ArgSpec::list("input", 1, DataType::ALL) ],
                outputs: OutputArity::ListLength(0),
            },
        }
    }
}

impl Default for IdentityNOp {
    fn default() -> Self { Self::new() }
}

impl RegistrationInfo for IdentityNOp {
    const NAME: &'static str = "IdentityN";
}

impl Op for IdentityNOp {
    fn signature(&self) -> &OpSignature { &self.sig }

    fn output_dtypes(&self, inputs: &[DataType]) -> Vec<DataType> {
        inputs.to_vec()
    }

    fn compute(
        &self,
        inputs: &[TensorAny],
        _kc:    &KernelContext<'_>,
    ) -> Result<Vec<TensorAny>, OpError> {
        Ok(inputs.to_vec())
    }
}

register_op!(IdentityNOp);
