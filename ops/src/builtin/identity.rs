use core_types::DataType;

use crate::op::{KernelContext, Op};
use crate::register_op;
use crate::types::{ArgSpec, OpError, OpSignature, OutputArity, RegistrationInfo, TensorAny};


/// “Identity” x → x (1 output, aliases the input buffer)
pub struct IdentityOp {
    sig: OpSignature,
}

impl IdentityOp {
    pub fn new() -> Self {
        Self {
            sig: OpSignature {
                name:    Self::NAME,
                args:    vec![ ArgSpec::single("input", DataType::ALL) ],
                outputs: OutputArity::Fixed(1),
            },
        }
    }
}

impl Default for IdentityOp {
    fn default() -> Self { Self::new() }
}

impl RegistrationInfo for IdentityOp {
    const NAME: &'static str = "Identity";
}

impl Op for IdentityOp {
    fn signature(&self) -> &OpSignature { &self.sig }

    fn output_dtypes(&self, inputs: &[DataType]) -> Vec<DataType> {
        inputs.to_vec()
    }

    fn compute(
        &self,
        inputs: &[TensorAny],
        _kc:    &KernelContext<'_>,
    ) -> Result<Vec<TensorAny>, OpError> {
        Ok(vec![ inputs[0].clone() ])
    }
}

register_op!(IdentityOp);
