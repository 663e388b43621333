use core_types::DataType;
use tensor::Tensor;

use crate::op::{KernelContext, Op};
use crate::register_op;
use crate::types::{ArgSpec, OpError, OpSignature, OutputArity, RegistrationInfo, TensorAny};


/// “Shape” x → 1-D i32 tensor holding the dimensions of x
pub struct ShapeOp {
    sig: OpSignature,
}

impl ShapeOp {
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

impl Default for ShapeOp {
    fn default() -> Self { Self::new() }
}

impl RegistrationInfo for ShapeOp {
    const NAME: &'static str = "Shape";
}

impl Op for ShapeOp {
    fn signature(&self) -> &OpSignature { &self.sig }

    fn output_dtypes(&self, _inputs: &[DataType]) -> Vec<DataType> {
        vec![ DataType::I32 ]
    }

    fn compute(
        &self,
        inputs: &[TensorAny],
        kc:     &KernelContext<'_>,
    ) -> Result<Vec<TensorAny>, OpError> {
        let dims = inputs[0]
            .dims()
            .into_iter()
            .map(|d| i32::try_from(d).map_err(|_| {
                OpError::invalid_input(Self::NAME, format!("dimension {d} does not fit in i32"))
            }))
            .collect::<Result<Vec<i32>, _>>()?;

        let out = Tensor::<i32>::from_vec(kc.memory, &dims, &[dims.len()], kc.device_id)
            .map_err(|e| OpError::from_storage(Self::NAME, e))?;
        Ok(vec![ out.into() ])
    }
}

register_op!(ShapeOp);
