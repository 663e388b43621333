use core_types::{DataType, MAX_DIMS};

use crate::op::{KernelContext, Op};
use crate::register_op;
use crate::types::{ArgSpec, OpError, OpSignature, OutputArity, RegistrationInfo, TensorAny};


/// “ExpandDims” (x, dim) → x with a size-1 axis inserted at `dim`
///
/// `dim` is a scalar (or single element) i32/i64 in `[-rank-1, rank]`;
/// negative values count from the end. The result shares the input buffer.
pub struct ExpandDimsOp {
    sig: OpSignature,
}

impl ExpandDimsOp {
    pub fn new() -> Self {
        Self {
            sig: OpSignature {
                name:    Self::NAME,
                args:    vec![
                    ArgSpec::single("input", DataType::ALL),
                    ArgSpec::single("dim", &[DataType::I32, DataType::I64]),
                ],
                outputs: OutputArity::Fixed(1),
            },
        }
    }
}

impl Default for ExpandDimsOp {
    fn default() -> Self { Self::new() }
}

impl RegistrationInfo for ExpandDimsOp {
    const NAME: &'static str = "ExpandDims";
}

/// Position of the new axis for an input of `rank` dimensions
pub fn normalize_axis(dim: i64, rank: usize) -> Option<usize> {
    let rank = rank as i64;
    if dim < -rank - 1 || dim > rank {
        return None;
    }
    let axis = if dim < 0 { dim + rank + 1 } else { dim };
    Some(axis as usize)
}

impl Op for ExpandDimsOp {
    fn signature(&self) -> &OpSignature { &self.sig }

    fn output_dtypes(&self, inputs: &[DataType]) -> Vec<DataType> {
        inputs.iter().take(1).copied().collect()
    }

    fn compute(
        &self,
        inputs: &[TensorAny],
        kc:     &KernelContext<'_>,
    ) -> Result<Vec<TensorAny>, OpError> {
        let (x, dim) = (&inputs[0], &inputs[1]);

        let values = dim
            .integer_values(kc.memory)
            .map_err(|e| OpError::from_storage(Self::NAME, e))?
            .ok_or_else(|| OpError::invalid_input(Self::NAME, "dim must be an integer tensor"))?;
        let [dim] = values.as_slice() else {
            return Err(OpError::invalid_input(
                Self::NAME,
                format!("dim must hold exactly one element, got {}", values.len()),
            ));
        };

        let dim = *dim;

        let mut dims = x.dims();
        if dims.len() + 1 > MAX_DIMS {
            return Err(OpError::invalid_input(
                Self::NAME,
                format!("result rank {} exceeds the {MAX_DIMS}-dimension limit", dims.len() + 1),
            ));
        }
        let axis = normalize_axis(dim, dims.len()).ok_or_else(|| {
            OpError::invalid_input(
                Self::NAME,
                format!("dim {dim} out of range for rank {} (expected [-{}, {}])", dims.len(), dims.len() + 1, dims.len()),
            )
        })?;
        dims.insert(axis, 1);

        let y = x.reshaped(&dims).map_err(|e| OpError::from_storage(Self::NAME, e))?;
        Ok(vec![ y ])
    }
}

register_op!(ExpandDimsOp);
