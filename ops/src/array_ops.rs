//! One function per array primitive, each a single call into the generic
//! invoker with the primitive's fixed name and arity.
//!
//! `name` is an optional debug label; graph backends use it as the node name.

use opforge_core::{Error, ExecutionContext, InputSlot, Result, TensorHandle, run_op};

use crate::builtin::{ExpandDimsOp, IdentityNOp, IdentityOp, OnesLikeOp, ShapeOp, ZerosLikeOp};
use crate::types::RegistrationInfo;

fn only(op: &str, mut outputs: Vec<TensorHandle>) -> Result<TensorHandle> {
    match (outputs.pop(), outputs.is_empty()) {
        (Some(h), true) => Ok(h),
        _ => Err(Error::internal(format!("{op}: expected exactly one output"))),
    }
}

/// Returns a tensor with the same shape and contents as `input`.
pub fn identity(ctx: &dyn ExecutionContext, input: TensorHandle, name: Option<&str>) -> Result<TensorHandle> {
    only(IdentityOp::NAME, run_op(ctx, IdentityOp::NAME, &[input.into()], 1, name)?)
}

/// Returns the list of inputs unchanged, one output per input.
pub fn identity_n(ctx: &dyn ExecutionContext, inputs: &[TensorHandle], name: Option<&str>) -> Result<Vec<TensorHandle>> {
    run_op(ctx, IdentityNOp::NAME, &[InputSlot::Group(inputs.to_vec())], inputs.len(), name)
}

pub fn zeros_like(ctx: &dyn ExecutionContext, x: TensorHandle, name: Option<&str>) -> Result<TensorHandle> {
    only(ZerosLikeOp::NAME, run_op(ctx, ZerosLikeOp::NAME, &[x.into()], 1, name)?)
}

pub fn ones_like(ctx: &dyn ExecutionContext, x: TensorHandle, name: Option<&str>) -> Result<TensorHandle> {
    only(OnesLikeOp::NAME, run_op(ctx, OnesLikeOp::NAME, &[x.into()], 1, name)?)
}

/// 1-D i32 tensor with the dimensions of `input`.
pub fn shape(ctx: &dyn ExecutionContext, input: TensorHandle, name: Option<&str>) -> Result<TensorHandle> {
    only(ShapeOp::NAME, run_op(ctx, ShapeOp::NAME, &[input.into()], 1, name)?)
}

/// Inserts a dimension of size 1 at index `dim` (a scalar integer tensor).
pub fn expand_dims(
    ctx:   &dyn ExecutionContext,
    input: TensorHandle,
    dim:   TensorHandle,
    name:  Option<&str>,
) -> Result<TensorHandle> {
    only(ExpandDimsOp::NAME, run_op(ctx, ExpandDimsOp::NAME, &[input.into(), dim.into()], 1, name)?)
}
