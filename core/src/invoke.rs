//! The generic invoker every primitive helper is a one-line call into.

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{InputSlot, TensorHandle};
use crate::ExecutionContext;

/// Create, name, label, feed and execute one operation.
///
/// Strictly sequential; the first failing step aborts the rest and its error
/// is returned as is. `outputs.len()` is the output capacity.
pub fn execute_into(
    ctx:     &dyn ExecutionContext,
    op_name: &str,
    inputs:  &[InputSlot],
    label:   Option<&str>,
    outputs: &mut [Option<TensorHandle>],
) -> Result<usize> {
    let mut op = ctx.create_operation();
    op.reset(op_name, None)?;
    if let Some(label) = label {
        op.set_label(label)?;
    }
    for slot in inputs {
        match slot {
            InputSlot::Single(h) => op.add_input(*h)?,
            InputSlot::Group(g)  => op.add_input_list(g)?,
        }
    }
    let produced = op.execute(outputs)?;
    debug!(
        backend = ctx.backend(),
        op = op_name,
        label = label.unwrap_or_default(),
        produced,
        "executed"
    );
    Ok(produced)
}

/// [`execute_into`] with an owned output buffer of `num_outputs` slots.
pub fn run_op(
    ctx:         &dyn ExecutionContext,
    op_name:     &str,
    inputs:      &[InputSlot],
    num_outputs: usize,
    label:       Option<&str>,
) -> Result<Vec<TensorHandle>> {
    let mut outputs = vec![None; num_outputs];
    let produced = execute_into(ctx, op_name, inputs, label, &mut outputs)?;
    outputs
        .into_iter()
        .take(produced)
        .enumerate()
        .map(|(i, h)| {
            h.ok_or_else(|| Error::internal(format!("{op_name}: output slot {i} was not written")))
        })
        .collect()
}
