use tracing::warn;

use crate::error::{Error, Result};
use crate::types::{DeviceSpec, InputSlot, TensorHandle};

/// Where a builder is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Created, no primitive bound yet
    Fresh,
    /// `reset` succeeded; label and inputs may be attached
    Named,
    /// A step failed; the builder must be discarded
    Poisoned,
}

/// Backend-independent part of an operation builder.
///
/// Enforces the call order `reset -> set_label? -> add_input* -> execute`.
/// Backends embed one of these, run their own validation around it and pass
/// every step result through [`OperationState::guard`] so that the first
/// failure poisons the builder.
#[derive(Clone, Debug)]
pub struct OperationState {
    phase:   Phase,
    op_name: Option<String>,
    device:  Option<DeviceSpec>,
    label:   Option<String>,
    inputs:  Vec<InputSlot>,
}

impl Default for OperationState {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationState {
    pub fn new() -> Self {
        Self {
            phase:   Phase::Fresh,
            op_name: None,
            device:  None,
            label:   None,
            inputs:  Vec::new(),
        }
    }

    /* ------------------------------------------------------------------ */
    /* Accessors                                                          */
    /* ------------------------------------------------------------------ */

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn op_name(&self) -> Option<&str> {
        self.op_name.as_deref()
    }

    pub fn device(&self) -> Option<&DeviceSpec> {
        self.device.as_ref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Attached inputs with their grouping intact
    pub fn inputs(&self) -> &[InputSlot] {
        &self.inputs
    }

    /// Attached inputs flattened in call order
    pub fn flat_inputs(&self) -> Vec<TensorHandle> {
        self.inputs.iter().flat_map(|s| s.handles().iter().copied()).collect()
    }

    pub fn num_flat_inputs(&self) -> usize {
        self.inputs.iter().map(InputSlot::len).sum()
    }

    /* ------------------------------------------------------------------ */
    /* Transitions                                                        */
    /* ------------------------------------------------------------------ */

    fn check_usable(&self, step: &str) -> Result<()> {
        if self.phase == Phase::Poisoned {
            warn!(step = %step, op = ?self.op_name, "builder reused after a failed step");
            return Err(Error::invalid_argument(format!(
                "{step}: operation builder already failed and must be discarded"
            )));
        }
        Ok(())
    }

    fn check_named(&self, step: &str) -> Result<()> {
        self.check_usable(step)?;
        if self.phase == Phase::Fresh {
            return Err(Error::invalid_argument(format!(
                "{step}: op type must be set with reset() first"
            )));
        }
        Ok(())
    }

    /// Fails unless `reset` is still allowed; lets backends validate the
    /// call order before doing their own lookups.
    pub fn expect_fresh(&self) -> Result<()> {
        self.check_usable("reset")?;
        if self.phase == Phase::Named {
            return Err(Error::invalid_argument(format!(
                "reset: operation already bound to '{}'",
                self.op_name.as_deref().unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// Bind the primitive name. Allowed exactly once, as the first mutation.
    pub fn reset(&mut self, op_name: &str, device: Option<DeviceSpec>) -> Result<()> {
        self.expect_fresh()?;
        if op_name.is_empty() {
            return Err(Error::invalid_argument("reset: op type must not be empty"));
        }
        self.op_name = Some(op_name.to_string());
        self.device = device;
        self.phase = Phase::Named;
        Ok(())
    }

    /// Attach a debug label. Empty labels are ignored.
    pub fn set_label(&mut self, label: &str) -> Result<()> {
        self.check_usable("set_label")?;
        if label.is_empty() {
            return Ok(());
        }
        self.check_named("set_label")?;
        if let Some(existing) = &self.label {
            return Err(Error::invalid_argument(format!(
                "set_label: label already set to '{existing}'"
            )));
        }
        self.label = Some(label.to_string());
        Ok(())
    }

    pub fn push_input(&mut self, slot: InputSlot) -> Result<()> {
        let step = if slot.is_group() { "add_input_list" } else { "add_input" };
        self.check_named(step)?;
        self.inputs.push(slot);
        Ok(())
    }

    /// Name of the bound primitive, if the builder may be executed.
    pub fn ready(&self) -> Result<&str> {
        self.check_named("execute")?;
        Ok(self.op_name.as_deref().unwrap_or_default())
    }

    pub fn poison(&mut self) {
        self.phase = Phase::Poisoned;
    }

    /// Pass a step result through, poisoning the builder on failure.
    pub fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.poison();
        }
        result
    }
}
