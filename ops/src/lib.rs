pub mod array_ops;
pub mod builtin;
pub mod op;
pub mod types;

use std::collections::HashMap;

use tracing::{debug, trace};

pub use op::{KernelContext, Op, OpFactory};
pub use types::{
    ArgKind, ArgSpec, Fill, OpError, OpSignature, OutputArity, RegistrationInfo, SlotTypes, TensorAny,
};

#[doc(hidden)]
pub use inventory;


/// Register an operation with the inventory system
#[macro_export]
macro_rules! register_op {
    ($op_type:ident) => {
        $crate::inventory::submit! {
            $crate::OpFactory {
                name: <$op_type as $crate::RegistrationInfo>::NAME,
                factory: || Box::new($op_type::new()),
            }
        }
    };
}


/// Holds all registered ops and validates signature & dtypes before execution
pub struct OpRegistry {
    map: HashMap<&'static str, Box<dyn Op>>,
}

impl Default for OpRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OpRegistry {
    pub fn new() -> Self {
        Self { map: HashMap::new() }
    }

    /// Registry holding the builtin primitives
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        builtin::register_all(&mut reg);
        reg
    }

    pub fn collect_inventory(&mut self) {
        for factory in inventory::iter::<OpFactory> {
            let op = (factory.factory)();
            self.register_boxed(factory.name, op);
        }
        debug!(ops = self.map.len(), "op inventory collected");
    }

    /// Register a new Op under its signature name
    pub fn register<O: Op + 'static>(&mut self, op: O) {
        let name = op.signature().name;
        self.register_boxed(name, Box::new(op));
    }

    /// Register a boxed Op with an explicit name
    pub fn register_boxed(&mut self, name: &'static str, op: Box<dyn Op>) {
        if self.map.insert(name, op).is_some() {
            trace!(op = name, "op registration replaced");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Registered op names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.map.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// lookup sans validation
    pub fn get(&self, name: &str) -> Option<&dyn Op> {
        self.map.get(name).map(|b| b.as_ref())
    }

    /// Lookup + validate slot kinds, arity & dtypes in one call.
    ///
    /// Returns the op together with the number of outputs it will produce.
    pub fn check(&self, name: &str, slots: &[SlotTypes]) -> Result<(&dyn Op, usize), OpError> {
        let op = self.get(name)
            .ok_or_else(|| OpError::UnknownOp(name.to_string()))?;
        let sig = op.signature();

        if slots.len() != sig.args.len() {
            return Err(OpError::ArityMismatch {
                op: name.to_string(),
                expected: sig.args.len(),
                found: slots.len(),
            });
        }

        let mut flat_index = 0;
        for (i, (slot, arg)) in slots.iter().zip(&sig.args).enumerate() {
            match (arg.kind, slot) {
                (ArgKind::Single, SlotTypes::Single(_)) => {}
                (ArgKind::List { min_len }, SlotTypes::List(l)) => {
                    if l.len() < min_len {
                        return Err(OpError::invalid_input(
                            name,
                            format!("argument '{}' needs at least {min_len} tensors, got {}", arg.name, l.len()),
                        ));
                    }
                }
                (expected, found) => {
                    return Err(OpError::SlotKindMismatch {
                        op: name.to_string(),
                        index: i,
                        expected,
                        found: found.kind_name(),
                    });
                }
            }

            for &dt in slot.dtypes() {
                if !arg.dtypes.contains(&dt) {
                    return Err(OpError::DtypeMismatch {
                        op: name.to_string(),
                        index: flat_index,
                        expected: arg.dtypes.clone(),
                        found: dt,
                    });
                }
                flat_index += 1;
            }
        }

        Ok((op, sig.num_outputs(slots)))
    }
}
