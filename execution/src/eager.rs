//! Eager backend: every operation runs on host tensors as soon as it is executed.

use std::sync::Arc;

use tracing::{debug, trace};

use core_types::{DataType, Element};
use memory::{AllocError, MemoryManager};
use opforge_core::{
    ContextId, DeviceKind, DeviceSpec, Error, ExecutionContext, InputSlot, Operation,
    OperationState, Result, TensorHandle,
};
use opforge_ops::{KernelContext, OpRegistry, SlotTypes, TensorAny};
use tensor::{Tensor, element_count, view_for};

use crate::config::{ConfigError, ContextConfig};
use crate::handles::HandleTable;

/// Map a storage-layer failure onto the protocol taxonomy.
fn storage_error(err: anyhow::Error) -> Error {
    match err.downcast_ref::<AllocError>() {
        Some(alloc) => Error::resource_exhausted(alloc.to_string()),
        None        => Error::internal(format!("{err:#}")),
    }
}

/// Context that executes operations immediately on host memory.
///
/// `Send + Sync`: operations may be created and executed from several
/// threads at once; each individual operation stays single-threaded.
pub struct EagerContext {
    id:             ContextId,
    config:         ContextConfig,
    default_device: DeviceSpec,
    registry:       Arc<OpRegistry>,
    memory:         MemoryManager,
    tensors:        HandleTable<TensorAny>,
}

impl EagerContext {
    /// Context over the builtin primitives
    pub fn new(config: ContextConfig) -> std::result::Result<Self, ConfigError> {
        Self::with_registry(config, Arc::new(OpRegistry::with_builtins()))
    }

    pub fn with_registry(
        config:   ContextConfig,
        registry: Arc<OpRegistry>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let default_device = config.default_device_spec()?;
        let id = ContextId::next();
        debug!(context = id.raw(), ?config, "eager context created");
        Ok(Self {
            id,
            default_device,
            registry,
            memory: MemoryManager::new(config.memory_limit_bytes),
            tensors: HandleTable::new(id),
            config,
        })
    }

    /* ------------------------------------------------------------------ */
    /* Host tensors                                                       */
    /* ------------------------------------------------------------------ */

    /// Upload `data` with the given shape onto the default device.
    pub fn from_vec<T>(&self, data: &[T], shape: &[usize]) -> Result<TensorHandle>
    where
        T: Element,
        TensorAny: From<Tensor<T>>,
    {
        view_for(shape).map_err(|e| Error::invalid_argument(format!("{e:#}")))?;
        let expected = element_count(shape).map_err(|e| Error::invalid_argument(format!("{e:#}")))?;
        if data.len() != expected {
            return Err(Error::invalid_argument(format!(
                "shape {shape:?} needs {expected} elements, got {}",
                data.len()
            )));
        }
        let t = Tensor::from_vec(&self.memory, data, shape, self.default_device.index)
            .map_err(storage_error)?;
        Ok(self.tensors.insert(t.into()))
    }

    /// Rank-0 tensor holding `value`.
    pub fn scalar<T>(&self, value: T) -> Result<TensorHandle>
    where
        T: Element,
        TensorAny: From<Tensor<T>>,
    {
        self.from_vec(&[value], &[])
    }

    /// Download the tensor behind `h`; `T` must match its dtype.
    pub fn to_vec<T: Element>(&self, h: TensorHandle) -> Result<Vec<T>> {
        let t = self.tensors.resolve(h)?;
        if t.dtype() != T::DTYPE {
            return Err(Error::invalid_argument(format!(
                "{h} holds {} elements, requested {}",
                t.dtype(),
                T::DTYPE
            )));
        }
        self.memory.download_raw(t.buffer_id()).map_err(storage_error)
    }

    pub fn dims(&self, h: TensorHandle) -> Result<Vec<usize>> {
        Ok(self.tensors.resolve(h)?.dims())
    }

    pub fn dtype(&self, h: TensorHandle) -> Result<DataType> {
        Ok(self.tensors.resolve(h)?.dtype())
    }

    /// Host device index the tensor lives on
    pub fn device_of(&self, h: TensorHandle) -> Result<usize> {
        Ok(self.tensors.resolve(h)?.device_id())
    }

    /// Whether two handles view the same storage
    pub fn same_storage(&self, a: TensorHandle, b: TensorHandle) -> Result<bool> {
        Ok(self.tensors.resolve(a)?.shares_buffer_with(&self.tensors.resolve(b)?))
    }

    /// Drop the handle; storage is reclaimed once no other handle views it.
    pub fn release(&self, h: TensorHandle) -> Result<()> {
        self.tensors.remove(h)?;
        let freed = self.memory.clear_unused();
        trace!(%h, freed, live_buffers = self.memory.live_buffers(), "handle released");
        Ok(())
    }

    pub fn live_handles(&self) -> usize {
        self.tensors.len()
    }

    /// Bytes held by live buffers
    pub fn memory_in_use(&self) -> usize {
        self.memory.bytes_in_use()
    }

    pub fn registry(&self) -> &OpRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /* ------------------------------------------------------------------ */
    /* Protocol support                                                   */
    /* ------------------------------------------------------------------ */

    fn resolve_device(&self, raw: Option<&str>) -> Result<DeviceSpec> {
        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            return Ok(self.default_device.clone());
        };
        let spec: DeviceSpec = raw.parse()?;
        if spec.kind != DeviceKind::Cpu || spec.index >= self.config.host_devices {
            return Err(Error::invalid_argument(format!(
                "device {spec} is not available (eager context has {} host devices)",
                self.config.host_devices
            )));
        }
        Ok(spec)
    }

    fn check_op(&self, op_name: &str) -> Result<()> {
        if !self.registry.contains(op_name) {
            return Err(Error::not_found(format!("op type '{op_name}' is not registered")));
        }
        Ok(())
    }

    /// Validate, run the kernel and register the results.
    fn run(
        &self,
        state:   &OperationState,
        outputs: &mut [Option<TensorHandle>],
    ) -> Result<usize> {
        let op_name = state.ready()?;
        let device_id = state.device().map_or(self.default_device.index, |d| d.index);

        let mut slot_types = Vec::with_capacity(state.inputs().len());
        let mut flat = Vec::with_capacity(state.num_flat_inputs());
        for slot in state.inputs() {
            match slot {
                InputSlot::Single(h) => {
                    let t = self.tensors.resolve(*h)?;
                    slot_types.push(SlotTypes::Single(t.dtype()));
                    flat.push(t);
                }
                InputSlot::Group(group) => {
                    let mut dtypes = Vec::with_capacity(group.len());
                    for h in group {
                        let t = self.tensors.resolve(*h)?;
                        dtypes.push(t.dtype());
                        flat.push(t);
                    }
                    slot_types.push(SlotTypes::List(dtypes));
                }
            }
        }

        let (op, expected) = self.registry.check(op_name, &slot_types)?;
        if expected > outputs.len() {
            return Err(Error::invalid_argument(format!(
                "{op_name} produces {expected} outputs but the output buffer holds {}",
                outputs.len()
            )));
        }

        let kc = KernelContext { memory: &self.memory, device_id };
        let results = op.compute(&flat, &kc)?;
        if results.len() != expected {
            return Err(Error::internal(format!(
                "{op_name} kernel returned {} outputs, signature promises {expected}",
                results.len()
            )));
        }

        let produced = results.len();
        for (slot, t) in outputs.iter_mut().zip(results) {
            *slot = Some(self.tensors.insert(t));
        }
        debug!(
            context = self.id.raw(),
            op = op_name,
            label = state.label().unwrap_or_default(),
            device_id,
            inputs = flat.len(),
            produced,
            "eager op executed"
        );
        Ok(produced)
    }
}

impl ExecutionContext for EagerContext {
    fn id(&self) -> ContextId {
        self.id
    }

    fn backend(&self) -> &'static str {
        "eager"
    }

    fn create_operation(&self) -> Box<dyn Operation + '_> {
        Box::new(EagerOperation { ctx: self, state: OperationState::new() })
    }
}

/// Builder for one eager invocation
pub struct EagerOperation<'a> {
    ctx:   &'a EagerContext,
    state: OperationState,
}

impl Operation for EagerOperation<'_> {
    fn state(&self) -> &OperationState {
        &self.state
    }

    fn reset(&mut self, op_name: &str, device: Option<&str>) -> Result<()> {
        let r = self
            .state
            .expect_fresh()
            .and_then(|_| self.ctx.check_op(op_name))
            .and_then(|_| self.ctx.resolve_device(device))
            .and_then(|spec| self.state.reset(op_name, Some(spec)));
        self.state.guard(r)
    }

    fn set_label(&mut self, label: &str) -> Result<()> {
        // labels only matter to graph builders; eager keeps them for logs
        let r = self.state.set_label(label);
        self.state.guard(r)
    }

    fn add_input(&mut self, input: TensorHandle) -> Result<()> {
        let r = self
            .ctx
            .tensors
            .check_all(&[input])
            .and_then(|_| self.state.push_input(InputSlot::Single(input)));
        if r.is_ok() {
            trace!(op = self.state.op_name(), %input, "input attached");
        }
        self.state.guard(r)
    }

    fn add_input_list(&mut self, inputs: &[TensorHandle]) -> Result<()> {
        let r = self
            .ctx
            .tensors
            .check_all(inputs)
            .and_then(|_| self.state.push_input(InputSlot::Group(inputs.to_vec())));
        if r.is_ok() {
            trace!(op = self.state.op_name(), count = inputs.len(), "input list attached");
        }
        self.state.guard(r)
    }

    fn execute(self: Box<Self>, outputs: &mut [Option<TensorHandle>]) -> Result<usize> {
        self.ctx.run(&self.state, outputs)
    }
}
