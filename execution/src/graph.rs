//! Traced backend: executing an operation records a node instead of running a kernel.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, trace};

use core_types::DataType;
use opforge_core::{
    ContextId, DeviceSpec, Error, ExecutionContext, InputSlot, Operation, OperationState, Result,
    TensorHandle,
};
use opforge_ops::{OpRegistry, SlotTypes};

use crate::handles::HandleTable;

/// Op type recorded for graph inputs
pub const PLACEHOLDER: &str = "Placeholder";

/// One recorded invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDef {
    pub name:          String,
    pub op_type:       String,
    pub device:        Option<DeviceSpec>,
    /// Attached inputs, grouping preserved
    pub inputs:        Vec<InputSlot>,
    pub output_dtypes: Vec<DataType>,
}

/// What a symbolic handle refers to: output `output` of node `node`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GraphTensor {
    node:   usize,
    output: usize,
    dtype:  DataType,
}

#[derive(Default)]
struct Graph {
    nodes: Vec<NodeDef>,
    names: HashSet<String>,
}

impl Graph {
    /// `base`, or `base_1`, `base_2`, ... if taken
    fn unique_name(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut suffix = 0;
        while self.names.contains(&name) {
            suffix += 1;
            name = format!("{base}_{suffix}");
        }
        self.names.insert(name.clone());
        name
    }

    fn push(&mut self, mut node: NodeDef) -> usize {
        node.name = self.unique_name(&node.name);
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}

#[derive(Serialize)]
struct ExportGraph {
    nodes: Vec<ExportNode>,
}

#[derive(Serialize)]
struct ExportNode {
    name:    String,
    op:      String,
    #[serde(skip_serializing_if = "Option::is_none")]
    device:  Option<String>,
    inputs:  Vec<ExportInput>,
    outputs: Vec<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ExportInput {
    Single(String),
    Group(Vec<String>),
}

/// Context that records a dataflow graph.
///
/// Handles are symbolic; nothing is computed. `Send + Sync` like the eager
/// context, with node insertion serialized by an internal lock.
pub struct GraphContext {
    id:       ContextId,
    registry: Arc<OpRegistry>,
    tensors:  HandleTable<GraphTensor>,
    graph:    Mutex<Graph>,
}

impl Default for GraphContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphContext {
    pub fn new() -> Self {
        Self::with_registry(Arc::new(OpRegistry::with_builtins()))
    }

    pub fn with_registry(registry: Arc<OpRegistry>) -> Self {
        let id = ContextId::next();
        debug!(context = id.raw(), "graph context created");
        Self {
            id,
            registry,
            tensors: HandleTable::new(id),
            graph:   Mutex::new(Graph::default()),
        }
    }

    /// New graph input of the given dtype, named after `label` if non-empty.
    pub fn placeholder(&self, dtype: DataType, label: Option<&str>) -> TensorHandle {
        let node = NodeDef {
            name:          label.filter(|l| !l.is_empty()).unwrap_or(PLACEHOLDER).to_string(),
            op_type:       PLACEHOLDER.to_string(),
            device:        None,
            inputs:        Vec::new(),
            output_dtypes: vec![dtype],
        };
        let node = self.graph.lock().push(node);
        self.tensors.insert(GraphTensor { node, output: 0, dtype })
    }

    /// Node producing `h`, with the output index within that node
    pub fn node_for(&self, h: TensorHandle) -> Result<(NodeDef, usize)> {
        let t = self.tensors.resolve(h)?;
        let graph = self.graph.lock();
        let node = graph
            .nodes
            .get(t.node)
            .cloned()
            .ok_or_else(|| Error::internal(format!("{h} refers to missing node {}", t.node)))?;
        Ok((node, t.output))
    }

    /// Snapshot of every recorded node in insertion order
    pub fn nodes(&self) -> Vec<NodeDef> {
        self.graph.lock().nodes.clone()
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.lock().nodes.len()
    }

    pub fn dtype(&self, h: TensorHandle) -> Result<DataType> {
        Ok(self.tensors.resolve(h)?.dtype)
    }

    /// YAML dump of the graph; inputs are written as `node:output`.
    pub fn export_yaml(&self) -> Result<String> {
        let graph = self.graph.lock();
        let tensor_ref = |h: &TensorHandle| -> Result<String> {
            let t = self.tensors.resolve(*h)?;
            Ok(format!("{}:{}", graph.nodes[t.node].name, t.output))
        };

        let mut nodes = Vec::with_capacity(graph.nodes.len());
        for node in &graph.nodes {
            let mut inputs = Vec::with_capacity(node.inputs.len());
            for slot in &node.inputs {
                inputs.push(match slot {
                    InputSlot::Single(h) => ExportInput::Single(tensor_ref(h)?),
                    InputSlot::Group(hs) => {
                        ExportInput::Group(hs.iter().map(&tensor_ref).collect::<Result<_>>()?)
                    }
                });
            }
            nodes.push(ExportNode {
                name:    node.name.clone(),
                op:      node.op_type.clone(),
                device:  node.device.as_ref().map(ToString::to_string),
                inputs,
                outputs: node.output_dtypes.iter().map(|dt| dt.name().to_string()).collect(),
            });
        }

        serde_yaml::to_string(&ExportGraph { nodes })
            .map_err(|e| Error::internal(format!("graph export failed: {e}")))
    }

    fn check_op(&self, op_name: &str) -> Result<()> {
        if !self.registry.contains(op_name) {
            return Err(Error::not_found(format!("op type '{op_name}' is not registered")));
        }
        Ok(())
    }

    fn slot_types(&self, slot: &InputSlot) -> Result<SlotTypes> {
        Ok(match slot {
            InputSlot::Single(h) => SlotTypes::Single(self.tensors.resolve(*h)?.dtype),
            InputSlot::Group(hs) => SlotTypes::List(
                hs.iter()
                    .map(|h| self.tensors.resolve(*h).map(|t| t.dtype))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Validate and record the node, then hand out one handle per output.
    fn record(
        &self,
        state:   &OperationState,
        outputs: &mut [Option<TensorHandle>],
    ) -> Result<usize> {
        let op_name = state.ready()?;
        let slots = state
            .inputs()
            .iter()
            .map(|s| self.slot_types(s))
            .collect::<Result<Vec<_>>>()?;

        let (op, expected) = self.registry.check(op_name, &slots)?;
        if expected > outputs.len() {
            return Err(Error::invalid_argument(format!(
                "{op_name} produces {expected} outputs but the output buffer holds {}",
                outputs.len()
            )));
        }

        let flat: Vec<DataType> = slots.iter().flat_map(|s| s.dtypes().iter().copied()).collect();
        let output_dtypes = op.output_dtypes(&flat);
        if output_dtypes.len() != expected {
            return Err(Error::internal(format!(
                "{op_name} types {} outputs, signature promises {expected}",
                output_dtypes.len()
            )));
        }

        let node = NodeDef {
            name:          state.label().unwrap_or(op_name).to_string(),
            op_type:       op_name.to_string(),
            device:        state.device().cloned(),
            inputs:        state.inputs().to_vec(),
            output_dtypes: output_dtypes.clone(),
        };
        let (index, name) = {
            let mut graph = self.graph.lock();
            let index = graph.push(node);
            (index, graph.nodes[index].name.clone())
        };

        for (output, (slot, dtype)) in outputs.iter_mut().zip(output_dtypes).enumerate() {
            *slot = Some(self.tensors.insert(GraphTensor { node: index, output, dtype }));
        }
        debug!(context = self.id.raw(), op = op_name, node = %name, produced = expected, "node recorded");
        Ok(expected)
    }
}

impl ExecutionContext for GraphContext {
    fn id(&self) -> ContextId {
        self.id
    }

    fn backend(&self) -> &'static str {
        "graph"
    }

    fn create_operation(&self) -> Box<dyn Operation + '_> {
        Box::new(GraphOperation { ctx: self, state: OperationState::new() })
    }
}

/// Builder for one traced invocation
pub struct GraphOperation<'a> {
    ctx:   &'a GraphContext,
    state: OperationState,
}

impl Operation for GraphOperation<'_> {
    fn state(&self) -> &OperationState {
        &self.state
    }

    fn reset(&mut self, op_name: &str, device: Option<&str>) -> Result<()> {
        // any well-formed device string is recorded as-is
        let r = self
            .state
            .expect_fresh()
            .and_then(|_| self.ctx.check_op(op_name))
            .and_then(|_| match device.filter(|d| !d.is_empty()) {
                Some(raw) => raw.parse::<DeviceSpec>().map(Some),
                None => Ok(None),
            })
            .and_then(|spec| self.state.reset(op_name, spec));
        self.state.guard(r)
    }

    fn set_label(&mut self, label: &str) -> Result<()> {
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
        self.ctx.record(&self.state, outputs)
    }
}
