//! Points-to summaries: which abstract locations a value may denote.
//!
//! The dispose analysis only consumes `PointsToSummary`. `LocalPointsToSummary`
//! is the method-local summary used when the host has nothing better to offer.
//! It follows local bindings forward through the graph, so a reassigned local
//! only denotes what it holds at the operation that reads it.

use crate::analysis::dispose_analysis::state::LocationLayout;
use crate::analysis::dispose_analysis::types::{AbstractLocation, LocationId, LocationOrigin};
use crate::dispose_log;
use crate::flow_graph::flow_nodes::{
    AssignTarget, BlockId, ControlFlowGraph, FlowValue, MethodSymbol, Operation, OperationId,
    OperationKind, SymbolId,
};
use crate::flow_graph::type_registry::TypeRegistry;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointsToValue {
    /// The value denotes one of these locations (possibly none, e.g. `null`)
    Known(Vec<LocationId>),
    /// Aliasing could not be resolved; transfer leaves the state alone
    Unknown,
}

impl PointsToValue {
    pub fn empty() -> Self {
        PointsToValue::Known(Vec::new())
    }
}

/// Aliasing facts the dispose analysis consumes.
///
/// Every `LocationId` a summary hands out should come from its own `locations()`.
/// Ids outside that layout are ignored by the transfer functions.
pub trait PointsToSummary {
    /// Every location the summary knows about, in creation order
    fn locations(&self) -> &LocationLayout;

    /// Locations `value` may denote when `operation` reads it
    fn resolve(&self, operation: OperationId, value: &FlowValue) -> PointsToValue;

    /// The location allocated by an object creation
    fn creation_location(&self, operation: OperationId) -> Option<LocationId>;
}

/// What a local may hold at one program point.
///
/// `unresolved` records that some path assigned a value nothing could resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LocalBinding {
    locations: Vec<LocationId>,
    unresolved: bool,
}

impl LocalBinding {
    fn location(location: LocationId) -> Self {
        Self {
            locations: vec![location],
            unresolved: false,
        }
    }

    fn unresolved() -> Self {
        Self {
            locations: Vec::new(),
            unresolved: true,
        }
    }

    fn join_with(&mut self, other: &LocalBinding) {
        self.locations.extend_from_slice(&other.locations);
        self.locations.sort_unstable();
        self.locations.dedup();
        self.unresolved |= other.unresolved;
    }

    // The resolved part still counts when other paths are unresolved
    fn to_points_to(&self) -> PointsToValue {
        if self.locations.is_empty() && self.unresolved {
            PointsToValue::Unknown
        } else {
            PointsToValue::Known(self.locations.clone())
        }
    }
}

/// Local → binding at one program point. An absent local holds nothing yet.
type LocalBindings = FxHashMap<SymbolId, LocalBinding>;

#[derive(Debug, Clone, Default)]
pub struct LocalPointsToSummary {
    layout: LocationLayout,
    parameter_locations: FxHashMap<SymbolId, LocationId>,
    operand_points_to: FxHashMap<(OperationId, SymbolId), PointsToValue>,
}

impl LocalPointsToSummary {
    pub fn build(
        graph: &ControlFlowGraph,
        method: &MethodSymbol,
        registry: &TypeRegistry,
    ) -> Self {
        let mut summary = Self::default();

        for parameter in &method.parameters {
            if !registry.is_disposable(parameter.type_id) {
                continue;
            }

            let location =
                AbstractLocation::from_symbol(parameter.id, parameter.type_id, true);
            let id = summary.layout.intern(location);
            summary.parameter_locations.insert(parameter.id, id);
        }

        for operation in graph.operations() {
            if let OperationKind::ObjectCreation { type_id, .. } = &operation.kind {
                summary.layout.intern(AbstractLocation::from_creation(
                    operation.id,
                    operation.syntax.clone(),
                    *type_id,
                    registry.is_disposable(*type_id),
                ));
            }
        }

        summary.bind_locals(graph);

        dispose_log!(format!(
            "[Dispose] Points-to summary for '{}': locations={} local reads={}",
            method.display_name(),
            summary.layout.len(),
            summary.operand_points_to.len()
        ));

        summary
    }

    // Forward pass over local bindings. Bindings only grow at block entries and
    // assignments overwrite, so re-recording a read keeps the largest answer.
    fn bind_locals(&mut self, graph: &ControlFlowGraph) {
        let block_index_by_id = graph
            .blocks
            .iter()
            .enumerate()
            .map(|(index, block)| (block.id, index))
            .collect::<FxHashMap<BlockId, usize>>();

        let Some(entry_index) = graph
            .entry()
            .and_then(|entry| block_index_by_id.get(&entry.id).copied())
        else {
            return;
        };

        let mut successors = vec![Vec::new(); graph.blocks.len()];
        let mut predecessors = vec![Vec::new(); graph.blocks.len()];
        for (index, block) in graph.blocks.iter().enumerate() {
            for successor in &block.successors {
                let Some(successor_index) = block_index_by_id.get(successor).copied() else {
                    continue;
                };

                if !successors[index].contains(&successor_index) {
                    successors[index].push(successor_index);
                    predecessors[successor_index].push(index);
                }
            }
        }

        let mut out_bindings: Vec<Option<LocalBindings>> = vec![None; graph.blocks.len()];
        let mut in_worklist = vec![false; graph.blocks.len()];
        let mut worklist = VecDeque::from([entry_index]);
        in_worklist[entry_index] = true;

        while let Some(block_index) = worklist.pop_front() {
            in_worklist[block_index] = false;

            let mut input = (block_index == entry_index).then(LocalBindings::default);
            for predecessor in &predecessors[block_index] {
                let Some(predecessor_output) = &out_bindings[*predecessor] else {
                    continue;
                };

                input = Some(match input {
                    Some(existing) => join_bindings(existing, predecessor_output),
                    None => predecessor_output.clone(),
                });
            }

            let Some(mut bindings) = input else {
                continue;
            };

            for operation in &graph.blocks[block_index].operations {
                self.record_local_reads(operation, &bindings);
                self.bind_result(operation, &mut bindings);
            }

            if out_bindings[block_index].as_ref() == Some(&bindings) {
                continue;
            }
            out_bindings[block_index] = Some(bindings);

            for successor in &successors[block_index] {
                if !in_worklist[*successor] {
                    in_worklist[*successor] = true;
                    worklist.push_back(*successor);
                }
            }
        }
    }

    fn record_local_reads(&mut self, operation: &Operation, bindings: &LocalBindings) {
        for value in operand_values(&operation.kind) {
            if let FlowValue::Local(local) = value {
                let binding = bindings.get(local).cloned().unwrap_or_default();
                self.operand_points_to
                    .insert((operation.id, *local), binding.to_points_to());
            }
        }
    }

    fn bind_result(&self, operation: &Operation, bindings: &mut LocalBindings) {
        let (local, binding) = match &operation.kind {
            OperationKind::ObjectCreation {
                result: Some(local),
                ..
            } => match self.creation_location(operation.id) {
                Some(location) => (*local, LocalBinding::location(location)),
                None => (*local, LocalBinding::unresolved()),
            },

            OperationKind::Assignment {
                target: AssignTarget::Local(local),
                value,
            } => (*local, self.evaluate(value, bindings)),

            // Returned objects are not tracked
            OperationKind::Invocation {
                result: Some(local),
                ..
            } => (*local, LocalBinding::unresolved()),

            _ => return,
        };

        bindings.insert(local, binding);
    }

    fn evaluate(&self, value: &FlowValue, bindings: &LocalBindings) -> LocalBinding {
        match value {
            FlowValue::Local(local) => bindings.get(local).cloned().unwrap_or_default(),
            FlowValue::Parameter(parameter) => self
                .parameter_locations
                .get(parameter)
                .map(|location| LocalBinding::location(*location))
                .unwrap_or_default(),
            FlowValue::FieldLoad { .. } | FlowValue::Unknown => LocalBinding::unresolved(),
            FlowValue::Literal => LocalBinding::default(),
        }
    }
}

impl PointsToSummary for LocalPointsToSummary {
    fn locations(&self) -> &LocationLayout {
        &self.layout
    }

    fn resolve(&self, operation: OperationId, value: &FlowValue) -> PointsToValue {
        match value {
            // Reads the pass never reached hold nothing
            FlowValue::Local(local) => self
                .operand_points_to
                .get(&(operation, *local))
                .cloned()
                .unwrap_or_else(PointsToValue::empty),

            _ => self.evaluate(value, &LocalBindings::default()).to_points_to(),
        }
    }

    fn creation_location(&self, operation: OperationId) -> Option<LocationId> {
        self.layout.id_of(LocationOrigin::Creation(operation))
    }
}

fn join_bindings(mut left: LocalBindings, right: &LocalBindings) -> LocalBindings {
    for (local, binding) in right {
        left.entry(*local).or_default().join_with(binding);
    }

    left
}

/// Every value an operation reads before it produces its result
fn operand_values(kind: &OperationKind) -> Vec<&FlowValue> {
    match kind {
        OperationKind::ObjectCreation { arguments, .. } => arguments.iter().collect(),
        OperationKind::Assignment { value, .. } => vec![value],
        OperationKind::Invocation {
            instance,
            arguments,
            ..
        } => instance.iter().chain(arguments.iter()).collect(),
        OperationKind::Return { value } | OperationKind::Throw { value } => {
            value.iter().collect()
        }
        OperationKind::UsingScopeExit { resource } => vec![resource],
        OperationKind::Expression => Vec::new(),
    }
}
