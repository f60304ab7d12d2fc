//! Transfer functions.
//!
//! Each operation is first classified into a short list of lifetime effects, then
//! every effect is applied to the state by its own handler. Effects only touch
//! locations the points-to summary resolves and its layout knows.

use crate::analysis::dispose_analysis::points_to::{PointsToSummary, PointsToValue};
use crate::analysis::dispose_analysis::state::{DisposeState, LocationLayout};
use crate::analysis::dispose_analysis::types::{DisposeAbstractValue, LocationId};
use crate::flow_graph::flow_nodes::{
    AssignTarget, BasicBlock, FlowValue, MethodId, Operation, OperationId, OperationKind,
};
use crate::flow_graph::type_registry::{ParameterOwnership, TypeRegistry};

pub(crate) struct DisposeTransferContext<'a> {
    pub registry: &'a TypeRegistry,
    pub points_to: &'a dyn PointsToSummary,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct BlockTransferStats {
    pub operations_analyzed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LifetimeEffect {
    Creation {
        location: LocationId,
    },
    Dispose {
        targets: PointsToValue,
    },
    Escape {
        values: PointsToValue,
    },
    /// A wrapper takes over the disposal obligation of the wrapped values
    OwnershipTransfer {
        wrapper: LocationId,
        sources: Vec<LocationId>,
    },
}

pub(crate) fn transfer_block(
    context: &DisposeTransferContext<'_>,
    block: &BasicBlock,
    state: &mut DisposeState,
) -> BlockTransferStats {
    let mut stats = BlockTransferStats::default();

    for operation in &block.operations {
        transfer_operation(context, operation, state);
        stats.operations_analyzed += 1;
    }

    stats
}

fn transfer_operation(
    context: &DisposeTransferContext<'_>,
    operation: &Operation,
    state: &mut DisposeState,
) {
    let layout = context.points_to.locations();

    for effect in classify_operation(context, operation) {
        apply_effect(layout, state, &effect, operation.id);
    }
}

pub(crate) fn classify_operation(
    context: &DisposeTransferContext<'_>,
    operation: &Operation,
) -> Vec<LifetimeEffect> {
    let reader = operation.id;
    let mut effects = Vec::new();

    match &operation.kind {
        OperationKind::ObjectCreation {
            constructor,
            arguments,
            ..
        } => {
            let mut sources = Vec::new();
            for (index, argument) in arguments.iter().enumerate() {
                let ownership = constructor
                    .map(|constructor| context.registry.parameter_ownership(constructor, index))
                    .unwrap_or_default();

                if ownership == ParameterOwnership::TransfersOwnership {
                    let resolved = context.points_to.resolve(reader, argument);
                    if let PointsToValue::Known(locations) = resolved {
                        sources.extend(locations);
                    }
                    continue;
                }

                classify_argument(context, reader, ownership, argument, &mut effects);
            }

            if let Some(location) = context.points_to.creation_location(operation.id) {
                if sources.is_empty() {
                    effects.push(LifetimeEffect::Creation { location });
                } else {
                    sources.sort_unstable();
                    sources.dedup();
                    effects.push(LifetimeEffect::OwnershipTransfer {
                        wrapper: location,
                        sources,
                    });
                }
            }
        }

        OperationKind::Assignment { target, value } => match target {
            // Local copies are aliasing, which the points-to summary already covers
            AssignTarget::Local(_) => {}

            AssignTarget::Field { .. }
            | AssignTarget::Property { .. }
            | AssignTarget::ArrayElement
            | AssignTarget::StaticField { .. } => effects.push(LifetimeEffect::Escape {
                values: context.points_to.resolve(reader, value),
            }),
        },

        OperationKind::Invocation {
            method,
            instance,
            arguments,
            ..
        } => {
            if let Some(instance) = instance {
                if context.registry.disposes_instance(*method) {
                    effects.push(LifetimeEffect::Dispose {
                        targets: context.points_to.resolve(reader, instance),
                    });
                }
            }

            classify_invocation_arguments(context, reader, *method, arguments, &mut effects);
        }

        OperationKind::Return { value: Some(value) }
        | OperationKind::Throw { value: Some(value) } => {
            effects.push(LifetimeEffect::Escape {
                values: context.points_to.resolve(reader, value),
            });
        }

        OperationKind::UsingScopeExit { resource } => {
            effects.push(LifetimeEffect::Dispose {
                targets: context.points_to.resolve(reader, resource),
            });
        }

        OperationKind::Return { value: None }
        | OperationKind::Throw { value: None }
        | OperationKind::Expression => {}
    }

    effects
}

fn classify_invocation_arguments(
    context: &DisposeTransferContext<'_>,
    reader: OperationId,
    method: MethodId,
    arguments: &[FlowValue],
    effects: &mut Vec<LifetimeEffect>,
) {
    for (index, argument) in arguments.iter().enumerate() {
        let ownership = context.registry.parameter_ownership(method, index);
        classify_argument(context, reader, ownership, argument, effects);
    }
}

fn classify_argument(
    context: &DisposeTransferContext<'_>,
    reader: OperationId,
    ownership: ParameterOwnership,
    argument: &FlowValue,
    effects: &mut Vec<LifetimeEffect>,
) {
    match ownership {
        ParameterOwnership::Borrowed => {}

        ParameterOwnership::DisposesArgument => effects.push(LifetimeEffect::Dispose {
            targets: context.points_to.resolve(reader, argument),
        }),

        // Outside a constructor, handing over ownership is an escape like any other
        ParameterOwnership::TransfersOwnership | ParameterOwnership::Unknown => {
            effects.push(LifetimeEffect::Escape {
                values: context.points_to.resolve(reader, argument),
            })
        }
    }
}

pub(crate) fn apply_effect(
    layout: &LocationLayout,
    state: &mut DisposeState,
    effect: &LifetimeEffect,
    operation: OperationId,
) {
    match effect {
        LifetimeEffect::Creation { location } => {
            if let Some(value) = fresh_value(layout, *location) {
                state.set(*location, value);
            }
        }

        LifetimeEffect::Dispose { targets } => {
            let PointsToValue::Known(locations) = targets else {
                return;
            };

            for location in locations {
                if !layout.is_disposable(*location) {
                    continue;
                }

                let value = state.value_or_unknown(*location);
                state.set(*location, value.with_new_disposing_operation(operation));
            }
        }

        LifetimeEffect::Escape { values } => {
            let PointsToValue::Known(locations) = values else {
                return;
            };

            escape_locations(layout, state, locations, operation);
        }

        LifetimeEffect::OwnershipTransfer { wrapper, sources } => {
            let Some(wrapper_location) = layout.get(*wrapper) else {
                return;
            };

            let disposable_sources = sources
                .iter()
                .copied()
                .filter(|source| layout.is_disposable(*source))
                .collect::<Vec<_>>();

            let wrapper_value = if !wrapper_location.disposable {
                DisposeAbstractValue::not_disposable()
            } else if disposable_sources.is_empty() {
                DisposeAbstractValue::not_disposed()
            } else {
                // Read every source before any of them escapes below
                disposable_sources
                    .iter()
                    .map(|source| state.value_or_unknown(*source))
                    .fold(DisposeAbstractValue::unknown(), |joined, value| {
                        joined.join(&value)
                    })
            };

            escape_locations(layout, state, &disposable_sources, operation);
            state.set(*wrapper, wrapper_value);
        }
    }
}

fn escape_locations(
    layout: &LocationLayout,
    state: &mut DisposeState,
    locations: &[LocationId],
    operation: OperationId,
) {
    for location in locations {
        if !layout.is_disposable(*location) {
            continue;
        }

        let value = state.value_or_unknown(*location);
        let escaped = value.with_new_escaping_operation(operation);

        // Escaping an untracked location must not create an entry
        if state.get(*location).is_some() {
            state.set(*location, escaped);
        }
    }
}

fn fresh_value(layout: &LocationLayout, location: LocationId) -> Option<DisposeAbstractValue> {
    let value = if layout.get(location)?.disposable {
        DisposeAbstractValue::not_disposed()
    } else {
        DisposeAbstractValue::not_disposable()
    };

    Some(value)
}
