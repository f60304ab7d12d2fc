mod cache;
mod cancellation;
mod dataflow;
mod lattice;
mod points_to;
mod state;
mod transfer;
mod types;
mod verdict;

#[cfg(test)]
mod tests;

pub use cache::DisposeResultCache;
pub use cancellation::CancellationToken;
pub use points_to::{LocalPointsToSummary, PointsToSummary, PointsToValue};
pub use state::{DisposeState, LocationLayout};
pub use types::{
    AbstractLocation, BlockAnalysisResult, CreationSite, DisposeAbstractValue,
    DisposeAbstractValueKind, DisposeAnalysisResult, DisposeAnalysisStats, LocationId,
    LocationOrigin,
};
pub use verdict::{LeakVerdict, compute_leak_verdicts};

use crate::analysis::dispose_analysis::dataflow::DisposeDataflow;
use crate::analysis::dispose_analysis::transfer::DisposeTransferContext;
use crate::compiler_messages::compiler_errors::{CompilerError, ErrorLocation};
use crate::dispose_log;
use crate::flow_graph::flow_nodes::{
    ControlFlowGraph, MethodBody, MethodSymbol, OperationKind, SourceSpan,
};
use crate::flow_graph::flow_validation::validate_graph;
use crate::flow_graph::type_registry::TypeRegistry;
use crate::return_dispose_analysis_error;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Compilation-wide entry point for dispose results.
///
/// Owns the result cache for one compilation and can be shared across the threads
/// analysing its method bodies.
#[derive(Debug)]
pub struct DisposeAnalysisHelper<'a> {
    registry: &'a TypeRegistry,
    cache: DisposeResultCache,
}

impl<'a> DisposeAnalysisHelper<'a> {
    /// `None` when the compilation declares no disposable type, so nothing can leak
    pub fn try_create(registry: &'a TypeRegistry) -> Option<Self> {
        if !registry.has_any_disposable_type() {
            return None;
        }

        Some(Self {
            registry,
            cache: DisposeResultCache::new(),
        })
    }

    pub fn registry(&self) -> &TypeRegistry {
        self.registry
    }

    /// Cheap pre-filter: the body belongs to `method` and creates at least one disposable object
    pub fn has_any_disposable_creation_descendant(
        &self,
        body: &MethodBody,
        method: &MethodSymbol,
    ) -> bool {
        let Some(owner) = body.owner.as_method() else {
            return false;
        };

        owner.id == method.id
            && body.graph.operations().any(|operation| match &operation.kind {
                OperationKind::ObjectCreation { type_id, .. } => {
                    self.registry.is_disposable(*type_id)
                }
                _ => false,
            })
    }

    /// Cached result for `(body.graph.id, method.id)`.
    /// Cancellation comes back as an `ErrorType::Cancelled` error and is not cached.
    pub fn get_or_compute_result(
        &self,
        body: &MethodBody,
        method: &MethodSymbol,
        cancellation: &CancellationToken,
    ) -> Result<Arc<DisposeAnalysisResult>, CompilerError> {
        if body.owner.as_method().map(|owner| owner.id) != Some(method.id) {
            return_dispose_analysis_error!(
                format!(
                    "Body {} is not owned by method '{}'",
                    body.graph.id,
                    method.display_name()
                ),
                ErrorLocation::from_span(SourceSpan::default()),
                {
                    CompilationStage => "Dispose Analysis",
                    PrimarySuggestion => "Pass the method symbol that owns this body",
                }
            );
        }

        self.cache.get_or_compute((body.graph.id, method.id), || {
            compute_dispose_analysis(&body.graph, method, self.registry, cancellation)
        })
    }

    /// Host-facing flavour: any failure, cancellation included, is simply "no result"
    pub fn try_get_or_compute_result(
        &self,
        body: &MethodBody,
        method: &MethodSymbol,
        cancellation: &CancellationToken,
    ) -> Option<Arc<DisposeAnalysisResult>> {
        match self.get_or_compute_result(body, method, cancellation) {
            Ok(result) => Some(result),
            Err(_error) => {
                dispose_log!(format!(
                    "[Dispose] No result for '{}': {}",
                    method.display_name(),
                    _error
                ));
                None
            }
        }
    }

    pub fn computed_results(&self) -> usize {
        self.cache.len()
    }

    pub fn computations(&self) -> usize {
        self.cache.computations()
    }
}

/// Runs the analysis with the method-local points-to summary
pub fn compute_dispose_analysis(
    graph: &ControlFlowGraph,
    method: &MethodSymbol,
    registry: &TypeRegistry,
    cancellation: &CancellationToken,
) -> Result<DisposeAnalysisResult, CompilerError> {
    validate_graph(graph)?;
    let points_to = LocalPointsToSummary::build(graph, method, registry);
    run_analysis(graph, method, registry, &points_to, cancellation)
}

/// Runs the analysis with a host-supplied points-to summary
pub fn compute_with_points_to(
    graph: &ControlFlowGraph,
    method: &MethodSymbol,
    registry: &TypeRegistry,
    points_to: &dyn PointsToSummary,
    cancellation: &CancellationToken,
) -> Result<DisposeAnalysisResult, CompilerError> {
    validate_graph(graph)?;
    run_analysis(graph, method, registry, points_to, cancellation)
}

fn run_analysis(
    graph: &ControlFlowGraph,
    method: &MethodSymbol,
    registry: &TypeRegistry,
    points_to: &dyn PointsToSummary,
    cancellation: &CancellationToken,
) -> Result<DisposeAnalysisResult, CompilerError> {
    let context = DisposeTransferContext {
        registry,
        points_to,
    };
    let output = DisposeDataflow::new(graph, method, context, cancellation).run()?;

    let mut operation_blocks = FxHashMap::default();
    for block in &graph.blocks {
        for operation in &block.operations {
            operation_blocks.insert(operation.id, block.id);
        }
    }

    Ok(DisposeAnalysisResult {
        graph: graph.clone(),
        method: method.clone(),
        layout: points_to.locations().clone(),
        block_index_by_id: output.block_index_by_id,
        block_results: output.block_results,
        operation_blocks,
        stats: output.stats,
    })
}
