//! Forward fixed-point driver.
//!
//! Block states live in index-addressed arenas. A block's input is the join of the
//! outputs of its reached predecessors, plus the initial state for the entry block.
//! Only successors of blocks whose output changed are re-queued.

use crate::analysis::dispose_analysis::cancellation::CancellationToken;
use crate::analysis::dispose_analysis::state::DisposeState;
use crate::analysis::dispose_analysis::transfer::{DisposeTransferContext, transfer_block};
use crate::analysis::dispose_analysis::types::{
    BlockAnalysisResult, DisposeAbstractValue, DisposeAnalysisStats, LocationOrigin,
};
use crate::compiler_messages::compiler_errors::{CompilerError, ErrorLocation};
use crate::dispose_log;
use crate::flow_graph::flow_nodes::{BlockId, ControlFlowGraph, MethodSymbol, SourceSpan};
use crate::return_dispose_analysis_error;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

pub(crate) struct DataflowOutput {
    pub block_index_by_id: FxHashMap<BlockId, usize>,
    pub block_results: Vec<BlockAnalysisResult>,
    pub stats: DisposeAnalysisStats,
}

pub(crate) struct DisposeDataflow<'a> {
    graph: &'a ControlFlowGraph,
    method: &'a MethodSymbol,
    context: DisposeTransferContext<'a>,
    cancellation: &'a CancellationToken,
    block_index_by_id: FxHashMap<BlockId, usize>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
}

impl<'a> DisposeDataflow<'a> {
    pub(crate) fn new(
        graph: &'a ControlFlowGraph,
        method: &'a MethodSymbol,
        context: DisposeTransferContext<'a>,
        cancellation: &'a CancellationToken,
    ) -> Self {
        let block_index_by_id = graph
            .blocks
            .iter()
            .enumerate()
            .map(|(index, block)| (block.id, index))
            .collect::<FxHashMap<_, _>>();

        let mut successors = vec![Vec::new(); graph.blocks.len()];
        let mut predecessors = vec![Vec::new(); graph.blocks.len()];

        for (index, block) in graph.blocks.iter().enumerate() {
            for successor in &block.successors {
                // Dangling edges are rejected by validation before this point
                let Some(successor_index) = block_index_by_id.get(successor).copied() else {
                    continue;
                };

                if !successors[index].contains(&successor_index) {
                    successors[index].push(successor_index);
                    predecessors[successor_index].push(index);
                }
            }
        }

        Self {
            graph,
            method,
            context,
            cancellation,
            block_index_by_id,
            successors,
            predecessors,
        }
    }

    pub(crate) fn run(self) -> Result<DataflowOutput, CompilerError> {
        let Some(entry_index) = self
            .graph
            .entry()
            .and_then(|entry| self.block_index_by_id.get(&entry.id).copied())
        else {
            return_dispose_analysis_error!(
                format!(
                    "Method '{}' has no entry block in {}",
                    self.method.display_name(),
                    self.graph.id
                ),
                ErrorLocation::from_span(SourceSpan::default()),
                {
                    CompilationStage => "Dispose Analysis",
                }
            );
        };

        let block_count = self.graph.blocks.len();
        let initial_state = self.initial_state();

        let mut in_states: Vec<Option<DisposeState>> = vec![None; block_count];
        let mut out_states: Vec<Option<DisposeState>> = vec![None; block_count];
        let mut in_worklist = vec![false; block_count];
        let mut worklist = VecDeque::from([entry_index]);
        in_worklist[entry_index] = true;

        let mut stats = DisposeAnalysisStats {
            tracked_locations: self.context.points_to.locations().len(),
            ..DisposeAnalysisStats::default()
        };

        while let Some(block_index) = worklist.pop_front() {
            in_worklist[block_index] = false;
            stats.worklist_iterations += 1;

            if self.cancellation.is_cancelled() {
                return Err(CompilerError::cancelled(format!(
                    "Dispose analysis of '{}' was cancelled",
                    self.method.display_name()
                )));
            }

            let Some(input_state) =
                self.block_input(block_index, entry_index, &initial_state, &out_states)
            else {
                continue;
            };

            let block = &self.graph.blocks[block_index];
            let mut output_state = input_state.clone();
            let block_stats = transfer_block(&self.context, block, &mut output_state);

            stats.blocks_processed += 1;
            stats.operations_analyzed += block_stats.operations_analyzed;
            in_states[block_index] = Some(input_state);

            let changed_out = match &out_states[block_index] {
                Some(existing) => existing != &output_state,
                None => true,
            };

            if !changed_out {
                continue;
            }

            out_states[block_index] = Some(output_state);

            for successor in &self.successors[block_index] {
                if !in_worklist[*successor] {
                    in_worklist[*successor] = true;
                    worklist.push_back(*successor);
                }
            }
        }

        stats.reachable_blocks = out_states.iter().filter(|state| state.is_some()).count();

        dispose_log!(format!(
            "[Dispose] '{}' converged: reachable={} processed={} iterations={} locations={}",
            self.method.display_name(),
            stats.reachable_blocks,
            stats.blocks_processed,
            stats.worklist_iterations,
            stats.tracked_locations
        ));

        let block_results = in_states
            .into_iter()
            .zip(out_states)
            .map(|(input, output)| BlockAnalysisResult { input, output })
            .collect();

        Ok(DataflowOutput {
            block_index_by_id: self.block_index_by_id,
            block_results,
            stats,
        })
    }

    /// Disposable parameters are live and undisposed when the method starts
    fn initial_state(&self) -> DisposeState {
        let layout = self.context.points_to.locations();
        let mut state = DisposeState::empty(layout.len());

        for (location_id, location) in layout.iter() {
            if matches!(location.origin, LocationOrigin::Symbol(_)) && location.disposable {
                state.set(location_id, DisposeAbstractValue::not_disposed());
            }
        }

        state
    }

    fn block_input(
        &self,
        block_index: usize,
        entry_index: usize,
        initial_state: &DisposeState,
        out_states: &[Option<DisposeState>],
    ) -> Option<DisposeState> {
        let mut input = (block_index == entry_index).then(|| initial_state.clone());

        for predecessor in &self.predecessors[block_index] {
            let Some(predecessor_output) = &out_states[*predecessor] else {
                continue;
            };

            input = Some(match input {
                Some(existing) => existing.join(predecessor_output),
                None => predecessor_output.clone(),
            });
        }

        input
    }
}
