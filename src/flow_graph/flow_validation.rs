//! Flow Graph Validation
//!
//! Structural checks run before a graph reaches the dispose analysis.
//! The fixed-point driver relies on these invariants instead of re-checking them.

use crate::compiler_messages::compiler_errors::{CompilerError, ErrorLocation, ErrorMetaDataKey};
use crate::flow_graph::flow_nodes::{
    BasicBlockKind, BlockId, ControlFlowGraph, OperationId, RegionId, SourceSpan,
};
use rustc_hash::FxHashSet;

pub fn validate_graph(graph: &ControlFlowGraph) -> Result<(), CompilerError> {
    let mut validator = GraphValidator::new(graph);
    validator.validate()
}

struct GraphValidator<'a> {
    graph: &'a ControlFlowGraph,
    block_ids: FxHashSet<BlockId>,
    region_ids: FxHashSet<RegionId>,
    operation_ids: FxHashSet<OperationId>,
}

impl<'a> GraphValidator<'a> {
    fn new(graph: &'a ControlFlowGraph) -> Self {
        Self {
            graph,
            block_ids: FxHashSet::default(),
            region_ids: FxHashSet::default(),
            operation_ids: FxHashSet::default(),
        }
    }

    fn validate(&mut self) -> Result<(), CompilerError> {
        self.collect_definition_ids()?;
        self.validate_entry_and_exit()?;
        self.validate_blocks()?;
        self.validate_regions()?;
        Ok(())
    }

    fn collect_definition_ids(&mut self) -> Result<(), CompilerError> {
        for region in &self.graph.regions {
            if !self.region_ids.insert(region.id) {
                return Err(self.error(
                    format!("Duplicate region id {} in {}", region.id, self.graph.id),
                    SourceSpan::default(),
                ));
            }
        }

        for block in &self.graph.blocks {
            if !self.block_ids.insert(block.id) {
                return Err(self.error(
                    format!("Duplicate block id {} in {}", block.id, self.graph.id),
                    SourceSpan::default(),
                ));
            }

            for operation in &block.operations {
                if !self.operation_ids.insert(operation.id) {
                    return Err(self.error(
                        format!(
                            "Duplicate operation id {} in block {}",
                            operation.id, block.id
                        ),
                        operation.syntax.span,
                    ));
                }
            }
        }

        Ok(())
    }

    fn validate_entry_and_exit(&self) -> Result<(), CompilerError> {
        let entry_count = self.count_blocks_of_kind(BasicBlockKind::Entry);
        let exit_count = self.count_blocks_of_kind(BasicBlockKind::Exit);

        if entry_count != 1 {
            return Err(self.error(
                format!(
                    "{} must have exactly one entry block, found {}",
                    self.graph.id, entry_count
                ),
                SourceSpan::default(),
            ));
        }

        if exit_count != 1 {
            return Err(self.error(
                format!(
                    "{} must have exactly one exit block, found {}",
                    self.graph.id, exit_count
                ),
                SourceSpan::default(),
            ));
        }

        if let Some(exit) = self.graph.exit() {
            if !exit.successors.is_empty() {
                return Err(self.error(
                    format!("Exit block {} cannot have successors", exit.id),
                    SourceSpan::default(),
                ));
            }
        }

        Ok(())
    }

    fn validate_blocks(&self) -> Result<(), CompilerError> {
        for block in &self.graph.blocks {
            if !self.region_ids.contains(&block.region) {
                return Err(self.error(
                    format!(
                        "Block {} belongs to unknown region {}",
                        block.id, block.region
                    ),
                    SourceSpan::default(),
                ));
            }

            for successor in &block.successors {
                if !self.block_ids.contains(successor) {
                    return Err(self.error(
                        format!(
                            "Block {} jumps to unknown block {}",
                            block.id, successor
                        ),
                        SourceSpan::default(),
                    ));
                }
            }
        }

        Ok(())
    }

    fn validate_regions(&self) -> Result<(), CompilerError> {
        for region in &self.graph.regions {
            let Some(parent) = region.parent else {
                continue;
            };

            if !self.region_ids.contains(&parent) {
                return Err(self.error(
                    format!(
                        "Region {} has unknown parent region {}",
                        region.id, parent
                    ),
                    SourceSpan::default(),
                ));
            }

            // Walk up to the root to reject parent cycles.
            let mut visited = FxHashSet::default();
            let mut current = Some(region.id);
            while let Some(id) = current {
                if !visited.insert(id) {
                    return Err(self.error(
                        format!("Region {} is part of a parent cycle", region.id),
                        SourceSpan::default(),
                    ));
                }
                current = self.graph.region(id).and_then(|region| region.parent);
            }
        }

        Ok(())
    }

    fn count_blocks_of_kind(&self, kind: BasicBlockKind) -> usize {
        self.graph
            .blocks
            .iter()
            .filter(|block| block.kind == kind)
            .count()
    }

    fn error(&self, msg: String, span: SourceSpan) -> CompilerError {
        let mut error = CompilerError::new_flow_graph_error(msg, ErrorLocation::from_span(span));
        error.new_metadata_entry(ErrorMetaDataKey::CompilationStage, "Flow Graph Validation");
        error
    }
}

#[cfg(test)]
#[path = "tests/flow_validation_tests.rs"]
mod tests;
