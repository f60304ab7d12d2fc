use crate::analysis::dispose_analysis::state::{DisposeState, LocationLayout};
use crate::flow_graph::flow_nodes::{
    BlockId, ControlFlowGraph, MethodSymbol, OperationId, SymbolId, SyntaxRef, TypeId,
};
use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

// ============================================================
// Abstract locations
// ============================================================

/// Dense index of an interned location inside one method body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(pub u32);

impl LocationId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loc{}", self.0)
    }
}

/// What makes two locations the same location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationOrigin {
    Creation(OperationId),
    Symbol(SymbolId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationSite {
    pub operation: OperationId,
    pub syntax: SyntaxRef,
}

/// A statically tracked stand-in for a runtime object.
///
/// Identity is the origin alone. The remaining fields are fixed when the
/// location is interned and never change afterwards.
#[derive(Debug, Clone)]
pub struct AbstractLocation {
    pub origin: LocationOrigin,
    pub creation: Option<CreationSite>,
    pub symbol: Option<SymbolId>,
    pub type_id: TypeId,
    pub disposable: bool,
}

impl AbstractLocation {
    pub fn from_creation(
        operation: OperationId,
        syntax: SyntaxRef,
        type_id: TypeId,
        disposable: bool,
    ) -> Self {
        Self {
            origin: LocationOrigin::Creation(operation),
            creation: Some(CreationSite { operation, syntax }),
            symbol: None,
            type_id,
            disposable,
        }
    }

    pub fn from_symbol(symbol: SymbolId, type_id: TypeId, disposable: bool) -> Self {
        Self {
            origin: LocationOrigin::Symbol(symbol),
            creation: None,
            symbol: Some(symbol),
            type_id,
            disposable,
        }
    }
}

impl PartialEq for AbstractLocation {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin
    }
}

impl Eq for AbstractLocation {}

impl Hash for AbstractLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.origin.hash(state);
    }
}

impl fmt::Display for AbstractLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.creation, self.symbol) {
            (Some(creation), _) => write!(f, "'{}'", creation.syntax.text),
            (None, Some(symbol)) => write!(f, "parameter {}", symbol),
            (None, None) => write!(f, "<anonymous>"),
        }
    }
}

// ============================================================
// Abstract values
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisposeAbstractValueKind {
    NotDisposable,
    Unknown,
    NotDisposed,
    Disposed,
    MaybeDisposed,
    Escaped,
    NotDisposedOrEscaped,
}

impl DisposeAbstractValueKind {
    pub const ALL: [Self; 7] = [
        Self::NotDisposable,
        Self::Unknown,
        Self::NotDisposed,
        Self::Disposed,
        Self::MaybeDisposed,
        Self::Escaped,
        Self::NotDisposedOrEscaped,
    ];
}

/// The state of one location at one program point, plus the operations that
/// disposed it or let it escape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisposeAbstractValue {
    kind: DisposeAbstractValueKind,
    // Sorted and deduplicated
    disposing_or_escaping_operations: Vec<OperationId>,
}

impl DisposeAbstractValue {
    pub fn new(kind: DisposeAbstractValueKind, mut operations: Vec<OperationId>) -> Self {
        if matches!(
            kind,
            DisposeAbstractValueKind::NotDisposable | DisposeAbstractValueKind::Unknown
        ) {
            operations.clear();
        }

        operations.sort_unstable();
        operations.dedup();

        Self {
            kind,
            disposing_or_escaping_operations: operations,
        }
    }

    pub fn not_disposable() -> Self {
        Self::new(DisposeAbstractValueKind::NotDisposable, Vec::new())
    }

    pub fn unknown() -> Self {
        Self::new(DisposeAbstractValueKind::Unknown, Vec::new())
    }

    pub fn not_disposed() -> Self {
        Self::new(DisposeAbstractValueKind::NotDisposed, Vec::new())
    }

    pub fn kind(&self) -> DisposeAbstractValueKind {
        self.kind
    }

    pub fn disposing_or_escaping_operations(&self) -> &[OperationId] {
        &self.disposing_or_escaping_operations
    }
}

// ============================================================
// Results
// ============================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisposeAnalysisStats {
    pub reachable_blocks: usize,
    pub blocks_processed: usize,
    pub worklist_iterations: usize,
    pub operations_analyzed: usize,
    pub tracked_locations: usize,
}

/// Input and output state of one block. `None` when the block was never reached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockAnalysisResult {
    pub input: Option<DisposeState>,
    pub output: Option<DisposeState>,
}

/// Converged dispose data for one method body. Read-only once built.
#[derive(Debug, Clone)]
pub struct DisposeAnalysisResult {
    pub(crate) graph: ControlFlowGraph,
    pub(crate) method: MethodSymbol,
    pub(crate) layout: LocationLayout,
    pub(crate) block_index_by_id: FxHashMap<BlockId, usize>,
    pub(crate) block_results: Vec<BlockAnalysisResult>,
    pub(crate) operation_blocks: FxHashMap<OperationId, BlockId>,
    pub(crate) stats: DisposeAnalysisStats,
}

impl DisposeAnalysisResult {
    pub fn control_flow_graph(&self) -> &ControlFlowGraph {
        &self.graph
    }

    pub fn method(&self) -> &MethodSymbol {
        &self.method
    }

    pub fn locations(&self) -> &LocationLayout {
        &self.layout
    }

    pub fn location(&self, id: LocationId) -> Option<&AbstractLocation> {
        self.layout.get(id)
    }

    pub fn stats(&self) -> &DisposeAnalysisStats {
        &self.stats
    }

    pub fn block(&self, block_id: BlockId) -> Option<&BlockAnalysisResult> {
        let index = self.block_index_by_id.get(&block_id)?;
        self.block_results.get(*index)
    }

    /// The authoritative snapshot for the leak verdict
    pub fn exit_block_output(&self) -> Option<&DisposeState> {
        let exit = self.graph.exit()?;
        self.block(exit.id)?.output.as_ref()
    }

    /// Location/value pairs of a state in location insertion order
    pub fn entries<'a>(
        &'a self,
        state: &'a DisposeState,
    ) -> impl Iterator<Item = (&'a AbstractLocation, &'a DisposeAbstractValue)> + 'a {
        state
            .iter()
            .filter_map(move |(location_id, value)| {
                self.layout.get(location_id).map(|location| (location, value))
            })
    }

    /// Whether an operation sits in a catch or filter handler of this graph
    pub fn is_inside_catch_region(&self, operation: OperationId) -> bool {
        let Some(block_id) = self.operation_blocks.get(&operation) else {
            return false;
        };
        let Some(block) = self
            .block_index_by_id
            .get(block_id)
            .and_then(|index| self.graph.blocks.get(*index))
        else {
            return false;
        };

        self.graph.is_region_inside_handler(block.region)
    }
}
