//! ============================================================
//!                     Flow Graph Nodes
//! ============================================================
//! The typed control-flow graph a host compiler hands to the analyzers.
//!  - One graph per method body (or field/property initializer)
//!  - Operations are already linearised: nested creations live in temporaries
//!  - Exception handling is described by regions, not by special edges
//!
//! The host builds these from its own bound trees. Everything here is plain data
//! and round-trips through serde so hosts can also hand graphs over as JSON.

use serde::{Deserialize, Serialize};

// ============================================================
// Stable IDs
// ============================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub u32);

// ============================================================
// Source positions
// ============================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl SourceSpan {
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    pub fn line(line: u32) -> Self {
        Self::new(line, 1, line, 1)
    }
}

/// The syntax an operation was bound from. The text is what diagnostics quote.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyntaxRef {
    pub text: String,
    #[serde(default)]
    pub span: SourceSpan,
}

impl SyntaxRef {
    pub fn new(text: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }
}

// ============================================================
// Symbols
// ============================================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSymbol {
    pub id: SymbolId,
    pub name: String,
    pub type_id: TypeId,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSymbol {
    pub id: MethodId,
    pub name: String,
    pub containing_type: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSymbol>,
}

impl MethodSymbol {
    /// Minimally qualified display: `Type.Name(ParamType, ...)`
    pub fn display_name(&self) -> String {
        let parameter_types = self
            .parameters
            .iter()
            .map(|parameter| parameter.type_name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "{}.{}({})",
            self.containing_type, self.name, parameter_types
        )
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.containing_type, self.name)
    }
}

/// Whatever owns an operation block. Only methods are analysed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwningSymbol {
    Method(MethodSymbol),
    FieldInitializer { name: String },
    PropertyInitializer { name: String },
}

impl OwningSymbol {
    pub fn as_method(&self) -> Option<&MethodSymbol> {
        match self {
            OwningSymbol::Method(method) => Some(method),
            OwningSymbol::FieldInitializer { .. } | OwningSymbol::PropertyInitializer { .. } => {
                None
            }
        }
    }
}

// ============================================================
// Graph
// ============================================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlowGraph {
    pub id: GraphId,
    pub blocks: Vec<BasicBlock>,
    pub regions: Vec<ControlFlowRegion>,
}

impl ControlFlowGraph {
    pub fn entry(&self) -> Option<&BasicBlock> {
        self.blocks
            .iter()
            .find(|block| block.kind == BasicBlockKind::Entry)
    }

    pub fn exit(&self) -> Option<&BasicBlock> {
        self.blocks
            .iter()
            .find(|block| block.kind == BasicBlockKind::Exit)
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.blocks.iter().flat_map(|block| block.operations.iter())
    }

    pub fn region(&self, region_id: RegionId) -> Option<&ControlFlowRegion> {
        self.regions.iter().find(|region| region.id == region_id)
    }

    /// True when `region_id` is a catch or filter region, or nested inside one.
    pub fn is_region_inside_handler(&self, region_id: RegionId) -> bool {
        let mut current = Some(region_id);
        // Regions form a tree; the bound stops malformed parent cycles.
        let mut remaining = self.regions.len();

        while let Some(id) = current {
            let Some(region) = self.region(id) else {
                return false;
            };

            if matches!(region.kind, RegionKind::Catch | RegionKind::Filter) {
                return true;
            }

            if remaining == 0 {
                return false;
            }
            remaining -= 1;
            current = region.parent;
        }

        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasicBlockKind {
    Entry,
    Exit,
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub kind: BasicBlockKind,
    #[serde(default)]
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub successors: Vec<BlockId>,
    pub region: RegionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionKind {
    Root,
    Try,
    Catch,
    Filter,
    Finally,
    LocalLifetime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlowRegion {
    pub id: RegionId,
    pub kind: RegionKind,
    #[serde(default)]
    pub parent: Option<RegionId>,
}

// ============================================================
// Operations
// ============================================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub kind: OperationKind,
    #[serde(default)]
    pub syntax: SyntaxRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    /// `new T(args)`, optionally stored straight into a local
    ObjectCreation {
        type_id: TypeId,
        #[serde(default)]
        constructor: Option<MethodId>,
        #[serde(default)]
        arguments: Vec<FlowValue>,
        #[serde(default)]
        result: Option<SymbolId>,
    },

    Assignment {
        target: AssignTarget,
        value: FlowValue,
    },

    Invocation {
        method: MethodId,
        #[serde(default)]
        instance: Option<FlowValue>,
        #[serde(default)]
        arguments: Vec<FlowValue>,
        #[serde(default)]
        result: Option<SymbolId>,
    },

    Return {
        #[serde(default)]
        value: Option<FlowValue>,
    },

    Throw {
        #[serde(default)]
        value: Option<FlowValue>,
    },

    /// Implicit dispose at the end of a `using` scope
    UsingScopeExit { resource: FlowValue },

    /// Anything with no effect on object lifetimes
    Expression,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignTarget {
    Local(SymbolId),
    Field { name: String },
    Property { name: String },
    ArrayElement,
    StaticField { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowValue {
    Local(SymbolId),
    Parameter(SymbolId),
    FieldLoad { name: String },
    Literal,
    Unknown,
}

// ============================================================
// Compilation input
// ============================================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodBody {
    pub owner: OwningSymbol,
    pub graph: ControlFlowGraph,
}
