use crate::flow_graph::flow_nodes::{
    BlockId, GraphId, MethodId, OperationId, RegionId, SourceSpan, SymbolId, TypeId,
};
use std::fmt::{Display, Formatter, Result};

impl Display for GraphId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "cfg{}", self.0)
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "bb{}", self.0)
    }
}

impl Display for OperationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "op{}", self.0)
    }
}

impl Display for SymbolId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "sym{}", self.0)
    }
}

impl Display for TypeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "type{}", self.0)
    }
}

impl Display for MethodId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "method{}", self.0)
    }
}

impl Display for RegionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "region{}", self.0)
    }
}

impl Display for SourceSpan {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}:{}", self.start_line, self.start_column)
    }
}
