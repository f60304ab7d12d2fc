//! Join and update rules for dispose values.
//!
//! Read a kind as the set of facts observed along the incoming paths:
//! `Disposed`, `NotDisposed` and `Escaped` are single facts, `NotDisposedOrEscaped`
//! is the two bad facts together, and any set that mixes `Disposed` with another
//! fact collapses into `MaybeDisposed`. Join is set union followed by that collapse,
//! which keeps it idempotent, commutative and associative. `Unknown` is the empty
//! set and `NotDisposable` absorbs everything.

use crate::analysis::dispose_analysis::types::{
    DisposeAbstractValue, DisposeAbstractValueKind,
};
use crate::flow_graph::flow_nodes::OperationId;

impl DisposeAbstractValueKind {
    pub fn join(self, other: Self) -> Self {
        use DisposeAbstractValueKind::*;

        match (self, other) {
            (NotDisposable, _) | (_, NotDisposable) => NotDisposable,
            (Unknown, other) | (other, Unknown) => other,
            (Disposed, Disposed) => Disposed,
            (MaybeDisposed, _) | (_, MaybeDisposed) => MaybeDisposed,
            (Disposed, _) | (_, Disposed) => MaybeDisposed,
            (NotDisposed, NotDisposed) => NotDisposed,
            (Escaped, Escaped) => Escaped,

            // Any remaining pair mixes the two bad facts
            (NotDisposed | Escaped | NotDisposedOrEscaped, _) => NotDisposedOrEscaped,
        }
    }

    /// Kind after the value leaves analysable scope.
    /// Each path fact maps on its own: disposed stays disposed, not-disposed becomes escaped.
    pub(crate) fn escape(self) -> Self {
        use DisposeAbstractValueKind::*;

        match self {
            NotDisposed | Escaped | NotDisposedOrEscaped => Escaped,
            NotDisposable | Unknown | Disposed | MaybeDisposed => self,
        }
    }

    pub fn is_less_or_equal(self, other: Self) -> bool {
        self.join(other) == other
    }
}

impl DisposeAbstractValue {
    pub fn join(&self, other: &Self) -> Self {
        let kind = self.kind().join(other.kind());

        let mut operations = self.disposing_or_escaping_operations().to_vec();
        operations.extend_from_slice(other.disposing_or_escaping_operations());

        DisposeAbstractValue::new(kind, operations)
    }

    pub fn is_less_or_equal(&self, other: &Self) -> bool {
        &self.join(other) == other
    }

    /// Value after a dispose call on this location
    pub fn with_new_disposing_operation(&self, operation: OperationId) -> Self {
        if self.kind() == DisposeAbstractValueKind::NotDisposable {
            return self.clone();
        }

        let mut operations = self.disposing_or_escaping_operations().to_vec();
        operations.push(operation);
        DisposeAbstractValue::new(DisposeAbstractValueKind::Disposed, operations)
    }

    /// Value after this location escapes. Disposed-then-escaped is left alone.
    pub fn with_new_escaping_operation(&self, operation: OperationId) -> Self {
        match self.kind() {
            DisposeAbstractValueKind::NotDisposable
            | DisposeAbstractValueKind::Unknown
            | DisposeAbstractValueKind::Disposed => self.clone(),

            kind => {
                let mut operations = self.disposing_or_escaping_operations().to_vec();
                operations.push(operation);
                DisposeAbstractValue::new(kind.escape(), operations)
            }
        }
    }
}
