#![cfg(test)]

use crate::analysis::dispose_analysis::{DisposeAbstractValue, DisposeAbstractValueKind};
use crate::flow_graph::flow_nodes::OperationId;
use proptest::prelude::*;

use DisposeAbstractValueKind::*;

fn value(kind: DisposeAbstractValueKind, operations: &[u32]) -> DisposeAbstractValue {
    DisposeAbstractValue::new(
        kind,
        operations.iter().copied().map(OperationId).collect(),
    )
}

fn kind_strategy() -> impl Strategy<Value = DisposeAbstractValueKind> {
    prop::sample::select(DisposeAbstractValueKind::ALL.to_vec())
}

fn value_strategy() -> impl Strategy<Value = DisposeAbstractValue> {
    (kind_strategy(), prop::collection::vec(0u32..8, 0..4))
        .prop_map(|(kind, operations)| value(kind, &operations))
}

#[test]
fn join_table_matches_documented_cases() {
    assert_eq!(Disposed.join(Disposed), Disposed);
    assert_eq!(Disposed.join(NotDisposed), MaybeDisposed);
    assert_eq!(Disposed.join(Escaped), MaybeDisposed);
    assert_eq!(Disposed.join(NotDisposedOrEscaped), MaybeDisposed);
    assert_eq!(NotDisposed.join(Escaped), NotDisposedOrEscaped);
    assert_eq!(NotDisposed.join(NotDisposed), NotDisposed);
    assert_eq!(Escaped.join(Escaped), Escaped);
    assert_eq!(NotDisposedOrEscaped.join(Escaped), NotDisposedOrEscaped);
    assert_eq!(MaybeDisposed.join(NotDisposed), MaybeDisposed);
}

#[test]
fn unknown_is_identity_and_not_disposable_absorbs() {
    for kind in DisposeAbstractValueKind::ALL {
        assert_eq!(Unknown.join(kind), kind);
        assert_eq!(kind.join(Unknown), kind);
        assert_eq!(NotDisposable.join(kind), NotDisposable);
    }
}

#[test]
fn escape_keeps_disposed_facts() {
    assert_eq!(NotDisposed.escape(), Escaped);
    assert_eq!(NotDisposedOrEscaped.escape(), Escaped);
    assert_eq!(Disposed.escape(), Disposed);
    assert_eq!(MaybeDisposed.escape(), MaybeDisposed);
    assert_eq!(Unknown.escape(), Unknown);
}

#[test]
fn value_join_unions_operations() {
    let disposed = value(Disposed, &[3]);
    let escaped = value(Escaped, &[5, 1]);

    let joined = disposed.join(&escaped);

    assert_eq!(joined.kind(), MaybeDisposed);
    assert_eq!(
        joined.disposing_or_escaping_operations(),
        &[OperationId(1), OperationId(3), OperationId(5)]
    );
}

#[test]
fn uninformative_values_carry_no_operations() {
    assert!(value(NotDisposable, &[1, 2]).disposing_or_escaping_operations().is_empty());
    assert!(value(Unknown, &[4]).disposing_or_escaping_operations().is_empty());

    let joined = value(NotDisposable, &[]).join(&value(Disposed, &[7]));
    assert_eq!(joined, DisposeAbstractValue::not_disposable());
}

#[test]
fn dispose_after_escape_is_disposed_but_escape_after_dispose_is_not_escaped() {
    let escaped = DisposeAbstractValue::not_disposed().with_new_escaping_operation(OperationId(1));
    assert_eq!(escaped.kind(), Escaped);

    let disposed = escaped.with_new_disposing_operation(OperationId(2));
    assert_eq!(disposed.kind(), Disposed);
    assert_eq!(
        disposed.disposing_or_escaping_operations(),
        &[OperationId(1), OperationId(2)]
    );

    let still_disposed = disposed.with_new_escaping_operation(OperationId(3));
    assert_eq!(still_disposed, disposed);
}

proptest! {
    #[test]
    fn kind_join_is_idempotent_commutative_associative(
        a in kind_strategy(),
        b in kind_strategy(),
        c in kind_strategy(),
    ) {
        prop_assert_eq!(a.join(a), a);
        prop_assert_eq!(a.join(b), b.join(a));
        prop_assert_eq!(a.join(b).join(c), a.join(b.join(c)));
    }

    #[test]
    fn value_join_is_idempotent_commutative_associative(
        a in value_strategy(),
        b in value_strategy(),
        c in value_strategy(),
    ) {
        prop_assert_eq!(a.join(&a), a.clone());
        prop_assert_eq!(a.join(&b), b.join(&a));
        prop_assert_eq!(a.join(&b).join(&c), a.join(&b.join(&c)));
    }

    #[test]
    fn join_is_an_upper_bound(a in value_strategy(), b in value_strategy()) {
        let joined = a.join(&b);
        prop_assert!(a.is_less_or_equal(&joined));
        prop_assert!(b.is_less_or_equal(&joined));
    }

    #[test]
    fn transfer_updates_are_monotone(
        a in value_strategy(),
        b in value_strategy(),
        operation in 0u32..8,
    ) {
        // a ⊑ a ⊔ b, so every update must preserve that order
        let upper = a.join(&b);
        let operation = OperationId(operation);

        prop_assert!(a
            .with_new_disposing_operation(operation)
            .is_less_or_equal(&upper.with_new_disposing_operation(operation)));
        prop_assert!(a
            .with_new_escaping_operation(operation)
            .is_less_or_equal(&upper.with_new_escaping_operation(operation)));
    }
}
