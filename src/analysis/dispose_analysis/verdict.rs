use crate::analysis::dispose_analysis::types::{
    DisposeAbstractValueKind, DisposeAnalysisResult, LocationId,
};
use crate::flow_graph::flow_nodes::{OperationId, SourceSpan};
use crate::settings::DisposeAnalysisKind;

/// A creation site whose object can reach the method exit without being disposed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakVerdict {
    pub location: LocationId,
    pub method_display_name: String,
    pub creation_syntax: String,
    pub creation_span: SourceSpan,
    pub kind: DisposeAbstractValueKind,
}

/// Leaked locations of one converged result, in location insertion order.
///
/// Only the exit block's output is inspected. A method whose exit is unreachable
/// has nothing to report.
pub fn compute_leak_verdicts(
    result: &DisposeAnalysisResult,
    analysis_kind: DisposeAnalysisKind,
) -> Vec<LeakVerdict> {
    let Some(exit_state) = result.exit_block_output() else {
        return Vec::new();
    };

    let method_display_name = result.method().display_name();
    let mut verdicts = Vec::new();

    for (location_id, value) in exit_state.iter() {
        let Some(location) = result.location(location_id) else {
            continue;
        };

        if value.kind() == DisposeAbstractValueKind::NotDisposable {
            continue;
        }

        // Parameters belong to the caller
        let Some(creation) = &location.creation else {
            continue;
        };

        let is_leak = match analysis_kind {
            DisposeAnalysisKind::OnlyNotDisposed => {
                value.kind() == DisposeAbstractValueKind::NotDisposed
            }
            DisposeAnalysisKind::NonExceptionPaths => {
                value.kind() == DisposeAbstractValueKind::NotDisposed
                    || is_only_handled_in_catch(result, value.disposing_or_escaping_operations())
            }
        };

        if !is_leak {
            continue;
        }

        verdicts.push(LeakVerdict {
            location: location_id,
            method_display_name: method_display_name.clone(),
            creation_syntax: creation.syntax.text.clone(),
            creation_span: creation.syntax.span,
            kind: value.kind(),
        });
    }

    verdicts
}

fn is_only_handled_in_catch(
    result: &DisposeAnalysisResult,
    operations: &[OperationId],
) -> bool {
    !operations.is_empty()
        && operations
            .iter()
            .all(|operation| result.is_inside_catch_region(*operation))
}
