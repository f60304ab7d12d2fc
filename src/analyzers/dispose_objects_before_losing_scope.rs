//! Rule: dispose objects before losing scope.
//!
//! Flags every object creation whose result can reach the end of its method without
//! being disposed, or that is only ever disposed inside an exception handler.

use crate::analysis::dispose_analysis::{
    CancellationToken, DisposeAnalysisHelper, DisposeAnalysisStats, compute_leak_verdicts,
};
use crate::compiler_messages::compiler_errors::{CompilerError, ErrorLocation};
use crate::compiler_messages::compiler_warnings::{CompilerWarning, WarningKind};
use crate::flow_graph::flow_nodes::MethodBody;
use crate::settings::{Config, DISPOSE_RULE_ID};

pub const RULE_ID: &str = DISPOSE_RULE_ID;

pub fn format_message(method: &str, creation: &str) -> String {
    format!(
        "In method '{method}', call Dispose on object created by '{creation}' before all references to it are out of scope"
    )
}

/// Why a body produced no dispose result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotAMethod,
    Excluded,
    NoDisposableCreation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodOutcome {
    Skipped(SkipReason),
    Analyzed {
        warnings: Vec<CompilerWarning>,
        stats: DisposeAnalysisStats,
    },
}

pub fn analyze_method_body(
    helper: &DisposeAnalysisHelper<'_>,
    body: &MethodBody,
    config: &Config,
    cancellation: &CancellationToken,
) -> Result<MethodOutcome, CompilerError> {
    let Some(method) = body.owner.as_method() else {
        return Ok(MethodOutcome::Skipped(SkipReason::NotAMethod));
    };

    if config.is_excluded(&method.containing_type, &method.name) {
        return Ok(MethodOutcome::Skipped(SkipReason::Excluded));
    }

    if !helper.has_any_disposable_creation_descendant(body, method) {
        return Ok(MethodOutcome::Skipped(SkipReason::NoDisposableCreation));
    }

    let result = helper.get_or_compute_result(body, method, cancellation)?;

    let warnings = compute_leak_verdicts(&result, config.analysis.kind)
        .into_iter()
        .map(|verdict| {
            CompilerWarning::new(
                RULE_ID,
                format_message(&verdict.method_display_name, &verdict.creation_syntax),
                ErrorLocation::from_span(verdict.creation_span),
                WarningKind::UndisposedObject {
                    method: verdict.method_display_name,
                    creation: verdict.creation_syntax,
                },
            )
        })
        .collect();

    Ok(MethodOutcome::Analyzed {
        warnings,
        stats: result.stats().clone(),
    })
}
