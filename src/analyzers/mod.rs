pub mod dispose_objects_before_losing_scope;

use crate::analysis::dispose_analysis::{CancellationToken, DisposeAnalysisHelper};
use crate::analyzers::dispose_objects_before_losing_scope::{
    MethodOutcome, analyze_method_body,
};
use crate::compiler_messages::compiler_errors::{CompilerError, CompilerMessages};
use crate::compiler_messages::compiler_warnings::{CompilerWarning, WarningKind};
use crate::flow_graph::compilation::Compilation;
use crate::flow_graph::flow_nodes::MethodBody;
use crate::settings::Config;
use crate::{dispose_log, timer_log};
use rayon::prelude::*;
use std::time::Instant;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisStats {
    pub methods_analyzed: usize,
    pub methods_skipped: usize,
    pub methods_failed: usize,
    pub blocks_processed: usize,
    pub worklist_iterations: usize,
    pub tracked_locations: usize,
}

#[derive(Debug, Default)]
pub struct AnalysisReport {
    pub messages: CompilerMessages,
    pub stats: AnalysisStats,
}

impl AnalysisReport {
    pub fn warnings(&self) -> &[CompilerWarning] {
        &self.messages.warnings
    }
}

/// Runs the dispose rule over every body of a compilation.
///
/// Per-method defects are collected as errors and the pass carries on.
/// Cancellation aborts the pass and discards everything gathered so far.
pub fn analyze_compilation(
    compilation: &Compilation,
    config: &Config,
    cancellation: &CancellationToken,
) -> Result<AnalysisReport, CompilerError> {
    let _time = Instant::now();
    let registry = compilation.type_registry()?;

    let mut report = AnalysisReport::default();

    let Some(helper) = DisposeAnalysisHelper::try_create(&registry) else {
        dispose_log!("[Dispose] No disposable types declared, skipping compilation");
        report.stats.methods_skipped = compilation.bodies.len();
        return Ok(report);
    };

    let analyze = |body: &MethodBody| analyze_method_body(&helper, body, config, cancellation);
    let outcomes: Vec<Result<MethodOutcome, CompilerError>> = if config.analysis.parallel {
        compilation.bodies.par_iter().map(analyze).collect()
    } else {
        compilation.bodies.iter().map(analyze).collect()
    };
    timer_log!(_time, "Dispose analysis completed in: ");

    if cancellation.is_cancelled() {
        return Err(CompilerError::cancelled("Dispose analysis pass was cancelled"));
    }

    for outcome in outcomes {
        match outcome {
            Ok(MethodOutcome::Skipped(_)) => report.stats.methods_skipped += 1,

            Ok(MethodOutcome::Analyzed { warnings, stats }) => {
                report.stats.methods_analyzed += 1;
                report.stats.blocks_processed += stats.blocks_processed;
                report.stats.worklist_iterations += stats.worklist_iterations;
                report.stats.tracked_locations += stats.tracked_locations;
                report.messages.warnings.extend(warnings);
            }

            Err(error) if error.is_cancellation() => return Err(error),

            Err(error) => {
                report.stats.methods_failed += 1;
                report.messages.errors.push(error);
            }
        }
    }

    if config.analysis.sort_diagnostics {
        report.messages.warnings.sort_by(|left, right| {
            diagnostic_method(left)
                .cmp(diagnostic_method(right))
                .then_with(|| left.location.span.cmp(&right.location.span))
        });
    }

    dispose_log!(format!(
        "[Dispose] Completed: analyzed={} skipped={} failed={} warnings={} cached={}",
        report.stats.methods_analyzed,
        report.stats.methods_skipped,
        report.stats.methods_failed,
        report.messages.warnings.len(),
        helper.computed_results()
    ));

    Ok(report)
}

fn diagnostic_method(warning: &CompilerWarning) -> &str {
    match &warning.warning_kind {
        WarningKind::UndisposedObject { method, .. } => method,
    }
}

#[cfg(test)]
#[path = "tests/analyzer_tests.rs"]
mod tests;
