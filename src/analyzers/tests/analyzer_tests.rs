//! Tests for the dispose rule and the compilation driver.

use super::analyze_compilation;
use super::dispose_objects_before_losing_scope::{RULE_ID, format_message};
use crate::analysis::dispose_analysis::CancellationToken;
use crate::compiler_messages::compiler_errors::ErrorType;
use crate::compiler_messages::compiler_warnings::WarningKind;
use crate::flow_graph::compilation::Compilation;
use crate::flow_graph::flow_nodes::{
    BasicBlock, BasicBlockKind, BlockId, ControlFlowGraph, ControlFlowRegion, FlowValue, GraphId,
    MethodBody, MethodId, MethodSymbol, Operation, OperationId, OperationKind, OwningSymbol,
    RegionId, RegionKind, SourceSpan, SymbolId, SyntaxRef, TypeId,
};
use crate::flow_graph::type_registry::{MethodInfo, MethodKind, TypeInfo};
use crate::settings::Config;

const FILE_STREAM: TypeId = TypeId(1);
const DISPOSE: MethodId = MethodId(10);

fn method(id: u32, containing_type: &str, name: &str) -> MethodSymbol {
    MethodSymbol {
        id: MethodId(id),
        name: name.to_string(),
        containing_type: containing_type.to_string(),
        parameters: Vec::new(),
    }
}

fn operation(id: u32, kind: OperationKind, text: &str, line: u32) -> Operation {
    Operation {
        id: OperationId(id),
        kind,
        syntax: SyntaxRef::new(text, SourceSpan::line(line)),
    }
}

/// entry -> exit with the given operations in the entry block
fn straight_line_body(graph_id: u32, owner: OwningSymbol, operations: Vec<Operation>) -> MethodBody {
    MethodBody {
        owner,
        graph: ControlFlowGraph {
            id: GraphId(graph_id),
            blocks: vec![
                BasicBlock {
                    id: BlockId(0),
                    kind: BasicBlockKind::Entry,
                    operations,
                    successors: vec![BlockId(1)],
                    region: RegionId(0),
                },
                BasicBlock {
                    id: BlockId(1),
                    kind: BasicBlockKind::Exit,
                    operations: Vec::new(),
                    successors: Vec::new(),
                    region: RegionId(0),
                },
            ],
            regions: vec![ControlFlowRegion {
                id: RegionId(0),
                kind: RegionKind::Root,
                parent: None,
            }],
        },
    }
}

fn create_stream(id: u32, local: u32, line: u32) -> Operation {
    operation(
        id,
        OperationKind::ObjectCreation {
            type_id: FILE_STREAM,
            constructor: None,
            arguments: Vec::new(),
            result: Some(SymbolId(local)),
        },
        "new FileStream(path)",
        line,
    )
}

fn dispose_stream(id: u32, local: u32, line: u32) -> Operation {
    operation(
        id,
        OperationKind::Invocation {
            method: DISPOSE,
            instance: Some(FlowValue::Local(SymbolId(local))),
            arguments: Vec::new(),
            result: None,
        },
        "stream.Dispose()",
        line,
    )
}

fn compilation(bodies: Vec<MethodBody>) -> Compilation {
    Compilation {
        types: vec![TypeInfo {
            id: FILE_STREAM,
            name: String::from("FileStream"),
            disposable: true,
        }],
        methods: vec![MethodInfo {
            id: DISPOSE,
            name: String::from("Dispose"),
            containing_type: Some(FILE_STREAM),
            kind: MethodKind::Dispose,
            parameters: Vec::new(),
        }],
        bodies,
    }
}

fn sample_compilation() -> Compilation {
    compilation(vec![
        straight_line_body(
            1,
            OwningSymbol::Method(method(2, "Worker", "Run")),
            vec![create_stream(1, 1, 12)],
        ),
        straight_line_body(
            2,
            OwningSymbol::Method(method(1, "Program", "Main")),
            vec![create_stream(1, 1, 8), create_stream(2, 2, 4)],
        ),
        straight_line_body(
            3,
            OwningSymbol::Method(method(3, "Program", "Clean")),
            vec![create_stream(1, 1, 20), dispose_stream(2, 1, 21)],
        ),
        straight_line_body(
            4,
            OwningSymbol::FieldInitializer {
                name: String::from("stream"),
            },
            vec![create_stream(1, 1, 2)],
        ),
    ])
}

#[test]
fn message_names_method_and_creation() {
    assert_eq!(
        format_message("Program.Main()", "new FileStream(path)"),
        "In method 'Program.Main()', call Dispose on object created by 'new FileStream(path)' before all references to it are out of scope"
    );
}

#[test]
fn compilation_reports_every_leak_sorted_by_method_then_position() {
    let report = analyze_compilation(
        &sample_compilation(),
        &Config::default(),
        &CancellationToken::new(),
    )
    .expect("analysis should run");

    let positions = report
        .warnings()
        .iter()
        .map(|warning| match &warning.warning_kind {
            WarningKind::UndisposedObject { method, .. } => {
                (method.as_str(), warning.location.span.start_line)
            }
        })
        .collect::<Vec<_>>();

    assert_eq!(
        positions,
        vec![
            ("Program.Main()", 4),
            ("Program.Main()", 8),
            ("Worker.Run()", 12)
        ]
    );
    assert!(report.warnings().iter().all(|warning| warning.rule_id == RULE_ID));
    assert!(report.messages.errors.is_empty());
    assert_eq!(report.stats.methods_analyzed, 3);
    assert_eq!(report.stats.methods_skipped, 1);
}

#[test]
fn sequential_and_parallel_runs_agree() {
    let compilation = sample_compilation();
    let mut sequential = Config::default();
    sequential.analysis.parallel = false;

    let parallel_report =
        analyze_compilation(&compilation, &Config::default(), &CancellationToken::new())
            .expect("parallel run");
    let sequential_report =
        analyze_compilation(&compilation, &sequential, &CancellationToken::new())
            .expect("sequential run");

    assert_eq!(parallel_report.warnings(), sequential_report.warnings());
}

#[test]
fn excluded_methods_are_skipped() {
    let mut config = Config::default();
    config.analysis.excluded_methods = vec![String::from("Program.*")];

    let report = analyze_compilation(&sample_compilation(), &config, &CancellationToken::new())
        .expect("analysis should run");

    assert_eq!(report.warnings().len(), 1);
    assert_eq!(report.stats.methods_skipped, 3);
}

#[test]
fn compilation_without_disposable_types_does_nothing() {
    let mut compilation = sample_compilation();
    compilation.types[0].disposable = false;

    let report = analyze_compilation(&compilation, &Config::default(), &CancellationToken::new())
        .expect("analysis should run");

    assert!(!report.messages.has_output());
    assert_eq!(report.stats.methods_skipped, 4);
}

#[test]
fn malformed_body_is_reported_without_stopping_the_pass() {
    let mut compilation = sample_compilation();
    compilation.bodies[0].graph.blocks[0].successors = vec![BlockId(99)];

    let report = analyze_compilation(&compilation, &Config::default(), &CancellationToken::new())
        .expect("analysis should run");

    assert_eq!(report.messages.errors.len(), 1);
    assert_eq!(report.messages.errors[0].error_type, ErrorType::FlowGraph);
    assert_eq!(report.warnings().len(), 2);
    assert_eq!(report.stats.methods_failed, 1);
}

#[test]
fn cancelled_pass_yields_no_diagnostics() {
    let cancellation = CancellationToken::new();
    cancellation.cancel();

    let error = analyze_compilation(&sample_compilation(), &Config::default(), &cancellation)
        .expect_err("cancelled pass should fail");

    assert!(error.is_cancellation());
}
