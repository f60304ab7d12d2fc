#![cfg(test)]

use super::test_support::*;
use crate::analysis::dispose_analysis::{
    DisposeAbstractValueKind, DisposeAnalysisResult, LeakVerdict, compute_leak_verdicts,
};
use crate::flow_graph::flow_nodes::{BlockId, RegionKind, SourceSpan, SymbolId};
use crate::settings::DisposeAnalysisKind;

fn leaks(result: &DisposeAnalysisResult) -> Vec<LeakVerdict> {
    compute_leak_verdicts(result, DisposeAnalysisKind::NonExceptionPaths)
}

/// setup -> try -> after -> exit, with try -> catch -> after
fn try_catch_graph(
    builder: &mut GraphBuilder,
    catch_kind: RegionKind,
) -> (BlockId, BlockId, BlockId) {
    let try_region = builder.region(1, RegionKind::Try, ROOT);
    let catch_region = builder.region(2, catch_kind, ROOT);

    let setup = builder.block(1);
    let try_block = builder.block_in_region(2, try_region);
    let catch_block = builder.block_in_region(3, catch_region);
    let after = builder.block(4);

    builder.path(&[ENTRY, setup, try_block, after, EXIT]);
    builder.path(&[try_block, catch_block, after]);

    (setup, try_block, catch_block)
}

#[test]
fn never_disposed_object_is_reported_at_its_creation() {
    let mut builder = GraphBuilder::new();
    let block = builder.block(1);
    builder.path(&[ENTRY, block, EXIT]);
    let creation = builder.push(block, create(FILE_STREAM, 1), "new FileStream(path)");

    let result = analyze(&builder.build(), &method("Run"));
    let verdicts = leaks(&result);

    assert_eq!(verdicts.len(), 1);
    assert_eq!(verdicts[0].method_display_name, "Program.Run()");
    assert_eq!(verdicts[0].creation_syntax, "new FileStream(path)");
    assert_eq!(verdicts[0].creation_span.start_line, creation.0);
    assert_eq!(verdicts[0].kind, DisposeAbstractValueKind::NotDisposed);
}

#[test]
fn disposed_returned_and_partially_disposed_objects_are_not_reported() {
    let mut builder = GraphBuilder::new();
    let setup = builder.block(1);
    let disposing = builder.block(2);
    builder.path(&[ENTRY, setup, disposing, EXIT]);
    builder.edge(setup, EXIT);

    builder.push(setup, create(FILE_STREAM, 1), "new FileStream(a)");
    builder.push(setup, dispose(local(1)), "a.Dispose()");
    builder.push(setup, create(FILE_STREAM, 2), "new FileStream(b)");
    builder.push(setup, return_value(local(2)), "return b");
    builder.push(setup, create(FILE_STREAM, 3), "new FileStream(c)");
    builder.push(disposing, dispose(local(3)), "c.Dispose()");

    let result = analyze(&builder.build(), &method("Run"));

    assert!(leaks(&result).is_empty());
}

#[test]
fn disposed_object_is_not_reported_after_its_local_is_reassigned() {
    let mut builder = GraphBuilder::new();
    let block = builder.block(1);
    builder.path(&[ENTRY, block, EXIT]);
    builder.push(block, create(FILE_STREAM, 1), "new FileStream(path)");
    builder.push(block, dispose(local(1)), "stream.Dispose()");
    builder.push(block, open_into(1), "stream = Open()");

    let result = analyze(&builder.build(), &method("Run"));

    assert!(leaks(&result).is_empty());
}

#[test]
fn overwritten_object_is_reported_even_though_its_local_is_disposed() {
    let mut builder = GraphBuilder::new();
    let block = builder.block(1);
    builder.path(&[ENTRY, block, EXIT]);
    builder.push(block, create(FILE_STREAM, 1), "new FileStream(a)");
    builder.push(block, create(FILE_STREAM, 1), "new FileStream(b)");
    builder.push(block, dispose(local(1)), "stream.Dispose()");

    let result = analyze(&builder.build(), &method("Run"));
    let verdicts = leaks(&result);

    assert_eq!(verdicts.len(), 1);
    assert_eq!(verdicts[0].creation_syntax, "new FileStream(a)");
    assert_eq!(verdicts[0].kind, DisposeAbstractValueKind::NotDisposed);
}

#[test]
fn dispose_only_in_catch_is_reported() {
    let mut builder = GraphBuilder::new();
    let (setup, try_block, catch_block) = try_catch_graph(&mut builder, RegionKind::Catch);

    builder.push(setup, create(FILE_STREAM, 1), "new FileStream(path)");
    builder.push(try_block, call(CONSUME_BORROWED, vec![local(1)]), "Consume(stream)");
    builder.push(catch_block, dispose(local(1)), "stream.Dispose()");

    let result = analyze(&builder.build(), &method("Run"));
    let verdicts = leaks(&result);

    assert_eq!(verdicts.len(), 1);
    assert_eq!(verdicts[0].kind, DisposeAbstractValueKind::MaybeDisposed);

    // Exact NotDisposed only
    assert!(compute_leak_verdicts(&result, DisposeAnalysisKind::OnlyNotDisposed).is_empty());
}

#[test]
fn dispose_only_in_filter_is_reported() {
    let mut builder = GraphBuilder::new();
    let (setup, try_block, catch_block) = try_catch_graph(&mut builder, RegionKind::Filter);

    builder.push(setup, create(FILE_STREAM, 1), "new FileStream(path)");
    builder.push(try_block, call(CONSUME_BORROWED, vec![local(1)]), "Consume(stream)");
    builder.push(catch_block, dispose(local(1)), "stream.Dispose()");

    let result = analyze(&builder.build(), &method("Run"));

    assert_eq!(leaks(&result).len(), 1);
}

#[test]
fn dispose_in_region_nested_inside_catch_is_reported() {
    let mut builder = GraphBuilder::new();
    let catch_region = builder.region(1, RegionKind::Catch, ROOT);
    let nested = builder.region(2, RegionKind::LocalLifetime, catch_region);

    let setup = builder.block(1);
    let handler = builder.block_in_region(2, nested);
    builder.path(&[ENTRY, setup, EXIT]);
    builder.path(&[setup, handler, EXIT]);

    builder.push(setup, create(FILE_STREAM, 1), "new FileStream(path)");
    builder.push(handler, dispose(local(1)), "stream.Dispose()");

    let result = analyze(&builder.build(), &method("Run"));

    assert_eq!(leaks(&result).len(), 1);
}

#[test]
fn mixed_catch_and_normal_path_evidence_is_not_reported() {
    let mut builder = GraphBuilder::new();
    let (setup, try_block, catch_block) = try_catch_graph(&mut builder, RegionKind::Catch);

    builder.push(setup, create(FILE_STREAM, 1), "new FileStream(path)");
    builder.push(try_block, store_field("cache", local(1)), "this.cache = stream");
    builder.push(catch_block, dispose(local(1)), "stream.Dispose()");

    let result = analyze(&builder.build(), &method("Run"));

    assert!(leaks(&result).is_empty());
}

#[test]
fn escaped_or_kept_is_not_reported() {
    let mut builder = GraphBuilder::new();
    let setup = builder.block(1);
    let storing = builder.block(2);
    builder.path(&[ENTRY, setup, storing, EXIT]);
    builder.edge(setup, EXIT);

    builder.push(setup, create(FILE_STREAM, 1), "new FileStream(path)");
    builder.push(storing, store_field("cache", local(1)), "this.cache = stream");

    let result = analyze(&builder.build(), &method("Run"));

    assert!(leaks(&result).is_empty());
}

#[test]
fn non_disposable_objects_and_parameters_are_never_reported() {
    let mut builder = GraphBuilder::new();
    let block = builder.block(1);
    builder.path(&[ENTRY, block, EXIT]);
    builder.push(block, create(STRING_BUILDER, 1), "new StringBuilder()");

    let result = analyze(
        &builder.build(),
        &method_with_stream_parameter("Write", SymbolId(9)),
    );

    assert!(leaks(&result).is_empty());
    assert!(compute_leak_verdicts(&result, DisposeAnalysisKind::OnlyNotDisposed).is_empty());
}

#[test]
fn verdicts_follow_creation_order() {
    let mut builder = GraphBuilder::new();
    let block = builder.block(1);
    builder.path(&[ENTRY, block, EXIT]);
    builder.push(block, create(FILE_STREAM, 1), "new FileStream(first)");
    builder.push(block, create(STREAM_READER, 2), "new StreamReader(second)");

    let result = analyze(&builder.build(), &method("Run"));
    let creations = leaks(&result)
        .into_iter()
        .map(|verdict| verdict.creation_syntax)
        .collect::<Vec<_>>();

    assert_eq!(
        creations,
        vec!["new FileStream(first)", "new StreamReader(second)"]
    );
}

#[test]
fn wrapped_object_is_reported_once_through_its_wrapper() {
    let mut builder = GraphBuilder::new();
    let block = builder.block(1);
    builder.path(&[ENTRY, block, EXIT]);
    builder.push(block, create(FILE_STREAM, 1), "new FileStream(path)");
    builder.push(
        block,
        create_with(STREAM_READER, STREAM_READER_CTOR, vec![local(1)], 2),
        "new StreamReader(stream)",
    );

    let result = analyze(&builder.build(), &method("Read"));
    let verdicts = leaks(&result);

    assert_eq!(verdicts.len(), 1);
    assert_eq!(verdicts[0].creation_syntax, "new StreamReader(stream)");
    assert_ne!(verdicts[0].creation_span, SourceSpan::default());
}

#[test]
fn disposing_the_wrapper_releases_the_wrapped_object() {
    let mut builder = GraphBuilder::new();
    let block = builder.block(1);
    builder.path(&[ENTRY, block, EXIT]);
    builder.push(block, create(FILE_STREAM, 1), "new FileStream(path)");
    builder.push(
        block,
        create_with(STREAM_READER, STREAM_READER_CTOR, vec![local(1)], 2),
        "new StreamReader(stream)",
    );
    builder.push(block, dispose(local(2)), "reader.Dispose()");

    let result = analyze(&builder.build(), &method("Read"));

    assert!(leaks(&result).is_empty());
}
