//! Integration tests for the CLI library.

use opcheck_aten::aten_registry;
use opcheck_cli::crossref::{run_crossref, sample_calls};
use opcheck_cli::ops::{list_ops, resolve_ops};
use opcheck_cli::rewrite::{demo_graph, rewrite_demo};
use opcheck_core::{OpId, SchemaRegistry, Tag};
use opcheck_crossref::SkipReason;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

#[test]
fn test_list_views() {
    let registry = aten_registry().unwrap();
    let views = list_ops(&registry, None, true).unwrap();

    assert!(views.iter().all(|entry| entry.is_view));
    let t = views.iter().find(|entry| entry.op == OpId::aten("t", "")).unwrap();
    assert_eq!(t.replacement, Some(OpId::aten("t_copy", "")));
    let reshape = views
        .iter()
        .find(|entry| entry.op == OpId::aten("reshape", ""))
        .unwrap();
    assert_eq!(reshape.replacement, None);
}

#[test]
fn test_list_with_filter() {
    let registry = aten_registry().unwrap();
    let ops = list_ops(&registry, Some("_copy"), false).unwrap();

    assert!(!ops.is_empty());
    assert!(ops.iter().all(|entry| entry.op.name().ends_with("_copy")));
    assert!(ops.iter().all(|entry| entry.tags.contains(Tag::ViewCopy) || entry.op.name() == "lift_fresh_copy"));
    assert!(list_ops(&registry, Some("("), false).is_err());
}

#[test]
fn test_resolve_ops() {
    let registry = aten_registry().unwrap();
    let names = ["transpose.int", "aten::_unsafe_view", "sym_size.int", "relu"].map(String::from);
    let resolved = resolve_ops(&registry, &names).unwrap();

    let targets: Vec<String> = resolved.iter().map(|(_, to)| to.to_string()).collect();
    assert_eq!(
        targets,
        vec![
            "aten::transpose_copy.int",
            "aten::view_copy.default",
            "aten::sym_size.int",
            "aten::relu.default",
        ]
    );
}

#[test]
fn test_rewrite_demo() {
    init_tracing();
    let registry: Arc<dyn SchemaRegistry> = Arc::new(aten_registry().unwrap());
    let report = rewrite_demo(registry, &[2, 3]).unwrap();

    assert!(report.outputs_match);
    let after = report.after.to_string();
    assert!(after.contains("aten::transpose_copy.int"));
    assert!(after.contains("aten::view_copy.default"));
    assert!(after.contains("aten::sym_size.int"));
    assert!(!after.contains("aten::t.default"));
    assert_eq!(report.before.to_string(), demo_graph(None).unwrap().to_string());
}

#[test]
fn test_crossref_samples_are_clean() {
    init_tracing();
    let registry = aten_registry().unwrap();
    let calls = sample_calls().unwrap();
    let report = run_crossref(&registry, &calls, None).unwrap();

    assert!(report.is_clean(), "{:?}", report.mismatched);
    assert_eq!(report.verified.len() + report.skipped.len(), calls.len());
    assert!(report.skipped.contains(&(
        OpId::aten("nonzero", ""),
        SkipReason::Tagged(Tag::DynamicOutputShape)
    )));
    assert!(report.skipped.contains(&(OpId::aten("lift_fresh", ""), SkipReason::Excluded)));
}

#[test]
fn test_crossref_ignore_pattern() {
    let registry = aten_registry().unwrap();
    let calls = sample_calls().unwrap();
    let report = run_crossref(&registry, &calls, Some("^aten::t")).unwrap();

    for op in [OpId::aten("t", ""), OpId::aten("transpose", "int")] {
        assert!(report.skipped.contains(&(op, SkipReason::Ignored)));
    }
}
