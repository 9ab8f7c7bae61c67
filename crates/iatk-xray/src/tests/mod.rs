//! Tree building against the in-memory tracing service.


use iatk_cloud::CallContext;
use iatk_cloud::memory::MemoryCloud;
use rstest::{fixture, rstest};
use serde_json::json;

use crate::fetch::Trace;
use crate::segment::Segment;
use crate::tree::{MAX_LINK_DEPTH, TraceTree, TreeError, build_tree};

fn doc(id: &str, start: f64, parent: Option<&str>) -> String {
    let mut value = json!({ "id": id, "name": id, "start_time": start, "trace_id": "1-root" });
    if let Some(parent_id) = parent {
        value["parent_id"] = json!(parent_id);
    }
    value.to_string()
}

fn linking_doc(id: &str, start: f64, parent: Option<&str>, child_trace: &str) -> String {
    let mut value: serde_json::Value = serde_json::from_str(&doc(id, start, parent)).expect("doc");
    value["links"] = json!([{
        "trace_id": child_trace,
        "attributes": { "aws.xray.reserved.reference_type": "child" }
    }]);
    value.to_string()
}

fn ids(path: &[Segment]) -> Vec<&str> {
    path.iter().map(|segment| segment.id.as_str()).collect()
}

fn trace(segments: &[String]) -> Trace {
    Trace {
        id: "1-root".to_owned(),
        segments: segments
            .iter()
            .map(|document| Segment::from_document(document).expect("segment"))
            .collect(),
    }
}

#[fixture]
fn cloud() -> MemoryCloud {
    MemoryCloud::new()
}

#[rstest]
fn single_segment_is_root_and_only_path() {
    let tree = TraceTree::from_trace(trace(&[doc("a", 1.0, None)])).expect("tree");
    assert_eq!(tree.root.id, "a");
    assert_eq!(tree.paths.len(), 1);
    assert_eq!(ids(&tree.paths[0]), vec!["a"]);
}

#[rstest]
fn unsorted_segments_form_ordered_paths() {
    let tree = TraceTree::from_trace(trace(&[
        doc("d", 4.0, Some("b")),
        doc("c", 3.0, Some("a")),
        doc("a", 1.0, None),
        doc("b", 2.0, Some("a")),
    ]))
    .expect("tree");

    assert_eq!(tree.root.id, "a");
    let paths: Vec<Vec<&str>> = tree.paths.iter().map(|path| ids(path)).collect();
    assert_eq!(paths, vec![vec!["a", "b", "d"], vec!["a", "c"]]);
    assert_eq!(
        tree.source_trace
            .segments
            .iter()
            .map(|segment| segment.id.as_str())
            .collect::<Vec<_>>(),
        vec!["a", "b", "c", "d"]
    );
}

#[rstest]
fn parent_may_be_a_nested_subsegment() {
    let root = json!({
        "id": "a", "start_time": 1.0,
        "subsegments": [{ "id": "sub-1", "subsegments": [{ "id": "sub-2" }] }]
    })
    .to_string();
    let tree = TraceTree::from_trace(trace(&[root, doc("b", 2.0, Some("sub-2"))])).expect("tree");
    assert_eq!(ids(&tree.paths[0]), vec!["a", "b"]);
}

#[rstest]
fn missing_parent_names_the_segment() {
    let error = TraceTree::from_trace(trace(&[doc("a", 1.0, None), doc("b", 2.0, Some("zz"))]))
        .expect_err("orphan");
    assert!(matches!(error, TreeError::Orphan { ref segment_id, .. } if segment_id == "b"));
    assert!(error.to_string().contains("found a segment b with no parent"));
}

#[rstest]
fn empty_trace_is_rejected() {
    let error = TraceTree::from_trace(trace(&[])).expect_err("empty");
    assert_eq!(
        error.to_string(),
        "failed to fetch trace 1-root with error: no trace segments found"
    );
}

#[rstest]
fn building_twice_gives_identical_trees() {
    let segments = [
        doc("a", 1.0, None),
        doc("b", 2.0, Some("a")),
        doc("c", 2.0, Some("a")),
    ];
    let first = TraceTree::from_trace(trace(&segments)).expect("tree");
    let second = TraceTree::from_trace(trace(&segments)).expect("tree");
    assert_eq!(first, second);
}

#[rstest]
fn fetched_tree_omits_link_flag_when_not_requested(cloud: MemoryCloud) {
    cloud.add_trace("1-root", &[doc("a", 1.0, None), doc("b", 2.0, Some("a"))]);
    let tree = build_tree(&cloud, &CallContext::new(), "1-root", false).expect("tree");

    let value = serde_json::to_value(&tree).expect("serialise");
    assert!(value.get("linked_trace_limit_exceeded").is_none());
    assert_eq!(value["source_trace"]["id"], "1-root");
    assert_eq!(value["paths"][0][1]["parent_id"], "a");
}

#[rstest]
fn unknown_trace_is_not_found(cloud: MemoryCloud) {
    let error = build_tree(&cloud, &CallContext::new(), "1-missing", false).expect_err("missing");
    assert_eq!(
        error.to_string(),
        "failed to fetch trace 1-missing with error: trace not found"
    );
}

#[rstest]
fn linked_child_trace_is_grafted_under_linking_segment(cloud: MemoryCloud) {
    cloud.add_trace(
        "1-root",
        &[doc("a", 1.0, None), linking_doc("b", 2.0, Some("a"), "1-child")],
    );
    cloud.add_trace("1-child", &[doc("x", 3.0, None), doc("y", 4.0, Some("x"))]);

    let tree = build_tree(&cloud, &CallContext::new(), "1-root", true).expect("tree");

    let paths: Vec<Vec<&str>> = tree.paths.iter().map(|path| ids(path)).collect();
    assert_eq!(paths, vec![vec!["a", "b", "x", "y"]]);
    assert_eq!(tree.linked_trace_limit_exceeded, Some(false));
    assert_eq!(tree.source_trace.segments.len(), 2);
}

#[rstest]
fn links_are_ignored_without_expansion(cloud: MemoryCloud) {
    cloud.add_trace(
        "1-root",
        &[doc("a", 1.0, None), linking_doc("b", 2.0, Some("a"), "1-child")],
    );
    cloud.add_trace("1-child", &[doc("x", 3.0, None)]);

    let tree = build_tree(&cloud, &CallContext::new(), "1-root", false).expect("tree");

    assert_eq!(ids(&tree.paths[0]), vec!["a", "b"]);
    assert_eq!(cloud.call_count("BatchGetTraces"), 1);
}

#[rstest]
fn expansion_stops_at_depth_limit(cloud: MemoryCloud) {
    let chain: Vec<String> = (0..=MAX_LINK_DEPTH + 1)
        .map(|level| format!("1-level-{level}"))
        .collect();
    for (level, pair) in chain.windows(2).enumerate() {
        let id = format!("s{level}");
        cloud.add_trace(&pair[0], &[linking_doc(&id, 1.0, None, &pair[1])]);
    }

    let tree = build_tree(&cloud, &CallContext::new(), &chain[0], true).expect("tree");

    assert_eq!(tree.linked_trace_limit_exceeded, Some(true));
    assert_eq!(tree.paths.len(), 1);
    assert_eq!(tree.paths[0].len(), MAX_LINK_DEPTH + 1);
}
