use std::collections::HashSet;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::state::RunState;
use super::*;
use crate::error::{Error, NodeError};
use crate::graph::{Graph, GraphBuilder};
use crate::node::{Classify, Emit, NodeKind, Subset, Transform};
use crate::stream::{SideInput, Stream, StreamRef};

/// Keeps the main-input elements found in a fixed set.
struct Keep(HashSet<String>);

impl Keep {
    fn new(items: &[&str]) -> Self {
        Self(items.iter().map(|s| s.to_string()).collect())
    }
}

impl Transform<String> for Keep {
    fn output_slots(&self) -> &[&str] {
        &["out"]
    }

    fn process(
        &self,
        element: &String,
        _side_inputs: &[SideInput<String>],
    ) -> Result<Vec<Emit<String>>, NodeError> {
        Ok(self
            .0
            .contains(element)
            .then(|| Emit::to(0, element.clone()))
            .into_iter()
            .collect())
    }
}

/// Passes elements through, pausing before each one.
struct Slow(Duration);

impl Transform<String> for Slow {
    fn output_slots(&self) -> &[&str] {
        &["out"]
    }

    fn process(
        &self,
        element: &String,
        _side_inputs: &[SideInput<String>],
    ) -> Result<Vec<Emit<String>>, NodeError> {
        std::thread::sleep(self.0);
        Ok(vec![Emit::to(0, element.clone())])
    }
}

fn words(items: &[&str]) -> Stream<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn strings(stream: Option<&Stream<String>>) -> Vec<&str> {
    stream
        .map(|s| s.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

fn runners() -> Vec<Box<dyn Runner<String>>> {
    vec![
        Box::new(LocalRunner::default()),
        Box::new(ParallelRunner::new(
            ExecutorConfig::builder()
                .max_concurrent_nodes(2usize)
                .build()
                .unwrap(),
        )),
    ]
}

fn self_sample_graph() -> Graph<String> {
    let mut builder = GraphBuilder::new();
    let split = builder
        .add_transform(
            "classify",
            NodeKind::transform(Classify),
            StreamRef::root(),
            [StreamRef::root()],
        )
        .unwrap();
    builder.add_collect("small", split.output(Classify::SMALL)).unwrap();
    builder.add_collect("big", split.output(Classify::BIG)).unwrap();
    builder.build().unwrap()
}

/// Baseline classification plus the four-stage stitch, cross-checked.
fn stitched_graph() -> Graph<String> {
    let mut builder = GraphBuilder::new();
    let words = StreamRef::root();
    let classify = || NodeKind::transform(Classify);

    let baseline = builder
        .add_transform("baseline", classify(), words.clone(), [words.clone()])
        .unwrap();

    let (small4, big3) = builder
        .composite("stitch", |b| {
            let a = b.add_transform("a", classify(), words.clone(), [words.clone()])?;
            let b1 = b.add_transform("b", classify(), words.clone(), [a.output("big")])?;
            let c = b.add_transform("c", classify(), b1.output("big"), [a.output("small")])?;
            let d = b.add_transform("d", classify(), b1.output("small"), [c.output("big")])?;
            Ok((d.output("small"), c.output("big")))
        })
        .unwrap();

    builder
        .add_check(
            "small_subset",
            NodeKind::check(Subset),
            [baseline.output("small"), small4.clone()],
        )
        .unwrap();
    builder
        .add_check(
            "big_subset",
            NodeKind::check(Subset),
            [big3.clone(), baseline.output("big")],
        )
        .unwrap();
    builder.add_collect("small", small4).unwrap();
    builder.add_collect("big", big3).unwrap();
    builder.build().unwrap()
}

#[tokio::test]
async fn test_self_sample_classification() {
    let graph = self_sample_graph();

    for runner in runners() {
        let result = runner
            .run(&graph, words(&["a", "bb", "ccc"]))
            .await
            .unwrap();
        assert_eq!(strings(result.output("small")), vec!["a"], "{}", runner.name());
        assert_eq!(strings(result.output("big")), vec!["bb", "ccc"]);
        assert_eq!(result.stats().nodes_run, 3);
        assert_eq!(result.stats().elements_processed, 3);
    }
}

#[tokio::test]
async fn test_stitched_graph_passes_checks() {
    let graph = stitched_graph();
    assert_eq!(graph.composite("stitch").map(<[_]>::len), Some(4));

    for runner in runners() {
        let result = runner
            .run(&graph, words(&["a", "bb", "ccc", "dddd"]))
            .await
            .unwrap();
        assert!(result.is_success());
        assert_eq!(strings(result.output("small")), vec!["a", "bb"]);
        assert_eq!(strings(result.output("big")), vec!["ccc", "dddd"]);
    }
}

#[tokio::test]
async fn test_runners_agree() {
    let graph = stitched_graph();
    let input = words(&["the", "quick", "brown", "fox", "jumps", "over", "a", "lazy", "dog"]);

    let local = LocalRunner::default()
        .run(&graph, input.clone())
        .await
        .unwrap();
    let again = LocalRunner::default()
        .run(&graph, input.clone())
        .await
        .unwrap();
    let parallel = ParallelRunner::default().run(&graph, input).await.unwrap();

    assert_eq!(local, again);
    assert_eq!(local, parallel);
}

#[tokio::test]
async fn test_empty_sample_isolated_to_its_branch() {
    let mut builder = GraphBuilder::new();
    let root = StreamRef::root();

    let nothing = builder
        .add_transform("nothing", NodeKind::transform(Keep::new(&[])), root.clone(), Vec::new())
        .unwrap();
    let empty = builder
        .add_transform(
            "empty",
            NodeKind::transform(Classify),
            root.clone(),
            [nothing.output("out")],
        )
        .unwrap();
    builder.add_collect("empty_small", empty.output("small")).unwrap();

    let healthy = builder
        .add_transform("healthy", NodeKind::transform(Classify), root.clone(), [root])
        .unwrap();
    builder.add_collect("healthy_big", healthy.output("big")).unwrap();
    let graph = builder.build().unwrap();

    for runner in runners() {
        let result = runner
            .execute(&graph, words(&["a", "bbb"]), CancellationToken::new())
            .await
            .unwrap();

        let failed = result.terminal("empty_small").unwrap();
        assert_eq!(
            failed.outcome,
            Err(NodeError::UpstreamFailed {
                node: "empty".into(),
                cause: Box::new(NodeError::EmptySample),
            })
        );
        assert!(result.terminal("healthy_big").unwrap().is_success());
        assert_eq!(strings(result.output("healthy_big")), vec!["bbb"]);
        assert!(result.output("empty_small").is_none());

        assert_eq!(result.stats().nodes_failed, 1);
        assert_eq!(result.stats().nodes_skipped, 1);
        assert!(!result.was_cancelled());

        let error = result.into_result().unwrap_err();
        assert!(matches!(error, Error::TerminalFailed { node, .. } if node == "empty_small"));
    }
}

#[tokio::test]
async fn test_subset_reports_first_missing_element() {
    let mut builder = GraphBuilder::new();
    let root = StreamRef::root();
    let only_y = builder
        .add_transform("only_y", NodeKind::transform(Keep::new(&["y"])), root.clone(), Vec::new())
        .unwrap();
    builder
        .add_check("subset", NodeKind::check(Subset), [root, only_y.output("out")])
        .unwrap();
    let graph = builder.build().unwrap();

    for runner in runners() {
        let error = runner.run(&graph, words(&["x", "y"])).await.unwrap_err();
        match error {
            Error::TerminalFailed { node, source } => {
                assert_eq!(node, "subset");
                assert_eq!(source, NodeError::SubsetViolation { element: "x".into() });
                assert_eq!(source.to_string(), "extra element: x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let graph = stitched_graph();
    let cancel = CancellationToken::new();
    cancel.cancel();

    for runner in runners() {
        let result = runner
            .execute(&graph, words(&["a", "bb"]), cancel.clone())
            .await
            .unwrap();

        assert!(result.was_cancelled());
        assert_eq!(result.stats().nodes_run, 0);
        assert_eq!(result.terminals().len(), 4);
        assert!(
            result
                .terminals()
                .iter()
                .all(|t| t.outcome == Err(NodeError::Cancelled))
        );
        assert!(result.outputs().is_empty());
    }
}

#[tokio::test]
async fn test_cancel_while_node_runs() {
    let mut builder = GraphBuilder::new();
    let slow = builder
        .add_transform(
            "slow",
            NodeKind::transform(Slow(Duration::from_millis(300))),
            StreamRef::root(),
            Vec::new(),
        )
        .unwrap();
    let after = builder
        .add_transform(
            "after",
            NodeKind::transform(Keep::new(&["a"])),
            slow.output("out"),
            Vec::new(),
        )
        .unwrap();
    builder.add_collect("first", slow.output("out")).unwrap();
    builder.add_collect("second", after.output("out")).unwrap();
    let graph = builder.build().unwrap();

    for runner in runners() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = runner
            .execute(&graph, words(&["a"]), cancel)
            .await
            .unwrap();

        // The running node finishes; nothing after it is scheduled.
        assert!(result.was_cancelled(), "{}", runner.name());
        assert_eq!(result.stats().nodes_run, 1);
        assert_eq!(result.stats().elements_processed, 1);
        assert_eq!(result.stats().nodes_skipped, 3);
        assert_eq!(result.terminals().len(), 2);
        assert!(
            result
                .terminals()
                .iter()
                .all(|t| t.outcome == Err(NodeError::Cancelled))
        );
        assert!(result.outputs().is_empty());
    }
}

#[tokio::test]
async fn test_run_with_empty_root() {
    let graph = self_sample_graph();

    for runner in runners() {
        let result = runner.run(&graph, Stream::empty()).await.unwrap();
        assert_eq!(result.output("small").map(Stream::len), Some(0));
        assert_eq!(result.output("big").map(Stream::len), Some(0));
    }
}

fn run_to_completion(graph: &Graph<String>, retain: bool) -> usize {
    let mut state = RunState::new(graph, words(&["a", "bb", "ccc"]), retain);
    for &id in graph.execution_order() {
        let task = state.prepare(graph, id).unwrap();
        state.complete(graph, task.run());
    }
    state.live_streams()
}

#[test]
fn test_intermediate_streams_released() {
    let graph = self_sample_graph();
    // Only the root remains once both collects have read their inputs.
    assert_eq!(run_to_completion(&graph, false), 1);
    assert_eq!(run_to_completion(&graph, true), 3);
}
