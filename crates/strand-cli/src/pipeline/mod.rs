//! The ping-pong word pipeline.
//!
//! ```text
//! lines ─ extract ─ words ─┬─ baseline ─ small, big ──────────┐
//!                          └─ ping: a → b → c → d ─ small4, big3 ─ subset checks
//! ```
//!
//! The baseline classifies every word against all words. The `ping`
//! composite reaches a classification through four stages, each reading
//! another stage's output as its sample. Two subset checks cross-check both
//! paths, and the stitched result is written out.

mod extract;

use std::path::Path;

use anyhow::Context;
pub use extract::ExtractWords;
use strand_runtime::engine::{ExecutionResult, Runner};
use strand_runtime::graph::{Graph, GraphBuilder};
use strand_runtime::io::{LineSink, LineSource};
use strand_runtime::node::{Classify, NodeKind, Subset};
use strand_runtime::{Result, StreamRef};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_PIPELINE;

/// Run output holding the stitched small words.
pub const SMALL_OUTPUT: &str = "small";
/// Run output holding the stitched big words.
pub const BIG_OUTPUT: &str = "big";

/// Name of the composite grouping the four stitched stages.
pub const STITCH_COMPOSITE: &str = "ping";

/// Builds the pipeline graph over a root stream of text lines.
pub fn build_graph() -> Result<Graph<String>> {
    let mut builder = GraphBuilder::new();

    let extract = ExtractWords::new()
        .map_err(|e| strand_runtime::Error::invalid(format!("word pattern: {e}")))?;
    let words = builder
        .add_transform(
            "extract",
            NodeKind::transform(extract),
            StreamRef::root(),
            Vec::new(),
        )?
        .output(ExtractWords::WORDS);

    let baseline = builder.add_transform(
        "baseline",
        NodeKind::transform(Classify),
        words.clone(),
        [words.clone()],
    )?;
    let (small4, big3) = builder.composite(STITCH_COMPOSITE, |b| stitch(b, &words))?;

    builder.add_check(
        "small_subset",
        NodeKind::check(Subset),
        [baseline.output(Classify::SMALL), small4.clone()],
    )?;
    builder.add_check(
        "big_subset",
        NodeKind::check(Subset),
        [big3.clone(), baseline.output(Classify::BIG)],
    )?;

    builder.add_collect(SMALL_OUTPUT, small4)?;
    builder.add_collect(BIG_OUTPUT, big3)?;
    builder.build()
}

/// Adds four classification stages whose samples are each other's outputs.
///
/// Returns the small output of the last stage and the big output of the
/// third.
fn stitch(builder: &mut GraphBuilder<String>, words: &StreamRef) -> Result<(StreamRef, StreamRef)> {
    let classify = || NodeKind::transform(Classify);

    let a = builder.add_transform("a", classify(), words.clone(), [words.clone()])?;
    let b = builder.add_transform("b", classify(), words.clone(), [a.output(Classify::BIG)])?;
    let c = builder.add_transform(
        "c",
        classify(),
        b.output(Classify::BIG),
        [a.output(Classify::SMALL)],
    )?;
    let d = builder.add_transform(
        "d",
        classify(),
        b.output(Classify::SMALL),
        [c.output(Classify::BIG)],
    )?;

    Ok((d.output(Classify::SMALL), c.output(Classify::BIG)))
}

/// Reads `source`, runs `graph` and writes every collected output to `sink`.
///
/// Outputs of collects that succeeded are written even when other terminals
/// failed; the caller decides how to report failures.
pub async fn execute(
    graph: &Graph<String>,
    runner: &dyn Runner<String>,
    source: &dyn LineSource,
    sink: &dyn LineSink,
    cancel: CancellationToken,
) -> anyhow::Result<ExecutionResult<String>> {
    let lines = source.read_lines().await.context("failed to read input")?;

    tracing::info!(
        target: TRACING_TARGET_PIPELINE,
        runner = runner.name(),
        lines = lines.len(),
        "Executing pipeline"
    );
    let result = runner
        .execute(graph, lines, cancel)
        .await
        .context("pipeline execution failed")?;

    for report in result.terminals() {
        match &report.outcome {
            Ok(()) => tracing::info!(
                target: TRACING_TARGET_PIPELINE,
                node = %report.node,
                "Terminal succeeded"
            ),
            Err(error) => tracing::error!(
                target: TRACING_TARGET_PIPELINE,
                node = %report.node,
                error = %error,
                "Terminal failed"
            ),
        }
    }

    for (name, stream) in result.outputs() {
        let path = sink
            .write_lines(name, stream)
            .await
            .with_context(|| format!("failed to write output {name}"))?;
        tracing::info!(
            target: TRACING_TARGET_PIPELINE,
            output = %name,
            path = %path.display(),
            elements = stream.len(),
            "Wrote output"
        );
    }

    Ok(result)
}

/// Writes the graph in DOT format to `path`, or to stdout.
pub async fn render_dot(graph: &Graph<String>, path: Option<&Path>) -> anyhow::Result<()> {
    let dot = graph.to_dot();

    match path {
        Some(path) => {
            tokio::fs::write(path, &dot)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(
                target: TRACING_TARGET_PIPELINE,
                path = %path.display(),
                "Wrote graph"
            );
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(dot.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}
