//! Concurrent processing of several inbound objects

use super::handler::{InboundObject, PipelineHandler};
use super::summary::RunSummary;
use futures::stream::{self, StreamExt};
use std::time::Instant;

/// Handle every object, at most `max_concurrency` at a time
///
/// Invocations share nothing, so completion order is irrelevant. Failures
/// have already been reported to the alert sink by the handler.
pub async fn run_objects(
    handler: &PipelineHandler,
    objects: Vec<InboundObject>,
    max_concurrency: usize,
) -> RunSummary {
    let start_time = Instant::now();
    let mut summary = RunSummary::new();

    tracing::info!(
        object_count = objects.len(),
        max_concurrency,
        "Processing inbound objects"
    );

    let results: Vec<_> = stream::iter(objects)
        .map(|object| async move {
            let result = handler.handle(&object).await;
            (object.key, result)
        })
        .buffer_unordered(max_concurrency.max(1))
        .collect()
        .await;

    for (key, result) in results {
        match result {
            Ok(outcome) => summary.record_success(outcome),
            Err(err) => summary.record_failure(key, &err),
        }
    }

    summary.with_duration(start_time.elapsed())
}
