use std::sync::Arc;

use crate::error::{KonspektError, Result};
use crate::format::format_segment_text;
use crate::oracle::AnalysisOracle;
use crate::process::{ProcessorConfig, process_streaming};
use crate::progress::{ProgressSink, Stage};
use crate::reconcile::finalize_outline;
use crate::segment::{SegmenterConfig, split_into_segments};
use crate::types::{FinalizedOutline, OutlinePoint, Transcript};

/// Generate the chapter outline for a transcript: estimate the segment
/// count, split, analyze every segment concurrently, and reconcile the
/// surviving chapters into a duration-annotated outline sorted by start.
/// A failed segment drops only its own chapter; the call errors only
/// when the input is unusable or no segment produced anything.
pub async fn generate_outline(
    transcript: &Transcript,
    oracle: Arc<dyn AnalysisOracle>,
    segmenter: &SegmenterConfig,
    processor: &ProcessorConfig,
    progress: &ProgressSink,
) -> Result<FinalizedOutline> {
    if transcript.is_empty() {
        return Err(KonspektError::InvalidInput {
            reason: "empty transcript".to_string(),
        });
    }

    let total_duration = transcript.total_duration();
    let target = segmenter.target_segment_count(total_duration);
    progress.status(
        Stage::Segmenting,
        "Splitting transcript into segments",
        serde_json::json!({
            "total_duration": total_duration,
            "target_segments": target,
        }),
    );

    let segments = split_into_segments(transcript, target);
    emit_segments_created(progress, &segments);

    let segment_count = segments.len();
    progress.status(
        Stage::Analyzing,
        "Generating chapters",
        serde_json::json!({ "total_segments": segment_count }),
    );

    let task_progress = progress.clone();
    let mut streaming = process_streaming(segments, processor, move |index, segment| {
        let oracle = Arc::clone(&oracle);
        let progress = task_progress.clone();
        async move {
            progress.status(
                Stage::Analyzing,
                format!("Processing segment {}/{}", index + 1, segment_count),
                serde_json::json!({
                    "segment": index + 1,
                    "total_segments": segment_count,
                }),
            );

            let span = segment.span();
            let text = format_segment_text(&segment);
            let mut analysis = oracle.chapter(&text).await?;

            // Chapter starts must stay inside the segment that produced
            // them; the model is not trusted on this.
            let clamped = analysis.start.clamp(span.0, span.1);
            if clamped != analysis.start {
                tracing::warn!(
                    segment = index,
                    reported = analysis.start,
                    clamped,
                    "chapter start outside segment span"
                );
                analysis.start = clamped;
            }

            Ok(OutlinePoint {
                text: analysis.text,
                start: analysis.start,
                bullet_points: analysis.bullet_points,
                entities: analysis.entities,
            })
        }
    });

    let mut points = Vec::new();
    while let Some(outcome) = streaming.recv().await {
        if let Ok(value) = serde_json::to_value(&outcome.value) {
            progress.segment_result(outcome.index, value);
        }
        points.push(outcome.value);
    }

    if points.is_empty() {
        return Err(KonspektError::UpstreamUnavailable {
            service: "analysis oracle",
            reason: "every segment analysis failed".to_string(),
        });
    }

    let outline = finalize_outline(points, total_duration);
    progress.complete(serde_json::to_value(&outline).unwrap_or(serde_json::Value::Null));
    Ok(outline)
}

pub(crate) fn emit_segments_created(progress: &ProgressSink, segments: &[crate::types::Segment]) {
    progress.status(
        Stage::Segmenting,
        format!("Split transcript into {} segments", segments.len()),
        serde_json::json!({
            "segment_count": segments.len(),
            "segments": segments
                .iter()
                .map(|s| {
                    let (start, end) = s.span();
                    serde_json::json!({
                        "start_time": start,
                        "end_time": end,
                        "word_count": s.word_count(),
                    })
                })
                .collect::<Vec<_>>(),
        }),
    );
}
