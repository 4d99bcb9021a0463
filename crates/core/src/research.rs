use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::error::{KonspektError, Result};
use crate::format::format_segment_text;
use crate::oracle::AnalysisOracle;
use crate::outline::emit_segments_created;
use crate::process::{ProcessorConfig, process_streaming};
use crate::progress::{ProgressSink, Stage};
use crate::search::SearchClient;
use crate::segment::{SegmenterConfig, split_into_segments};
use crate::types::{ShowNoteItem, Transcript};

static ANALYSIS_MESSAGES: [&str; 11] = [
    "Analyzing: {}",
    "Searching for information on: {}",
    "Gathering data on: {}",
    "Investigating details about: {}",
    "Researching context for: {}",
    "Exploring topic: {}",
    "Examining key points about: {}",
    "Extracting insights about: {}",
    "Processing information for: {}",
    "Synthesizing information on: {}",
    "Compiling research on: {}",
];

fn random_analysis_message(topic: &str) -> String {
    let template = ANALYSIS_MESSAGES
        .choose(&mut rand::thread_rng())
        .unwrap_or(&ANALYSIS_MESSAGES[0]);
    template.replace("{}", topic)
}

/// Resolve a reference URL for one extracted entity: search the web,
/// let the model pick the best candidate, fall back to the first one if
/// selection fails. No candidates, or a failed search, means no URL —
/// never an error.
pub async fn resolve_reference(
    search: &dyn SearchClient,
    oracle: &dyn AnalysisOracle,
    item: &ShowNoteItem,
) -> Option<String> {
    let urls = match search.search(&item.search_query).await {
        Ok(urls) => urls,
        Err(err) => {
            tracing::warn!(entity = %item.name, error = %err, "reference search failed");
            return None;
        }
    };
    if urls.is_empty() {
        return None;
    }

    match oracle
        .select_url(&item.name, &item.search_query, &item.context, &urls)
        .await
    {
        Ok(url) => Some(url),
        Err(err) => {
            tracing::warn!(
                entity = %item.name,
                error = %err,
                "url selection failed, falling back to first candidate"
            );
            urls.into_iter().next()
        }
    }
}

/// Build show notes for a transcript: extract significant entities per
/// segment concurrently, resolve a reference URL for each, stream
/// per-segment batches as they complete, and return the aggregate in
/// segment order.
pub async fn generate_show_notes(
    transcript: &Transcript,
    oracle: Arc<dyn AnalysisOracle>,
    search: Arc<dyn SearchClient>,
    segmenter: &SegmenterConfig,
    processor: &ProcessorConfig,
    progress: &ProgressSink,
) -> Result<Vec<ShowNoteItem>> {
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
        "Starting show notes analysis",
        serde_json::json!({ "total_segments": segment_count }),
    );

    let task_progress = progress.clone();
    let mut streaming = process_streaming(segments, processor, move |index, segment| {
        let oracle = Arc::clone(&oracle);
        let search = Arc::clone(&search);
        let progress = task_progress.clone();
        async move {
            let (start_time, end_time) = segment.span();
            progress.status(
                Stage::Analyzing,
                format!("Processing segment {}/{}", index + 1, segment_count),
                serde_json::json!({
                    "segment": index + 1,
                    "total_segments": segment_count,
                    "start_time": start_time,
                    "end_time": end_time,
                }),
            );

            let text = format_segment_text(&segment);
            let drafts = oracle.show_notes(&text).await?;
            progress.status(
                Stage::Analyzing,
                format!("Found {} topics in segment {}", drafts.len(), index + 1),
                serde_json::json!({
                    "segment": index + 1,
                    "topics": drafts.iter().map(|d| d.name.clone()).collect::<Vec<_>>(),
                }),
            );

            let mut notes = Vec::with_capacity(drafts.len());
            for draft in drafts {
                progress.status(
                    Stage::Analyzing,
                    random_analysis_message(&draft.name),
                    serde_json::json!({
                        "topic": draft.name,
                        "segment": index + 1,
                    }),
                );
                let url = resolve_reference(search.as_ref(), oracle.as_ref(), &draft).await;
                notes.push(ShowNoteItem { url, ..draft });
            }
            Ok(notes)
        }
    });

    let mut outcomes = Vec::new();
    while let Some(outcome) = streaming.recv().await {
        if let Ok(value) = serde_json::to_value(&outcome.value) {
            progress.segment_result(
                outcome.index,
                serde_json::json!({ "show_notes": value }),
            );
        }
        outcomes.push(outcome);
    }

    outcomes.sort_by_key(|o| o.index);
    let all_notes: Vec<ShowNoteItem> = outcomes.into_iter().flat_map(|o| o.value).collect();

    progress.complete(serde_json::json!({
        "show_notes": serde_json::to_value(&all_notes).unwrap_or(serde_json::Value::Null),
    }));
    Ok(all_notes)
}
