use std::sync::Arc;

use crate::error::{KonspektError, Result};
use crate::oracle::AnalysisOracle;
use crate::outline::emit_segments_created;
use crate::process::{ProcessorConfig, process_ordered};
use crate::progress::{ProgressSink, Stage};
use crate::segment::{SegmenterConfig, split_into_segments};
use crate::types::{QuizQuestion, Transcript};

const QUIZ_OPTION_COUNT: usize = 4;

/// Generate a short quiz: one multiple-choice question per segment of a
/// fixed five-way split. A segment whose question fails generation or
/// validation contributes nothing; question ids keep the 1-based segment
/// numbering, so a dropped segment leaves a gap rather than renumbering.
pub async fn generate_quiz(
    transcript: &Transcript,
    oracle: Arc<dyn AnalysisOracle>,
    processor: &ProcessorConfig,
    progress: &ProgressSink,
) -> Result<Vec<QuizQuestion>> {
    if transcript.is_empty() {
        return Ok(Vec::new());
    }

    let segmenter = SegmenterConfig::quiz();
    let target = segmenter.target_segment_count(transcript.total_duration());
    progress.status(
        Stage::Segmenting,
        "Splitting transcript into segments",
        serde_json::json!({ "target_segments": target }),
    );
    let segments = split_into_segments(transcript, target);
    emit_segments_created(progress, &segments);

    progress.status(
        Stage::Analyzing,
        "Generating quiz questions",
        serde_json::json!({ "total_segments": segments.len() }),
    );

    let outcomes = process_ordered(segments, processor, move |index, segment| {
        let oracle = Arc::clone(&oracle);
        async move {
            let text = segment
                .entries
                .iter()
                .map(|e| e.text.trim())
                .collect::<Vec<_>>()
                .join(" ");
            let draft = oracle.quiz_question(&text).await?;

            if draft.options.len() != QUIZ_OPTION_COUNT {
                return Err(KonspektError::OracleRejected {
                    reason: format!(
                        "expected {} options, got {}",
                        QUIZ_OPTION_COUNT,
                        draft.options.len()
                    ),
                });
            }
            if draft.correct_answer >= draft.options.len() {
                return Err(KonspektError::OracleRejected {
                    reason: format!("correct_answer {} out of range", draft.correct_answer),
                });
            }

            Ok(QuizQuestion {
                id: (index + 1) as u32,
                question: draft.question,
                options: draft.options,
                correct_answer: draft.correct_answer,
            })
        }
    })
    .await;

    let questions: Vec<QuizQuestion> = outcomes.into_iter().map(|o| o.value).collect();
    progress.complete(serde_json::json!({
        "questions": serde_json::to_value(&questions).unwrap_or(serde_json::Value::Null),
    }));
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{ChapterAnalysis, QuizDraft};
    use crate::types::TranscriptEntry;
    use async_trait::async_trait;

    struct ScriptedQuizOracle;

    #[async_trait]
    impl AnalysisOracle for ScriptedQuizOracle {
        async fn chapter(&self, _segment_text: &str) -> crate::error::Result<ChapterAnalysis> {
            unreachable!("quiz generation never asks for chapters")
        }

        async fn show_notes(
            &self,
            _segment_text: &str,
        ) -> crate::error::Result<Vec<crate::types::ShowNoteItem>> {
            unreachable!("quiz generation never asks for show notes")
        }

        async fn select_url(
            &self,
            _name: &str,
            _search_query: &str,
            _context: &str,
            _candidates: &[String],
        ) -> crate::error::Result<String> {
            unreachable!("quiz generation never selects urls")
        }

        async fn quiz_question(&self, segment_text: &str) -> crate::error::Result<QuizDraft> {
            if segment_text.contains("broken") {
                // Three options: fails strict validation downstream.
                return Ok(QuizDraft {
                    question: "Malformed?".into(),
                    options: vec!["a".into(), "b".into(), "c".into()],
                    correct_answer: 0,
                });
            }
            Ok(QuizDraft {
                question: format!("What was said in '{}'?", &segment_text[..12.min(segment_text.len())]),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: 1,
            })
        }
    }

    fn transcript(words: &[&str]) -> Transcript {
        Transcript::new(
            words
                .iter()
                .enumerate()
                .map(|(i, w)| TranscriptEntry {
                    start: i as f64 * 60.0,
                    duration: 60.0,
                    text: (*w).to_string(),
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn one_question_per_segment_with_segment_numbering() {
        let input = transcript(&["one", "two", "three", "four", "five"]);
        let questions = generate_quiz(
            &input,
            Arc::new(ScriptedQuizOracle),
            &ProcessorConfig::default(),
            &ProgressSink::disabled(),
        )
        .await
        .expect("quiz generation succeeds");

        assert_eq!(questions.len(), 5);
        let ids: Vec<u32> = questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert!(questions.iter().all(|q| q.options.len() == 4));
    }

    #[tokio::test]
    async fn invalid_draft_drops_that_segments_question() {
        let input = transcript(&["one", "broken", "three", "four", "five"]);
        let questions = generate_quiz(
            &input,
            Arc::new(ScriptedQuizOracle),
            &ProcessorConfig::default(),
            &ProgressSink::disabled(),
        )
        .await
        .expect("quiz generation succeeds");

        assert_eq!(questions.len(), 4);
        let ids: Vec<u32> = questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 3, 4, 5]);
    }

    #[tokio::test]
    async fn empty_transcript_yields_no_questions() {
        let questions = generate_quiz(
            &Transcript::default(),
            Arc::new(ScriptedQuizOracle),
            &ProcessorConfig::default(),
            &ProgressSink::disabled(),
        )
        .await
        .expect("empty quiz generation succeeds");
        assert!(questions.is_empty());
    }
}
