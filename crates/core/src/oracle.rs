use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{KonspektError, Result};
use crate::types::ShowNoteItem;

#[derive(Clone, Debug, Default)]
pub enum Provider {
    #[default]
    Grok,
    Openai,
    Gemini,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-5.1",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-3-pro",
                env_var: "GEMINI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Grok => "Grok",
            Provider::Openai => "OpenAI",
            Provider::Gemini => "Gemini",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Provider::Grok => "grok",
            Provider::Openai => "openai",
            Provider::Gemini => "gemini",
        }
    }

    /// Validate that the API key is set for this provider.
    pub fn validate_api_key(&self) -> Result<String> {
        let config = self.config();
        std::env::var(config.env_var).map_err(|_| KonspektError::MissingApiKey {
            env_var: config.env_var.to_string(),
        })
    }
}

/// What the model returns for one segment of the outline pipeline.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ChapterAnalysis {
    pub text: String,
    pub start: f64,
    #[serde(default)]
    pub bullet_points: Vec<String>,
    #[serde(default)]
    pub entities: Vec<crate::types::Entity>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct QuizDraft {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

#[derive(Debug, serde::Deserialize)]
struct ShowNoteList {
    items: Vec<ShowNoteItem>,
}

#[derive(Debug, serde::Deserialize)]
struct UrlSelection {
    selected_url: String,
}

/// The external text-to-structured-data analysis dependency. One method
/// per operation the pipelines need; implementations must be safe to
/// call from many concurrent segment tasks.
#[async_trait]
pub trait AnalysisOracle: Send + Sync {
    async fn chapter(&self, segment_text: &str) -> Result<ChapterAnalysis>;

    async fn show_notes(&self, segment_text: &str) -> Result<Vec<ShowNoteItem>>;

    async fn select_url(
        &self,
        name: &str,
        search_query: &str,
        context: &str,
        candidates: &[String],
    ) -> Result<String>;

    async fn quiz_question(&self, segment_text: &str) -> Result<QuizDraft>;
}

static CHAPTER_PROMPT: &str = r#"You are given a portion of a video transcript. Each entry is formatted as [<seconds>s] <text>. Analyze this segment and produce one chapter covering it.

Guidelines:
- The chapter title must be concise and descriptive of the dominant topic.
- Pick the chapter start from the transcript entry where that topic begins, using the exact timestamp from the segment.
- Provide 3-5 bullet points summarizing the whole segment, not just its opening.
- List significant named entities (people, books, papers, organizations, tools) mentioned in the segment.

Output ONLY valid JSON matching this structure (no markdown, no explanation):
{
  "text": "Chapter title",
  "start": 123.5,
  "bullet_points": ["point 1", "point 2", "point 3"],
  "entities": [{"name": "Entity Name", "kind": "person|book|paper|organization|tool|event|other"}]
}"#;

static SHOW_NOTES_PROMPT: &str = r#"You are given a portion of a video transcript with [<seconds>s] timestamps. Build show notes from it: list the important books, papers, articles, people, organizations, software and events.

Rules:
- Only include entities relevant to the key topics or arguments.
- Skip common or obvious entities unless they matter to the point being made.
- For people, include both first and last names.
- The transcript contains spelling mistakes; correct them from context.

For each significant entity:
- name: the name as mentioned, corrected if misspelled.
- search_query: a very detailed web search query that would retrieve the canonical page for this entity (the book, the paper, the person's article). Include enough context from the conversation to disambiguate.
- context: two sentences explaining where and why the entity came up.
- timestamp: HH:MM:SS where it is discussed, taken from the transcript (use hours even under one hour, e.g. 00:05:30).

Output ONLY valid JSON (no markdown, no explanation):
{"items": [{"name": "...", "search_query": "...", "context": "...", "timestamp": "00:05:30"}]}"#;

static QUIZ_PROMPT: &str = r#"Based on the following video transcript segment, generate one multiple choice question with exactly 4 options testing understanding of a key concept from the segment.

Output ONLY valid JSON (no markdown, no explanation):
{
  "question": "Your question here?",
  "options": ["option1", "option2", "option3", "option4"],
  "correct_answer": 0
}

The options must be clear and distinct, and correct_answer is the 0-based index of the right one."#;

/// LLM-backed oracle speaking the OpenAI-compatible chat completions
/// protocol. Calls are not retried; a failed call drops that segment's
/// contribution upstream.
pub struct LlmOracle {
    client: reqwest::Client,
    provider: Provider,
}

impl LlmOracle {
    pub fn new(provider: Provider) -> Result<Self> {
        // Fail fast on a missing key instead of erroring mid-pipeline.
        provider.validate_api_key()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self { client, provider })
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let config = self.provider.config();
        let api_key = self.provider.validate_api_key()?;

        let response = self
            .client
            .post(config.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&serde_json::json!({
                "model": config.model,
                "messages": [
                    {
                        "role": "system",
                        "content": system_prompt,
                    },
                    {
                        "role": "user",
                        "content": user_prompt,
                    },
                ],
                "temperature": 0.3,
            }))
            .send()
            .await?
            .json::<serde_json::Value>()
            .await?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| KonspektError::OracleRejected {
                reason: format!("unexpected API response structure: {:?}", response),
            })?;

        Ok(content.to_string())
    }
}

#[async_trait]
impl AnalysisOracle for LlmOracle {
    async fn chapter(&self, segment_text: &str) -> Result<ChapterAnalysis> {
        let content = self
            .complete(CHAPTER_PROMPT, &format!("Transcript segment:\n{segment_text}"))
            .await?;
        parse_structured(&content)
    }

    async fn show_notes(&self, segment_text: &str) -> Result<Vec<ShowNoteItem>> {
        let content = self
            .complete(SHOW_NOTES_PROMPT, &format!("Transcript segment:\n{segment_text}"))
            .await?;
        let list: ShowNoteList = parse_structured(&content)?;
        Ok(list.items)
    }

    async fn select_url(
        &self,
        name: &str,
        search_query: &str,
        context: &str,
        candidates: &[String],
    ) -> Result<String> {
        let listing = candidates
            .iter()
            .map(|url| format!("- {url}"))
            .collect::<Vec<_>>()
            .join("\n");
        let user_prompt = format!(
            r#"These URLs came from a web search for the query below. Pick the single most relevant URL for the entity given its context.

Entity Name: {name}
Context: {context}
Search Query Used: {search_query}

URLs:
{listing}

Output ONLY valid JSON: {{"selected_url": "..."}}"#
        );
        let content = self
            .complete("You select the best reference URL for an entity.", &user_prompt)
            .await?;
        let selection: UrlSelection = parse_structured(&content)?;
        Ok(selection.selected_url)
    }

    async fn quiz_question(&self, segment_text: &str) -> Result<QuizDraft> {
        let content = self
            .complete(QUIZ_PROMPT, &format!("Transcript segment:\n{segment_text}"))
            .await?;
        parse_structured(&content)
    }
}

/// Strict parse of model output: JSON only, optionally wrapped in a
/// markdown code fence. Anything else is rejected, never evaluated.
fn parse_structured<T: DeserializeOwned>(content: &str) -> Result<T> {
    let stripped = strip_code_fences(content);
    serde_json::from_str(stripped).map_err(|err| KonspektError::OracleRejected {
        reason: format!("malformed JSON from model: {err}"),
    })
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag after the opening fence.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches(['\r', '\n'])
        .strip_suffix("```")
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_json() {
        let draft: QuizDraft = parse_structured(
            r#"{"question": "Q?", "options": ["a", "b", "c", "d"], "correct_answer": 2}"#,
        )
        .expect("bare JSON should parse");
        assert_eq!(draft.correct_answer, 2);
    }

    #[test]
    fn parses_fenced_json() {
        let content = "```json\n{\"text\": \"Intro\", \"start\": 0.0, \"bullet_points\": [], \"entities\": []}\n```";
        let analysis: ChapterAnalysis = parse_structured(content).expect("fenced JSON should parse");
        assert_eq!(analysis.text, "Intro");
    }

    #[test]
    fn rejects_non_json_output() {
        let result: Result<QuizDraft> = parse_structured("Sure! Here is your question: ...");
        assert!(matches!(
            result,
            Err(KonspektError::OracleRejected { .. })
        ));
    }

    #[test]
    fn rejects_schema_mismatch() {
        let result: Result<QuizDraft> =
            parse_structured(r#"{"question": "Q?", "options": "not a list"}"#);
        assert!(matches!(
            result,
            Err(KonspektError::OracleRejected { .. })
        ));
    }
}
