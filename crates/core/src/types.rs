use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub start: f64,
    #[serde(default)]
    pub duration: f64,
    pub text: String,
}

/// Ordered transcript. Entries are assumed sorted non-decreasingly by
/// `start`; the segmenter relies on this and does not sort.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    pub entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new(entries: Vec<TranscriptEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// End of the spoken content: last entry's start plus its duration.
    pub fn total_duration(&self) -> f64 {
        self.entries
            .last()
            .map(|e| e.start + e.duration)
            .unwrap_or(0.0)
    }
}

/// Contiguous non-empty slice of a transcript, tagged with its position.
/// Segments partition the transcript exactly, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub entries: Vec<TranscriptEntry>,
}

impl Segment {
    /// Time range covered by this segment's entry starts.
    pub fn span(&self) -> (f64, f64) {
        let first = self.entries.first().map(|e| e.start).unwrap_or(0.0);
        let last = self.entries.last().map(|e| e.start).unwrap_or(first);
        (first, last)
    }

    pub fn word_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.text.split_whitespace().count())
            .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlinePoint {
    pub text: String,
    pub start: f64,
    #[serde(default)]
    pub bullet_points: Vec<String>,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizedOutlinePoint {
    pub text: String,
    pub start: f64,
    pub duration: f64,
    #[serde(default)]
    pub bullet_points: Vec<String>,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinalizedOutline {
    pub points: Vec<FinalizedOutlinePoint>,
}

/// One show-notes reference per significant entity. `url` is filled in by
/// reference resolution and stays `None` when no candidate resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowNoteItem {
    pub name: String,
    pub search_query: String,
    pub context: String,
    pub timestamp: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: u32,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}
