pub mod cache;
pub mod error;
pub mod fetch;
pub mod format;
pub mod oracle;
pub mod outline;
pub mod process;
pub mod progress;
pub mod quiz;
pub mod reconcile;
pub mod research;
pub mod search;
pub mod segment;
pub mod types;

pub use cache::{
    get_cache_dir, get_outline_path, get_quiz_path, get_root_cache_dir, get_show_notes_path,
    get_transcript_path, load_json, store_json,
};
pub use error::{KonspektError, Result};
pub use fetch::{TranscriptFetcher, extract_video_id};
pub use format::{
    format_outline_readable, format_quiz_readable, format_show_notes_readable, format_timestamp,
};
pub use oracle::{AnalysisOracle, LlmOracle, Provider};
pub use outline::generate_outline;
pub use process::{ProcessorConfig, SegmentOutcome};
pub use progress::{ProgressEvent, ProgressSink, Stage};
pub use quiz::generate_quiz;
pub use reconcile::finalize_outline;
pub use research::{generate_show_notes, resolve_reference};
pub use search::{BackoffConfig, GoogleSearchClient, SearchClient};
pub use segment::{SegmenterConfig, split_into_segments};
pub use types::{
    FinalizedOutline, FinalizedOutlinePoint, OutlinePoint, QuizQuestion, Segment, ShowNoteItem,
    Transcript, TranscriptEntry,
};
