use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Pipeline stages, in the order a request moves through them. Analysis
/// fans out per segment, so `Analyzing` covers many sub-events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Started,
    FetchingTranscript,
    Segmenting,
    Analyzing,
    Complete,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusDetails {
    pub stage: Stage,
    pub message: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

/// One streamed event. On the wire this is
/// `{"type": "status"|"segment_result"|"complete"|"error", "data": {...}}`,
/// one JSON object per line. `segment_result` events may arrive in any
/// order and carry the originating segment index; exactly one terminal
/// `complete` or `error` closes a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ProgressEvent {
    Status(StatusDetails),
    SegmentResult {
        segment: usize,
        result: serde_json::Value,
    },
    Complete {
        result: serde_json::Value,
    },
    Error {
        message: String,
    },
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Complete { .. } | ProgressEvent::Error { .. })
    }
}

/// Cheap clonable handle the pipelines emit progress through. A null
/// sink drops everything, so callers that only want the final result pay
/// nothing. Once a terminal event has gone out, all further events are
/// dropped.
#[derive(Clone)]
pub struct ProgressSink {
    request_id: Uuid,
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
    terminal: Arc<AtomicBool>,
}

impl ProgressSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                request_id: Uuid::new_v4(),
                tx: Some(tx),
                terminal: Arc::new(AtomicBool::new(false)),
            },
            rx,
        )
    }

    pub fn disabled() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            tx: None,
            terminal: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn emit(&self, event: ProgressEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        if self.terminal.load(Ordering::Acquire) {
            return;
        }
        if event.is_terminal() {
            self.terminal.store(true, Ordering::Release);
        }
        let _ = tx.send(event);
    }

    pub fn status(&self, stage: Stage, message: impl Into<String>, details: serde_json::Value) {
        self.emit(ProgressEvent::Status(StatusDetails {
            stage,
            message: message.into(),
            details,
        }));
    }

    pub fn segment_result(&self, segment: usize, result: serde_json::Value) {
        self.emit(ProgressEvent::SegmentResult { segment, result });
    }

    pub fn complete(&self, result: serde_json::Value) {
        self.emit(ProgressEvent::Complete { result });
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(ProgressEvent::Error {
            message: message.into(),
        });
    }
}
