use crate::types::{Segment, Transcript};

/// Shared segmentation parameters. Outline, show notes, and quiz all go
/// through the same splitter, specialized only by this config.
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    pub min_segments: usize,
    pub max_segments: usize,
    /// Exponent applied to the duration in minutes; 0.5 gives the
    /// square-root scale, keeping segment count sub-linear in duration.
    pub scale_exponent: f64,
    pub scale_factor: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_segments: 5,
            max_segments: 100,
            scale_exponent: 0.5,
            scale_factor: 2.0,
        }
    }
}

impl SegmenterConfig {
    pub fn outline() -> Self {
        Self::default()
    }

    pub fn show_notes() -> Self {
        Self {
            max_segments: 30,
            ..Self::default()
        }
    }

    /// Quiz generation always uses a fixed five-way split.
    pub fn quiz() -> Self {
        Self {
            min_segments: 5,
            max_segments: 5,
            ..Self::default()
        }
    }

    /// Derive the target segment count from total duration in seconds,
    /// clamped to `[min_segments, max_segments]`.
    pub fn target_segment_count(&self, total_duration: f64) -> usize {
        let minutes = (total_duration / 60.0).max(0.0);
        let raw = (minutes.powf(self.scale_exponent) * self.scale_factor).floor() as usize;
        raw.clamp(self.min_segments, self.max_segments)
    }
}

/// Split a transcript into up to `target` contiguous, roughly time-equal
/// segments. Boundaries form a fixed ladder from 0 with rung
/// `total_duration / target`; rungs with no entries are skipped, so every
/// emitted segment is non-empty. The concatenation of all segments is
/// exactly the input transcript. `target` is a target, not a contract.
pub fn split_into_segments(transcript: &Transcript, target: usize) -> Vec<Segment> {
    if transcript.is_empty() || target == 0 {
        return Vec::new();
    }

    let total_duration = transcript.total_duration();
    let rung = total_duration / target as f64;
    if rung <= 0.0 {
        // Degenerate zero-length transcript collapses into one segment.
        return vec![Segment {
            index: 0,
            entries: transcript.entries.clone(),
        }];
    }

    let mut segments: Vec<Segment> = Vec::new();
    let mut current = Vec::new();
    let mut boundary = 0.0;

    for entry in &transcript.entries {
        while entry.start >= boundary + rung {
            if !current.is_empty() {
                segments.push(Segment {
                    index: segments.len(),
                    entries: std::mem::take(&mut current),
                });
            }
            boundary += rung;
        }
        current.push(entry.clone());
    }

    if !current.is_empty() {
        segments.push(Segment {
            index: segments.len(),
            entries: current,
        });
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TranscriptEntry;

    fn entry(start: f64, duration: f64) -> TranscriptEntry {
        TranscriptEntry {
            start,
            duration,
            text: format!("entry at {start}"),
        }
    }

    fn transcript(starts: &[f64]) -> Transcript {
        Transcript::new(starts.iter().map(|&s| entry(s, 1.0)).collect())
    }

    #[test]
    fn target_count_uses_square_root_scale() {
        let cfg = SegmenterConfig::default();
        // 600s = 10 minutes, floor(sqrt(10) * 2) = 6
        assert_eq!(cfg.target_segment_count(600.0), 6);
    }

    #[test]
    fn target_count_clamps_to_bounds() {
        let cfg = SegmenterConfig::default();
        assert_eq!(cfg.target_segment_count(0.0), cfg.min_segments);
        assert_eq!(cfg.target_segment_count(60.0), cfg.min_segments);

        let capped = SegmenterConfig {
            max_segments: 30,
            ..SegmenterConfig::default()
        };
        // A week of video would blow way past the cap.
        assert_eq!(capped.target_segment_count(604_800.0), 30);
    }

    #[test]
    fn target_count_is_monotonic() {
        let cfg = SegmenterConfig::default();
        let mut previous = 0;
        for minutes in 0..600 {
            let count = cfg.target_segment_count(minutes as f64 * 60.0);
            assert!(count >= previous, "count decreased at {minutes} minutes");
            previous = count;
        }
    }

    #[test]
    fn quiz_config_pins_five_segments() {
        let cfg = SegmenterConfig::quiz();
        assert_eq!(cfg.target_segment_count(0.0), 5);
        assert_eq!(cfg.target_segment_count(36_000.0), 5);
    }

    #[test]
    fn segments_cover_transcript_exactly() {
        let input = transcript(&[0.0, 60.0, 120.0, 180.0, 240.0, 300.0, 360.0, 420.0, 480.0, 599.0]);
        for target in 1..=12 {
            let segments = split_into_segments(&input, target);
            let rejoined: Vec<f64> = segments
                .iter()
                .flat_map(|s| s.entries.iter().map(|e| e.start))
                .collect();
            let original: Vec<f64> = input.entries.iter().map(|e| e.start).collect();
            assert_eq!(rejoined, original, "coverage broken for target {target}");
            assert!(segments.iter().all(|s| !s.entries.is_empty()));
        }
    }

    #[test]
    fn segment_indices_and_starts_are_ordered() {
        let input = transcript(&[0.0, 60.0, 120.0, 180.0, 240.0, 300.0, 360.0, 420.0, 480.0, 599.0]);
        let segments = split_into_segments(&input, 6);
        for (i, segment) in segments.iter().enumerate() {
            assert_eq!(segment.index, i);
        }
        let first_starts: Vec<f64> = segments.iter().map(|s| s.span().0).collect();
        let mut sorted = first_starts.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(first_starts, sorted);
    }

    #[test]
    fn clustered_entries_skip_silent_rungs_without_empty_segments() {
        // Everything clusters at the start and the end; the middle rungs
        // hold no entries and must not produce empty segments.
        let input = transcript(&[0.0, 1.0, 2.0, 570.0, 580.0, 599.0]);
        let segments = split_into_segments(&input, 6);
        assert!(segments.iter().all(|s| !s.entries.is_empty()));
        let total_entries: usize = segments.iter().map(|s| s.entries.len()).sum();
        assert_eq!(total_entries, input.entries.len());
    }

    #[test]
    fn empty_transcript_yields_no_segments() {
        assert!(split_into_segments(&Transcript::default(), 5).is_empty());
    }

    #[test]
    fn single_entry_transcript_yields_single_segment() {
        let input = transcript(&[0.0]);
        let segments = split_into_segments(&input, 5);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].entries.len(), 1);
    }

    #[test]
    fn target_one_returns_whole_transcript() {
        let input = transcript(&[0.0, 100.0, 200.0, 300.0]);
        let segments = split_into_segments(&input, 1);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].entries.len(), 4);
    }
}
