use crate::types::{FinalizedOutline, FinalizedOutlinePoint, OutlinePoint};

/// Turn per-segment outline points into the final duration-annotated
/// outline. Points are sorted by start first since the model does not
/// guarantee ordering; each point's duration runs to the next point's
/// start, and the last one runs to `transcript_end`. Negative durations
/// (a start past the transcript end, or duplicate starts fed bad data)
/// are clamped to zero and reported as a data-quality warning.
pub fn finalize_outline(mut points: Vec<OutlinePoint>, transcript_end: f64) -> FinalizedOutline {
    points.sort_by(|a, b| a.start.total_cmp(&b.start));

    let starts: Vec<f64> = points.iter().map(|p| p.start).collect();
    let finalized = points
        .into_iter()
        .enumerate()
        .map(|(i, point)| {
            let raw = match starts.get(i + 1) {
                Some(next_start) => next_start - point.start,
                None => transcript_end - point.start,
            };
            let duration = if raw < 0.0 {
                tracing::warn!(
                    start = point.start,
                    computed = raw,
                    "negative chapter duration clamped to zero"
                );
                0.0
            } else {
                raw
            };
            FinalizedOutlinePoint {
                text: point.text,
                start: point.start,
                duration,
                bullet_points: point.bullet_points,
                entities: point.entities,
            }
        })
        .collect();

    FinalizedOutline { points: finalized }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn point(start: f64) -> OutlinePoint {
        OutlinePoint {
            text: format!("chapter at {start}"),
            start,
            bullet_points: Vec::new(),
            entities: Vec::new(),
        }
    }

    #[test]
    fn durations_run_to_the_next_start() {
        let outline = finalize_outline(vec![point(0.0), point(120.0), point(300.0)], 400.0);
        let durations: Vec<f64> = outline.points.iter().map(|p| p.duration).collect();
        assert_eq!(durations, vec![120.0, 180.0, 100.0]);
    }

    #[test]
    fn durations_partition_the_covered_range() {
        let outline = finalize_outline(
            vec![point(12.5), point(80.0), point(200.25), point(340.0)],
            512.0,
        );
        let total: f64 = outline.points.iter().map(|p| p.duration).sum();
        assert_relative_eq!(total, 512.0 - 12.5);

        // No two [start, start + duration) ranges overlap.
        for pair in outline.points.windows(2) {
            assert!(pair[0].start + pair[0].duration <= pair[1].start + 1e-9);
        }
    }

    #[test]
    fn unsorted_input_is_sorted_before_finalizing() {
        let outline = finalize_outline(vec![point(300.0), point(0.0), point(120.0)], 400.0);
        let starts: Vec<f64> = outline.points.iter().map(|p| p.start).collect();
        assert_eq!(starts, vec![0.0, 120.0, 300.0]);
        let durations: Vec<f64> = outline.points.iter().map(|p| p.duration).collect();
        assert_eq!(durations, vec![120.0, 180.0, 100.0]);
    }

    #[test]
    fn start_past_transcript_end_clamps_to_zero_duration() {
        let outline = finalize_outline(vec![point(0.0), point(450.0)], 400.0);
        assert_eq!(outline.points[1].duration, 0.0);
        // The earlier point is unaffected.
        assert_eq!(outline.points[0].duration, 450.0);
    }

    #[test]
    fn empty_input_finalizes_to_empty_outline() {
        assert!(finalize_outline(Vec::new(), 100.0).points.is_empty());
    }

    #[test]
    fn single_point_runs_to_transcript_end() {
        let outline = finalize_outline(vec![point(30.0)], 400.0);
        assert_eq!(outline.points[0].duration, 370.0);
    }
}
