use crate::types::{FinalizedOutline, QuizQuestion, Segment, ShowNoteItem};

/// Format seconds as HH:MM:SS. Hours are always present, matching the
/// timestamps the show-notes prompt asks the model for.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

/// Render a segment the way the analysis prompts expect it:
/// `[<seconds>s] <text>` entries joined with spaces.
pub fn format_segment_text(segment: &Segment) -> String {
    segment
        .entries
        .iter()
        .map(|e| format!("[{}s] {}", e.start, e.text.trim()))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_outline_readable(outline: &FinalizedOutline) -> String {
    let mut output = String::new();
    output.push_str("## Chapters\n\n");

    for point in &outline.points {
        let start = format_timestamp(point.start);
        let end = format_timestamp(point.start + point.duration);
        output.push_str(&format!("### [{}–{}] {}\n\n", start, end, point.text));
        for bullet in &point.bullet_points {
            output.push_str(&format!("• {}\n", bullet));
        }
        if !point.bullet_points.is_empty() {
            output.push('\n');
        }
    }

    output
}

pub fn format_show_notes_readable(items: &[ShowNoteItem]) -> String {
    let mut output = String::new();
    output.push_str("## Show Notes\n\n");

    for item in items {
        output.push_str(&format!("### {} [{}]\n\n", item.name, item.timestamp));
        output.push_str(&format!("{}\n", item.context));
        match &item.url {
            Some(url) => output.push_str(&format!("{}\n\n", url)),
            None => output.push_str("No URL found\n\n"),
        }
    }

    output
}

pub fn format_quiz_readable(questions: &[QuizQuestion]) -> String {
    let mut output = String::new();
    output.push_str("## Quiz\n\n");

    for question in questions {
        output.push_str(&format!("{}. {}\n", question.id, question.question));
        for (i, option) in question.options.iter().enumerate() {
            let marker = if i == question.correct_answer { "*" } else { " " };
            output.push_str(&format!("   {}{}) {}\n", marker, (b'a' + i as u8) as char, option));
        }
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TranscriptEntry;

    #[test]
    fn timestamps_always_carry_hours() {
        assert_eq!(format_timestamp(0.0), "00:00:00");
        assert_eq!(format_timestamp(330.9), "00:05:30");
        assert_eq!(format_timestamp(5025.0), "01:23:45");
        assert_eq!(format_timestamp(-3.0), "00:00:00");
    }

    #[test]
    fn segment_text_interleaves_timestamps() {
        let segment = Segment {
            index: 0,
            entries: vec![
                TranscriptEntry {
                    start: 0.0,
                    duration: 2.0,
                    text: "hello there ".into(),
                },
                TranscriptEntry {
                    start: 2.5,
                    duration: 2.0,
                    text: "general topic".into(),
                },
            ],
        };
        assert_eq!(format_segment_text(&segment), "[0s] hello there [2.5s] general topic");
    }
}
