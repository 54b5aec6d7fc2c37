//! Uniform timing synthesis for lyrics with no timestamps.

use crate::lyrics::TimedLine;

/// Spread untimed lines evenly across the track duration:
/// `time[i] = i * duration / line_count`. Blank lines are dropped first.
///
/// This is a pacing approximation, not synchronization; callers label the
/// result as plain-sourced so the UI can say so.
pub fn synthesize(text: &str, duration_secs: f64) -> Vec<TimedLine> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if lines.is_empty() {
        return Vec::new();
    }

    let per_line = duration_secs / lines.len() as f64;
    lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| TimedLine {
            time: i as f64 * per_line,
            text: text.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_lines_over_ninety_seconds() {
        let lines = synthesize("one\ntwo\nthree", 90.0);
        let times: Vec<f64> = lines.iter().map(|l| l.time).collect();
        assert_eq!(times, vec![0.0, 30.0, 60.0]);
        assert_eq!(lines[2].text, "three");
    }

    #[test]
    fn blank_lines_are_dropped() {
        let lines = synthesize("one\n\n  \ntwo", 60.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].time, 30.0);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(synthesize("", 180.0).is_empty());
        assert!(synthesize("\n\n", 180.0).is_empty());
    }
}
