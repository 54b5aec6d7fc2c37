//! Playback sync cursor.

use crate::lyrics::TimedLine;

/// Index of the line active at playback time `t`, or `None` before the
/// first cue.
///
/// Each instant maps to exactly one line over the half-open intervals
/// `[lines[i].time, lines[i+1].time)`; the last line holds until the end.
/// Pure and stateless: the host calls this on every time update. The scan
/// is O(n), which is fine for lyric-sized inputs.
pub fn active_line(lines: &[TimedLine], t: f64) -> Option<usize> {
    let mut active = None;
    for (i, line) in lines.iter().enumerate() {
        if line.time <= t {
            active = Some(i);
        } else {
            break;
        }
    }
    active
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(times: &[f64]) -> Vec<TimedLine> {
        times
            .iter()
            .map(|&time| TimedLine {
                time,
                text: format!("line at {time}"),
            })
            .collect()
    }

    #[test]
    fn boundaries_are_half_open() {
        let lines = lines(&[0.0, 10.0, 20.0]);
        assert_eq!(active_line(&lines, 9.9), Some(0));
        assert_eq!(active_line(&lines, 10.0), Some(1));
        assert_eq!(active_line(&lines, 19.999), Some(1));
        assert_eq!(active_line(&lines, 20.0), Some(2));
    }

    #[test]
    fn before_first_cue_nothing_is_active() {
        let lines = lines(&[5.0, 10.0]);
        assert_eq!(active_line(&lines, -1.0), None);
        assert_eq!(active_line(&lines, 4.999), None);
        assert_eq!(active_line(&lines, 5.0), Some(0));
    }

    #[test]
    fn last_line_holds_past_the_end() {
        let lines = lines(&[0.0, 10.0, 20.0]);
        assert_eq!(active_line(&lines, 3600.0), Some(2));
    }

    #[test]
    fn empty_lyrics_have_no_active_line() {
        assert_eq!(active_line(&[], 12.0), None);
    }

    #[test]
    fn ties_resolve_to_the_last_tied_line() {
        let lines = lines(&[0.0, 10.0, 10.0, 15.0]);
        assert_eq!(active_line(&lines, 10.0), Some(2));
        assert_eq!(active_line(&lines, 12.0), Some(2));
    }
}
