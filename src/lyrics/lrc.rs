//! LRC time-tag parsing.
//!
//! Each physical line may carry zero, one, or several bracketed time tags:
//! [MM:SS] or [MM:SS.fff] with a 1-3 digit fraction. Every tag becomes one
//! output line; the line's text is whatever follows the last tag. Metadata
//! tags like [ti:Title] carry no timestamp and produce nothing.

use crate::lyrics::TimedLine;

/// Parse raw LRC text into timed lines sorted ascending by time.
/// Ties keep their input order (stable sort).
pub fn parse(content: &str) -> Vec<TimedLine> {
    let mut lines = Vec::new();

    for raw in content.lines() {
        let (tags, text_start) = scan_tags(raw);
        if tags.is_empty() {
            continue;
        }
        let text = raw[text_start..].trim().to_string();
        for time in tags {
            lines.push(TimedLine {
                time,
                text: text.clone(),
            });
        }
    }

    lines.sort_by(|a, b| a.time.total_cmp(&b.time));
    lines
}

/// Collect every valid time tag on the line, plus the byte offset just past
/// the last one, where the line's text begins.
fn scan_tags(line: &str) -> (Vec<f64>, usize) {
    let mut tags = Vec::new();
    let mut text_start = 0;
    let mut search = 0;

    while let Some(rel) = line[search..].find('[') {
        let open = search + rel;
        let Some(rel_close) = line[open..].find(']') else {
            break;
        };
        let close = open + rel_close;
        if let Some(secs) = parse_timestamp(&line[open + 1..close]) {
            tags.push(secs);
            text_start = close + 1;
            search = close + 1;
        } else {
            search = open + 1;
        }
    }

    (tags, text_start)
}

/// Parse "MM:SS" or "MM:SS.fff" into seconds. A 1-3 digit fraction is
/// right-padded to milliseconds, so ".5" means 500ms, not 5ms.
fn parse_timestamp(s: &str) -> Option<f64> {
    let (mins, rest) = s.split_once(':')?;
    let mins = parse_digits(mins)?;

    let (secs, millis) = match rest.split_once('.') {
        None => (parse_digits(rest)?, 0),
        Some((secs, frac)) => {
            if frac.is_empty() || frac.len() > 3 {
                return None;
            }
            let mut millis = parse_digits(frac)?;
            for _ in frac.len()..3 {
                millis *= 10;
            }
            (parse_digits(secs)?, millis)
        }
    };

    Some(f64::from(mins) * 60.0 + f64::from(secs) + f64::from(millis) / 1000.0)
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
