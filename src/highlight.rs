use std::fmt::Write;
use std::ops::Range;

use crate::error::{Error, Result};

/// How matched positions are turned into highlight regexes for the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HighlightMode {
    /// Emit nothing.
    #[default]
    None,
    /// One anchored regex per matched position.
    Basic,
    /// One combined regex with consecutive matched ranges as capture-group
    /// alternations.
    Detailed,
}

impl HighlightMode {
    /// Parse a host-supplied mode string. Both the empty string and `none`
    /// select [`HighlightMode::None`].
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "" | "none" => Ok(Self::None),
            "basic" => Ok(Self::Basic),
            "detailed" => Ok(Self::Detailed),
            other => Err(Error::UnknownHighlightMode(other.to_string())),
        }
    }

    #[must_use]
    pub fn is_none(self) -> bool {
        self == Self::None
    }
}

/// Append highlight regex source strings for one matched candidate to `out`.
///
/// `ranges` are the matched byte ranges within `item`, ascending and
/// non-overlapping; each range covers the original bytes of one matched code
/// point. The emitted sources target a byte-oriented regex engine: `\A`
/// anchors, `(?s-u)` lets `.` count raw bytes, and anything outside ASCII
/// alphanumerics is `\xHH`-escaped. Nothing is compiled here.
pub fn emit(mode: HighlightMode, item: &[u8], ranges: &[Range<usize>], out: &mut Vec<String>) {
    match mode {
        HighlightMode::None => {}
        HighlightMode::Basic => {
            for range in ranges {
                let mut regex = String::new();
                let _ = write!(regex, "(?s-u)\\A.{{{}}}", range.start);
                escape_bytes(&item[range.clone()], &mut regex);
                out.push(regex);
            }
        }
        HighlightMode::Detailed => {
            if ranges.is_empty() {
                return;
            }
            let mut regex = String::from("(?s-u)\\A(?:");
            for (i, run) in coalesce(ranges).enumerate() {
                if i > 0 {
                    regex.push('|');
                }
                let _ = write!(regex, ".{{{}}}(", run.start);
                escape_bytes(&item[run], &mut regex);
                regex.push(')');
            }
            regex.push(')');
            out.push(regex);
        }
    }
}

/// Merge adjacent byte ranges into maximal consecutive runs.
fn coalesce(ranges: &[Range<usize>]) -> impl Iterator<Item = Range<usize>> + '_ {
    let mut i = 0;
    std::iter::from_fn(move || {
        let first = ranges.get(i)?.clone();
        let mut end = first.end;
        i += 1;
        while ranges.get(i).is_some_and(|r| r.start == end) {
            end = ranges[i].end;
            i += 1;
        }
        Some(first.start..end)
    })
}

fn escape_bytes(bytes: &[u8], out: &mut String) {
    for &b in bytes {
        if b.is_ascii_alphanumeric() {
            out.push(b as char);
        } else {
            let _ = write!(out, "\\x{b:02X}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(positions: &[usize]) -> Vec<Range<usize>> {
        positions.iter().map(|&p| p..p + 1).collect()
    }

    #[test]
    fn parse_accepts_known_modes() {
        assert_eq!(HighlightMode::parse("").unwrap(), HighlightMode::None);
        assert_eq!(HighlightMode::parse("none").unwrap(), HighlightMode::None);
        assert_eq!(HighlightMode::parse("basic").unwrap(), HighlightMode::Basic);
        assert_eq!(HighlightMode::parse("detailed").unwrap(), HighlightMode::Detailed);
        assert!(matches!(
            HighlightMode::parse("fancy"),
            Err(Error::UnknownHighlightMode(_))
        ));
    }

    #[test]
    fn none_emits_nothing() {
        let mut out = Vec::new();
        emit(HighlightMode::None, b"foo", &ranges(&[0, 1]), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn basic_emits_one_anchored_regex_per_position() {
        let mut out = Vec::new();
        emit(HighlightMode::Basic, b"foo/bar", &ranges(&[4, 6]), &mut out);
        assert_eq!(out, vec!["(?s-u)\\A.{4}b", "(?s-u)\\A.{6}r"]);
    }

    #[test]
    fn detailed_combines_consecutive_ranges() {
        let mut out = Vec::new();
        emit(HighlightMode::Detailed, b"foo/bar", &ranges(&[0, 1, 4, 5, 6]), &mut out);
        assert_eq!(out, vec!["(?s-u)\\A(?:.{0}(fo)|.{4}(bar))"]);
    }

    #[test]
    fn non_alphanumeric_bytes_are_hex_escaped() {
        let mut out = Vec::new();
        emit(HighlightMode::Basic, b"a.b", &ranges(&[1]), &mut out);
        assert_eq!(out, vec!["(?s-u)\\A.{1}\\x2E"]);
    }

    #[test]
    fn multibyte_code_points_emit_their_original_bytes() {
        let item = "né".as_bytes();
        let mut out = Vec::new();
        emit(HighlightMode::Basic, item, &[1..3], &mut out);
        assert_eq!(out, vec!["(?s-u)\\A.{1}\\xC3\\xA9"]);
    }

    #[test]
    fn emitted_sources_match_only_at_the_recorded_positions() {
        let item = b"abc/abc";
        let positions = [4usize, 5, 6];
        let mut out = Vec::new();
        emit(HighlightMode::Basic, item, &ranges(&positions), &mut out);
        for (regex, &pos) in out.iter().zip(positions.iter()) {
            let re = regex::bytes::Regex::new(regex).expect("compile");
            let found = re.find(item).expect("match");
            // Anchoring pins the match to the recorded offset.
            assert_eq!(found.start(), 0);
            assert_eq!(found.end(), pos + 1);
            assert_eq!(re.find_iter(item).count(), 1);
        }

        let mut out = Vec::new();
        emit(HighlightMode::Detailed, item, &ranges(&positions), &mut out);
        let re = regex::bytes::Regex::new(&out[0]).expect("compile");
        let caps = re.captures(item).expect("match");
        let group = caps.get(1).expect("group");
        assert_eq!(group.start(), 4);
        assert_eq!(group.end(), 7);
    }
}
