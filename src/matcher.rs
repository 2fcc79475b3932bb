use std::ops::Range;

use crate::paths;
use crate::strings::StringHandler;

/// Matching options captured once at matcher construction.
#[derive(Clone, Debug)]
pub struct MatcherOpts {
    /// The path of the user's currently focused file, used for proximity
    /// scoring and (optionally) for excluding itself from the results.
    pub cur_file: Option<Vec<u8>>,
    /// Treat candidates as paths: component-aware scoring, basename
    /// preference, and `cur_file` proximity.
    pub is_path: bool,
    /// When false, candidates whose content equals `cur_file` never match.
    pub match_crfile: bool,
}

impl Default for MatcherOpts {
    fn default() -> Self {
        Self {
            cur_file: None,
            is_path: false,
            match_crfile: true,
        }
    }
}

/// The relevance of a single match, compared lexicographically.
///
/// Components are stored so that the derived ordering ranks better matches
/// greater: counts that should be small are negated, and a match ending in
/// the basename pins the component rank to the maximum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score {
    word_prefix_len: u32,
    unmatched: i64,
    part: u64,
    proximity: i64,
    prefix: i64,
}

/// Per-worker scratch buffers reused across candidates.
#[derive(Default)]
pub struct MatchScratch {
    chars: Vec<char>,
    folded: Vec<char>,
    parts: Vec<Range<usize>>,
    positions: Vec<usize>,
}

struct QueryPart {
    /// Range of the component's content within the decoded query, excluding
    /// its trailing separator.
    content: Range<usize>,
    has_separator: bool,
}

/// Decides whether one candidate matches the prepared query and how well.
///
/// A matcher is built once per request and consulted read-only by every
/// worker; all mutable state lives in the caller's [`MatchScratch`].
pub struct Matcher {
    strings: StringHandler,
    query_chars: Vec<char>,
    query_folded: Vec<char>,
    case_sensitive: bool,
    is_path: bool,
    match_crfile: bool,
    cur_file: Option<Vec<u8>>,
    cur_file_parts: Vec<Vec<char>>,
    query_parts: Vec<QueryPart>,
}

impl Matcher {
    #[must_use]
    pub fn new(query: &[u8], opts: MatcherOpts, strings: StringHandler) -> Self {
        let mut query_chars = Vec::new();
        strings.decode(query, &mut query_chars);
        let mut query_folded = Vec::new();
        strings.fold_into(&query_chars, &mut query_folded);

        // Smart case: any uppercase in the query makes matching sensitive.
        let case_sensitive = query_chars.iter().any(|c| c.is_uppercase());

        let mut query_parts = Vec::new();
        if opts.is_path && query_chars.contains(&paths::SEPARATOR) {
            let mut ranges = Vec::new();
            paths::component_ranges(&query_chars, &mut ranges);
            for range in ranges {
                let has_separator = query_chars[range.end - 1] == paths::SEPARATOR;
                let content = range.start..range.end - usize::from(has_separator);
                query_parts.push(QueryPart {
                    content,
                    has_separator,
                });
            }
        }

        let cur_file_parts = match &opts.cur_file {
            Some(cur) if opts.is_path => {
                let mut chars = Vec::new();
                strings.decode(cur, &mut chars);
                paths::components_of(&chars)
            }
            _ => Vec::new(),
        };

        Self {
            strings,
            query_chars,
            query_folded,
            case_sensitive,
            is_path: opts.is_path,
            match_crfile: opts.match_crfile,
            cur_file: opts.cur_file,
            cur_file_parts,
            query_parts,
        }
    }

    /// Test `view` against the query. Returns the score on a match, and
    /// records the matched code-point positions into `positions_out` when
    /// requested.
    pub fn match_candidate(
        &self,
        view: &[u8],
        scratch: &mut MatchScratch,
        positions_out: Option<&mut Vec<usize>>,
    ) -> Option<Score> {
        if !self.match_crfile && self.cur_file.as_deref() == Some(view) {
            return None;
        }

        let MatchScratch {
            chars,
            folded,
            parts,
            positions,
        } = scratch;

        self.strings.decode(view, chars);
        let hay: &[char] = if self.case_sensitive {
            chars
        } else {
            self.strings.fold_into(chars, folded);
            folded
        };

        if self.is_path {
            paths::component_ranges(chars, parts);
        } else {
            parts.clear();
            if !chars.is_empty() {
                parts.push(0..chars.len());
            }
        }

        positions.clear();
        let needle: &[char] = if self.case_sensitive {
            &self.query_chars
        } else {
            &self.query_folded
        };
        let matched = if !self.is_path {
            scan_forward(hay, needle, positions)
        } else if self.query_parts.is_empty() {
            // Right-to-left so the match lands in the basename whenever the
            // candidate admits it.
            let ok = scan_backward(hay, 0, hay.len(), needle, positions);
            positions.reverse();
            ok
        } else {
            let ok = self.scan_parts(hay, needle, parts, positions);
            positions.reverse();
            ok
        };
        if !matched {
            return None;
        }

        let score = self.score_of(chars, parts, positions);
        if let Some(out) = positions_out {
            out.clear();
            out.extend_from_slice(positions);
        }
        Some(score)
    }

    /// Match a path-structured query: query components are assigned to
    /// candidate components strictly right-to-left, each matching entirely
    /// inside its component. A query component with a trailing separator
    /// additionally claims the component's own separator position.
    fn scan_parts(
        &self,
        hay: &[char],
        needle: &[char],
        parts: &[Range<usize>],
        positions: &mut Vec<usize>,
    ) -> bool {
        let mut upper = parts.len();
        for part in self.query_parts.iter().rev() {
            let content = &needle[part.content.clone()];
            let mut assigned = false;
            for c in (0..upper).rev() {
                let comp = &parts[c];
                let comp_has_sep = hay[comp.end - 1] == paths::SEPARATOR;
                if part.has_separator && !comp_has_sep {
                    continue;
                }
                let content_end = comp.end - usize::from(comp_has_sep);
                let mark = positions.len();
                if part.has_separator {
                    positions.push(comp.end - 1);
                }
                if scan_backward(hay, comp.start, content_end, content, positions) {
                    upper = c;
                    assigned = true;
                    break;
                }
                positions.truncate(mark);
            }
            if !assigned {
                return false;
            }
        }
        true
    }

    fn score_of(&self, chars: &[char], parts: &[Range<usize>], positions: &[usize]) -> Score {
        let mut word_prefix_len = 0u32;
        for (i, &p) in positions.iter().enumerate() {
            let contiguous = i > 0 && p == positions[i - 1] + 1;
            if contiguous || is_word_start(chars, parts, p) {
                word_prefix_len += 1;
            } else {
                break;
            }
        }

        let (unmatched, part, prefix) = match (positions.first(), positions.last()) {
            (Some(&first), Some(&last)) => {
                let span = last - first + 1;
                let unmatched = -((span - positions.len()) as i64);
                let index_from_end = parts.len() - 1 - part_containing(parts, last);
                let part = if index_from_end == 0 {
                    u64::MAX
                } else {
                    index_from_end as u64
                };
                let first_part = &parts[part_containing(parts, first)];
                let prefix = -((first - first_part.start) as i64);
                (unmatched, part, prefix)
            }
            // An empty query matches everything and ties on all match-derived
            // components; ordering falls to proximity and the byte tiebreak.
            _ => (0, u64::MAX, 0),
        };

        let proximity = if self.is_path && !self.cur_file_parts.is_empty() {
            let dist = paths::distance(
                parts.iter().map(|r| &chars[r.clone()]),
                self.cur_file_parts.iter().map(|p| p.as_slice()),
            );
            -(dist as i64)
        } else {
            0
        };

        Score {
            word_prefix_len,
            unmatched,
            part,
            proximity,
            prefix,
        }
    }
}

/// Left-to-right greedy subsequence scan.
fn scan_forward(hay: &[char], needle: &[char], positions: &mut Vec<usize>) -> bool {
    let mut from = 0;
    for &q in needle {
        let Some(found) = hay[from..].iter().position(|&c| c == q) else {
            return false;
        };
        positions.push(from + found);
        from += found + 1;
    }
    true
}

/// Right-to-left greedy subsequence scan over `hay[start..end]`, pushing the
/// matched positions in descending order.
fn scan_backward(
    hay: &[char],
    start: usize,
    end: usize,
    needle: &[char],
    positions: &mut Vec<usize>,
) -> bool {
    let mut until = end;
    for &q in needle.iter().rev() {
        let Some(found) = hay[start..until].iter().rposition(|&c| c == q) else {
            return false;
        };
        positions.push(start + found);
        until = start + found;
    }
    true
}

/// Index of the component range containing `pos`.
fn part_containing(parts: &[Range<usize>], pos: usize) -> usize {
    parts.partition_point(|r| r.end <= pos)
}

/// A word starts at a component boundary, after a non-alphanumeric, at a
/// letter following a digit, or at an uppercase following a lowercase.
fn is_word_start(chars: &[char], parts: &[Range<usize>], pos: usize) -> bool {
    if pos == 0 || parts[part_containing(parts, pos)].start == pos {
        return true;
    }
    let prev = chars[pos - 1];
    let cur = chars[pos];
    if !prev.is_alphanumeric() {
        return true;
    }
    (cur.is_alphabetic() && prev.is_numeric()) || (cur.is_uppercase() && prev.is_lowercase())
}
