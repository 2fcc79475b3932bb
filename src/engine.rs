use std::any::Any;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::{Mutex, PoisonError};
use std::thread;

use log::debug;

use crate::error::{Error, Result};
use crate::highlight::{self, HighlightMode};
use crate::matcher::{MatchScratch, Matcher, MatcherOpts, Score};
use crate::mmode::MatchMode;
use crate::strings::{StringHandler, StringOpts};

/// Minimum number of bytes worth of candidates a worker pulls per locked
/// pass. Large enough to amortise contention on the source lock between
/// workers, small enough that a batch stays in L1 even with SMT.
pub const BATCH_SIZE_BYTES: usize = 8192;

/// A producer of candidate byte-strings.
///
/// `next` is only ever called with the engine's source lock held, so
/// implementations need not be thread-safe themselves. The item is both the
/// candidate's byte content and its handle: matched items are returned to the
/// caller verbatim, and rejected items are dropped while the source lock is
/// held, since hosts may tie handle release to the iterator's thread.
pub trait CandidateSource {
    type Item: AsRef<[u8]> + Send;

    /// Pull the next candidate, `None` at end of stream. An error stops the
    /// whole request and is surfaced to the caller verbatim.
    fn next(&mut self) -> anyhow::Result<Option<Self::Item>>;
}

/// Adapts an infallible iterator of byte-string items into a
/// [`CandidateSource`].
pub struct IterSource<I>(pub I);

impl<I, T> CandidateSource for IterSource<I>
where
    I: Iterator<Item = T>,
    T: AsRef<[u8]> + Send,
{
    type Item = T;

    fn next(&mut self) -> anyhow::Result<Option<T>> {
        Ok(self.0.next())
    }
}

/// Options for one matching request.
#[derive(Clone, Debug)]
pub struct SearchParams {
    /// Keep at most this many matches; 0 means unlimited.
    pub limit: usize,
    pub match_mode: MatchMode,
    pub highlight_mode: HighlightMode,
    /// Treat candidates as paths.
    pub is_path: bool,
    /// The user's currently focused file, for proximity scoring.
    pub cur_file: Option<Vec<u8>>,
    /// When false, `cur_file` itself never appears in the results.
    pub match_crfile: bool,
    /// Upper bound on worker threads; 0 picks the hardware concurrency.
    pub max_threads: usize,
    /// Split the query on this character and reverse the segments before
    /// matching.
    pub query_inverting_delimiter: Option<char>,
    /// Decode candidates and the query as UTF-8 instead of raw bytes.
    pub unicode: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            limit: 0,
            match_mode: MatchMode::default(),
            highlight_mode: HighlightMode::default(),
            is_path: false,
            cur_file: None,
            match_crfile: true,
            max_threads: 0,
            query_inverting_delimiter: None,
            unicode: false,
        }
    }
}

/// The outcome of a matching request: candidate handles in descending score
/// order, plus one highlight regex list for the host's highlighter.
#[derive(Debug)]
pub struct Matches<T> {
    pub items: Vec<T>,
    pub regexes: Vec<String>,
}

struct Scored<T> {
    score: Score,
    item: T,
}

impl<T: AsRef<[u8]>> Ord for Scored<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Score first; ties break on the candidate bytes ascending so the
        // total order is reproducible across runs and thread counts.
        self.score
            .cmp(&other.score)
            .then_with(|| other.item.as_ref().cmp(self.item.as_ref()))
    }
}

impl<T: AsRef<[u8]>> PartialOrd for Scored<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: AsRef<[u8]>> PartialEq for Scored<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: AsRef<[u8]>> Eq for Scored<T> {}

/// Run the full matching pipeline: pull candidates from `source` in batches,
/// score them across worker threads, merge the per-worker top-K sets, and
/// recover highlight positions for the final matches.
pub fn match_candidates<S>(source: S, query: &[u8], params: &SearchParams) -> Result<Matches<S::Item>>
where
    S: CandidateSource + Send,
{
    let query = match params.query_inverting_delimiter {
        Some(delimiter) => invert_query(query, delimiter),
        None => query.to_vec(),
    };
    let strings = StringHandler::new(StringOpts {
        unicode: params.unicode,
    });
    let matcher = Matcher::new(
        &query,
        MatcherOpts {
            cur_file: params.cur_file.clone(),
            is_path: params.is_path,
            match_crfile: params.match_crfile,
        },
        strings,
    );

    let workers = worker_count(params.max_threads);
    debug!("matching with {workers} worker(s), limit {}", params.limit);

    let shared = Mutex::new(SourceState {
        source,
        done: false,
        error: None,
    });
    let mut joined = Vec::with_capacity(workers);
    let mut panic_message: Option<String> = None;
    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| scope.spawn(|| worker_loop(&shared, &matcher, params.match_mode, params.limit)))
            .collect();
        for handle in handles {
            match handle.join() {
                Ok(matches) => joined.push(matches),
                // All workers are joined either way; the first panic message
                // is the one re-raised.
                Err(payload) => {
                    if panic_message.is_none() {
                        panic_message = Some(panic_text(payload));
                    }
                }
            }
        }
    });
    if let Some(message) = panic_message {
        return Err(Error::Worker(message));
    }
    let state = shared
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(err) = state.error {
        return Err(Error::Source(err));
    }

    let total: usize = joined.iter().map(Vec::len).sum();
    let mut all = Vec::with_capacity(total);
    for matches in joined {
        all.extend(matches);
    }
    sort_limit(&mut all, params.limit);
    debug!("kept {} of {total} matches", all.len());

    let mut regexes = Vec::new();
    if !params.highlight_mode.is_none() {
        let mut scratch = MatchScratch::default();
        let mut positions = Vec::new();
        let mut offsets = Vec::new();
        let mut ranges = Vec::new();
        for entry in &all {
            let item = entry.item.as_ref();
            let (base, view) = params.match_mode.view(item);
            if matcher
                .match_candidate(view, &mut scratch, Some(&mut positions))
                .is_none()
            {
                return Err(Error::HighlightRematch {
                    item: String::from_utf8_lossy(view).into_owned(),
                });
            }
            strings.byte_offsets(view, &mut offsets);
            ranges.clear();
            ranges.extend(
                positions
                    .iter()
                    .map(|&p| base + offsets[p]..base + offsets[p + 1]),
            );
            highlight::emit(params.highlight_mode, item, &ranges, &mut regexes);
        }
    }

    Ok(Matches {
        items: all.into_iter().map(|entry| entry.item).collect(),
        regexes,
    })
}

struct SourceState<S> {
    source: S,
    done: bool,
    error: Option<anyhow::Error>,
}

fn worker_loop<S: CandidateSource>(
    shared: &Mutex<SourceState<S>>,
    matcher: &Matcher,
    mode: MatchMode,
    limit: usize,
) -> Vec<Scored<S::Item>> {
    let mut heap = if limit > 0 {
        BinaryHeap::with_capacity(limit + 1)
    } else {
        BinaryHeap::new()
    };
    let mut batch: Vec<S::Item> = Vec::new();
    let mut unmatched: Vec<S::Item> = Vec::new();
    let mut scratch = MatchScratch::default();

    loop {
        {
            let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
            // Handles may only be dropped while the source lock is held; this
            // releases the previous batch's rejects and evictions.
            unmatched.clear();
            if state.done || state.error.is_some() {
                break;
            }
            let mut batch_bytes = 0;
            while batch_bytes < BATCH_SIZE_BYTES {
                match state.source.next() {
                    Ok(Some(item)) => {
                        batch_bytes += item.as_ref().len();
                        batch.push(item);
                    }
                    Ok(None) => {
                        state.done = true;
                        break;
                    }
                    Err(err) => {
                        state.error = Some(err);
                        batch.clear();
                        break;
                    }
                }
            }
        }
        if batch.is_empty() {
            break;
        }
        for item in batch.drain(..) {
            let (_, view) = mode.view(item.as_ref());
            match matcher.match_candidate(view, &mut scratch, None) {
                Some(score) => push_bounded(&mut heap, Scored { score, item }, limit, &mut unmatched),
                None => unmatched.push(item),
            }
        }
    }

    heap.into_iter().map(|Reverse(entry)| entry).collect()
}

/// Admit `entry` into a bounded worst-on-top heap, moving the displaced item
/// into `evicted` for release on the next locked pass.
fn push_bounded<T: AsRef<[u8]>>(
    heap: &mut BinaryHeap<Reverse<Scored<T>>>,
    entry: Scored<T>,
    limit: usize,
    evicted: &mut Vec<T>,
) {
    heap.push(Reverse(entry));
    if limit > 0 && heap.len() > limit {
        if let Some(Reverse(worst)) = heap.pop() {
            evicted.push(worst.item);
        }
    }
}

/// Reduce `all` to its best `limit` entries in descending order; `limit` 0
/// sorts everything.
fn sort_limit<T: AsRef<[u8]>>(all: &mut Vec<Scored<T>>, limit: usize) {
    let descending = |a: &Scored<T>, b: &Scored<T>| b.cmp(a);
    if limit > 0 && all.len() > limit {
        all.select_nth_unstable_by(limit - 1, descending);
        all.truncate(limit);
    }
    all.sort_unstable_by(descending);
}

/// Extract a human-readable message from a joined worker's panic payload.
fn panic_text(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_string(),
            Err(_) => "unknown panic".to_string(),
        },
    }
}

fn worker_count(max_threads: usize) -> usize {
    let hardware = num_cpus::get();
    let count = if max_threads > 0 {
        hardware.min(max_threads)
    } else {
        hardware
    };
    count.max(1)
}

/// Parse the host's query inverting delimiter option: empty selects none,
/// one character inverts, anything longer is a config error.
pub fn parse_inverting_delimiter(s: &str) -> Result<Option<char>> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(None),
        (Some(c), None) => Ok(Some(c)),
        _ => Err(Error::InvertingDelimiter),
    }
}

/// Split `query` on `delimiter` and re-join the segments in reverse order,
/// dropping the delimiter itself. Typing "name/dir" then matches "dir/name".
fn invert_query(query: &[u8], delimiter: char) -> Vec<u8> {
    let mut buf = [0u8; 4];
    let needle = delimiter.encode_utf8(&mut buf).as_bytes();
    let mut segments: Vec<&[u8]> = Vec::new();
    let mut rest = query;
    while let Some(pos) = rest.windows(needle.len()).position(|w| w == needle) {
        segments.push(&rest[..pos]);
        rest = &rest[pos + needle.len()..];
    }
    segments.push(rest);
    segments.into_iter().rev().flatten().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverting_delimiter_reverses_segments() {
        assert_eq!(invert_query(b"name|dir|sub", '|'), b"subdirname".to_vec());
        // Without the delimiter the query is unchanged.
        assert_eq!(invert_query(b"name", '|'), b"name".to_vec());
        assert_eq!(invert_query(b"", '|'), b"".to_vec());
    }

    #[test]
    fn inverting_delimiter_must_be_one_character() {
        assert_eq!(parse_inverting_delimiter("").unwrap(), None);
        assert_eq!(parse_inverting_delimiter(";").unwrap(), Some(';'));
        assert!(matches!(
            parse_inverting_delimiter(";;"),
            Err(Error::InvertingDelimiter)
        ));
    }

    #[test]
    fn worker_count_honours_the_bound() {
        assert_eq!(worker_count(1), 1);
        assert!(worker_count(0) >= 1);
        assert!(worker_count(2) <= 2);
    }

    #[test]
    fn sort_limit_keeps_the_best_in_order() {
        let strings = StringHandler::new(StringOpts::default());
        let opts = MatcherOpts {
            is_path: true,
            ..MatcherOpts::default()
        };
        let matcher = Matcher::new(b"ab", opts, strings);
        let mut scratch = MatchScratch::default();
        let mut all: Vec<Scored<&[u8]>> = [&b"xab"[..], &b"a_b"[..], &b"ab"[..]]
            .into_iter()
            .map(|item| Scored {
                score: matcher
                    .match_candidate(item, &mut scratch, None)
                    .expect("match"),
                item,
            })
            .collect();
        sort_limit(&mut all, 2);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].item, &b"ab"[..]);
        assert_eq!(all[1].item, &b"a_b"[..]);
    }
}
