//! Path-aware fuzzy matching: a scoring engine plus a parallel batched
//! driver, built to answer per-keystroke queries over large candidate
//! streams.

pub mod engine;
pub mod error;
pub mod highlight;
pub mod matcher;
pub mod mmode;
pub mod paths;
pub mod strings;

pub use engine::{
    match_candidates, parse_inverting_delimiter, CandidateSource, IterSource, Matches,
    SearchParams, BATCH_SIZE_BYTES,
};
pub use error::{Error, Result};
pub use highlight::HighlightMode;
pub use matcher::{MatchScratch, Matcher, MatcherOpts, Score};
pub use mmode::MatchMode;
pub use strings::{StringHandler, StringOpts};
