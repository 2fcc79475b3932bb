use crate::error::{Error, Result};
use crate::paths;

/// Selects which substring of each candidate participates in matching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// The whole candidate.
    #[default]
    FullLine,
    /// The candidate's basename only.
    FilenameOnly,
    /// The candidate up to the first tab.
    FirstNonTab,
    /// The candidate up to the last tab.
    UntilLastTab,
}

impl MatchMode {
    /// Parse a host-supplied mode string. The empty string selects
    /// [`MatchMode::FullLine`].
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "" | "full-line" => Ok(Self::FullLine),
            "filename-only" => Ok(Self::FilenameOnly),
            "first-non-tab" => Ok(Self::FirstNonTab),
            "until-last-tab" => Ok(Self::UntilLastTab),
            other => Err(Error::UnknownMatchMode(other.to_string())),
        }
    }

    /// Returns the view of `item` that participates in matching, along with
    /// the byte offset of the view within `item`. Highlight positions are
    /// re-based by that offset.
    #[must_use]
    pub fn view(self, item: &[u8]) -> (usize, &[u8]) {
        match self {
            Self::FullLine => (0, item),
            Self::FilenameOnly => {
                let base = paths::basename(item);
                (item.len() - base.len(), base)
            }
            Self::FirstNonTab => match item.iter().position(|&b| b == b'\t') {
                Some(pos) => (0, &item[..pos]),
                None => (0, item),
            },
            Self::UntilLastTab => match item.iter().rposition(|&b| b == b'\t') {
                Some(pos) => (0, &item[..pos]),
                None => (0, item),
            },
        }
    }
}
