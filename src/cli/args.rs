use clap::{
    builder::{
        styling::{AnsiColor, Effects},
        Styles,
    },
    ColorChoice, Parser, ValueEnum,
};

use fzp::{HighlightMode, MatchMode};

/// Create the clap styles used for coloured help output.
fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
        .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Yellow.on_default())
}

/// Parse command line arguments into the strongly typed [`CliArgs`]
/// structure.
pub(crate) fn parse_cli() -> CliArgs {
    CliArgs::parse()
}

#[derive(Parser, Debug)]
#[command(
    name = "fzp",
    version,
    about = "Path-aware fuzzy matcher over stdin candidates",
    color = ColorChoice::Auto,
    styles = cli_styles()
)]
/// Command-line arguments accepted by the `fzp` binary.
pub(crate) struct CliArgs {
    /// The query to match candidates against.
    pub(crate) query: String,
    #[arg(
        short,
        long,
        value_name = "N",
        default_value_t = 0,
        help = "Keep at most N matches (default: unlimited)"
    )]
    pub(crate) limit: usize,
    #[arg(
        long = "mmode",
        value_enum,
        default_value_t,
        help = "Substring of each candidate that participates in matching"
    )]
    pub(crate) match_mode: MatchModeArg,
    #[arg(
        long = "highlight-mode",
        value_enum,
        default_value_t,
        help = "Highlight regexes to emit for the matches"
    )]
    pub(crate) highlight_mode: HighlightModeArg,
    #[arg(long = "ispath", help = "Treat candidates as paths")]
    pub(crate) is_path: bool,
    #[arg(
        long = "crfile",
        value_name = "PATH",
        help = "Currently focused file, boosts nearby paths"
    )]
    pub(crate) cur_file: Option<String>,
    #[arg(
        long = "no-match-crfile",
        help = "Never return the current file itself as a match"
    )]
    pub(crate) no_match_crfile: bool,
    #[arg(
        long,
        value_name = "N",
        default_value_t = 0,
        help = "Upper bound on worker threads (default: hardware concurrency)"
    )]
    pub(crate) max_threads: usize,
    #[arg(
        long = "inverting-delimiter",
        value_name = "CHAR",
        help = "Split the query on CHAR and reverse the segments"
    )]
    pub(crate) inverting_delimiter: Option<String>,
    #[arg(long, help = "Decode candidates and the query as UTF-8")]
    pub(crate) unicode: bool,
    #[arg(
        short,
        long,
        value_enum,
        default_value_t,
        help = "Output format for the matches"
    )]
    pub(crate) output: OutputFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum MatchModeArg {
    #[default]
    FullLine,
    FilenameOnly,
    FirstNonTab,
    UntilLastTab,
}

impl From<MatchModeArg> for MatchMode {
    fn from(mode: MatchModeArg) -> Self {
        match mode {
            MatchModeArg::FullLine => Self::FullLine,
            MatchModeArg::FilenameOnly => Self::FilenameOnly,
            MatchModeArg::FirstNonTab => Self::FirstNonTab,
            MatchModeArg::UntilLastTab => Self::UntilLastTab,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum HighlightModeArg {
    #[default]
    None,
    Basic,
    Detailed,
}

impl From<HighlightModeArg> for HighlightMode {
    fn from(mode: HighlightModeArg) -> Self {
        match mode {
            HighlightModeArg::None => Self::None,
            HighlightModeArg::Basic => Self::Basic,
            HighlightModeArg::Detailed => Self::Detailed,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Plain,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_unlimited_full_line_plain() {
        let args = CliArgs::parse_from(["fzp", "query"]);
        assert_eq!(args.query, "query");
        assert_eq!(args.limit, 0);
        assert_eq!(args.match_mode, MatchModeArg::FullLine);
        assert_eq!(args.highlight_mode, HighlightModeArg::None);
        assert_eq!(args.output, OutputFormat::Plain);
        assert!(!args.is_path);
        assert!(!args.no_match_crfile);
    }

    #[test]
    fn host_style_flags_parse() {
        let args = CliArgs::parse_from([
            "fzp",
            "bar",
            "--ispath",
            "--mmode",
            "filename-only",
            "--crfile",
            "src/lib.rs",
            "--no-match-crfile",
            "--highlight-mode",
            "detailed",
            "--limit",
            "10",
        ]);
        assert_eq!(args.match_mode, MatchModeArg::FilenameOnly);
        assert_eq!(args.highlight_mode, HighlightModeArg::Detailed);
        assert_eq!(args.cur_file.as_deref(), Some("src/lib.rs"));
        assert!(args.no_match_crfile);
        assert_eq!(args.limit, 10);
    }
}
