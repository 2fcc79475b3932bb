mod cli;

use std::io::{self, BufRead, BufReader};

use anyhow::{Context, Result};
use fzp::{CandidateSource, SearchParams};

use cli::OutputFormat;

/// Streams lines from a reader as candidates, one handle per line.
struct LineSource<R> {
    reader: R,
}

impl<R: BufRead + Send> CandidateSource for LineSource<R> {
    type Item = String;

    fn next(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .context("reading candidates")?;
        if read == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = cli::parse_cli();

    let delimiter =
        fzp::parse_inverting_delimiter(args.inverting_delimiter.as_deref().unwrap_or(""))?;
    let params = SearchParams {
        limit: args.limit,
        match_mode: args.match_mode.into(),
        highlight_mode: args.highlight_mode.into(),
        is_path: args.is_path,
        cur_file: args.cur_file.as_ref().map(|path| path.clone().into_bytes()),
        match_crfile: !args.no_match_crfile,
        max_threads: args.max_threads,
        query_inverting_delimiter: delimiter,
        unicode: args.unicode,
    };

    let source = LineSource {
        reader: BufReader::new(io::stdin()),
    };
    let matches = fzp::match_candidates(source, args.query.as_bytes(), &params)?;

    match args.output {
        OutputFormat::Plain => cli::print_plain(&matches),
        OutputFormat::Json => cli::print_json(&matches)?,
    }

    Ok(())
}
