use anyhow::Result;
use fzp::Matches;
use serde_json::json;

/// Print matched candidates one per line, best first.
pub(crate) fn print_plain(matches: &Matches<String>) {
    for item in &matches.items {
        println!("{item}");
    }
}

/// Format the matches and their highlight regexes as a JSON string.
pub(crate) fn format_matches_json(matches: &Matches<String>) -> Result<String> {
    let payload = json!({
        "matches": matches.items,
        "regexes": matches.regexes,
    });
    Ok(serde_json::to_string_pretty(&payload)?)
}

/// Print the JSON representation of the matches.
pub(crate) fn print_json(matches: &Matches<String>) -> Result<()> {
    println!("{}", format_matches_json(matches)?);
    Ok(())
}
