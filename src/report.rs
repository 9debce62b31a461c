//! User-facing failure reports.

use crate::error::GeneagrapherError;

const WRAP_WIDTH: usize = 79;

fn fill(text: &str) -> String {
    let options = textwrap::Options::new(WRAP_WIDTH)
        .wrap_algorithm(textwrap::WrapAlgorithm::FirstFit)
        .word_separator(textwrap::WordSeparator::AsciiSpace);
    textwrap::fill(text, options)
}

const ISSUE_NOTE: &str = "If this problem persists, please create an issue at \
https://github.com/davidalber/geneagrapher/issues/new, and include the following in \
the issue body:";

/// Format a failure as a wrapped message, an issue-filing note, and an
/// aligned key/value block (`Message`, `Command`, then `extras` in order).
pub fn format_report(message: &str, extras: &[(&str, String)], command: &str) -> String {
    let key_width = ["Message", "Command"]
        .iter()
        .copied()
        .chain(extras.iter().map(|(k, _)| *k))
        .map(str::len)
        .max()
        .unwrap_or(0)
        + 2;

    let mut lines = vec![
        fill(message),
        String::new(),
        fill(ISSUE_NOTE),
        String::new(),
    ];

    let rows = [("Message", message), ("Command", command)]
        .into_iter()
        .chain(extras.iter().map(|(k, v)| (*k, v.as_str())));
    for (key, value) in rows {
        let key = format!("{key}:");
        lines.push(format!("    {key:<key_width$}{value}"));
    }

    lines.join("\n")
}

/// Report for a crate error, attaching its diagnostic extras.
pub fn report_for_error(err: &GeneagrapherError, command: &str) -> String {
    format_report(&err.to_string(), &err.extras(), command)
}
