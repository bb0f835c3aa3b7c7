use std::path::{Path, PathBuf};

use thiserror::Error;

pub const HELP: &str = "\
Commands:
  pick <archive>...   choose archive files to convert
  output <dir>        choose the output directory
  convert             convert every chosen archive
  cancel              abort the running conversion
  dismiss             close the current report
  status              show the current state
  help                show this text
  quit                exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Pick(Vec<String>),
    Output(String),
    Convert,
    Cancel,
    Dismiss,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error("'{0}' takes a single path")]
    TooManyArguments(&'static str),
    #[error("cannot split arguments: {0}")]
    Quoting(String),
}

/// Parses one console line.
///
/// `pick` arguments are whitespace separated unless quoted. `output` takes the
/// rest of the line as one path, so directories with spaces need no quotes.
pub fn parse_command(line: &str) -> Result<ConsoleCommand, ParseError> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    if head.is_empty() {
        return Err(ParseError::Empty);
    }

    match head.to_ascii_lowercase().as_str() {
        "pick" | "open" => split_arguments(rest).map(ConsoleCommand::Pick),
        "output" | "out" => single_path(rest, "output").map(ConsoleCommand::Output),
        "convert" | "run" => Ok(ConsoleCommand::Convert),
        "cancel" | "abort" => Ok(ConsoleCommand::Cancel),
        "dismiss" | "ok" => Ok(ConsoleCommand::Dismiss),
        "status" => Ok(ConsoleCommand::Status),
        "help" | "?" => Ok(ConsoleCommand::Help),
        "quit" | "exit" | "q" => Ok(ConsoleCommand::Quit),
        other => Err(ParseError::Unknown(other.to_string())),
    }
}

const QUOTES: &[char] = &['"', '\''];

fn is_quoted(text: &str) -> bool {
    text.contains(QUOTES)
}

// Unquoted text is split on whitespace only, so backslashes in Windows paths survive.
fn split_arguments(rest: &str) -> Result<Vec<String>, ParseError> {
    if is_quoted(rest) {
        shell_words::split(rest).map_err(|err| ParseError::Quoting(err.to_string()))
    } else {
        Ok(rest.split_whitespace().map(ToOwned::to_owned).collect())
    }
}

fn single_path(rest: &str, command: &'static str) -> Result<String, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::MissingArgument(command));
    }
    if !rest.starts_with(QUOTES) {
        return Ok(rest.to_string());
    }
    let mut words = split_arguments(rest)?;
    match words.len() {
        0 => Err(ParseError::MissingArgument(command)),
        1 => Ok(words.remove(0)),
        _ => Err(ParseError::TooManyArguments(command)),
    }
}

/// Groups picked words into archive paths and keeps those whose extension
/// matches `extension` (case-insensitive), made absolute.
///
/// Words leading up to an archive name are joined with a space, so an unquoted
/// `/lib/My Parts.elibz` stays one path. A word with a root always starts a new
/// path. Returns `(accepted, rejected)`.
pub fn filter_archives(words: &[String], extension: &str) -> (Vec<String>, Vec<String>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    let mut pending: Option<String> = None;

    for word in words {
        if Path::new(word).has_root() {
            rejected.extend(pending.take());
        }
        let candidate = match pending.take() {
            Some(partial) => format!("{partial} {word}"),
            None => word.clone(),
        };
        let path = Path::new(&candidate);
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case(extension) => accepted.push(absolute(path)),
            Some(_) => rejected.push(candidate),
            None => pending = Some(candidate),
        }
    }
    rejected.extend(pending);
    (accepted, rejected)
}

pub fn absolute(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pick_with_many_paths() {
        assert_eq!(
            parse_command("pick /a/one.elibz  /a/two.elibz"),
            Ok(ConsoleCommand::Pick(vec![
                "/a/one.elibz".to_string(),
                "/a/two.elibz".to_string()
            ]))
        );
    }

    #[test]
    fn bare_pick_means_cancelled_picker() {
        assert_eq!(parse_command("pick"), Ok(ConsoleCommand::Pick(Vec::new())));
    }

    #[test]
    fn output_requires_directory() {
        assert_eq!(
            parse_command("output"),
            Err(ParseError::MissingArgument("output"))
        );
        assert_eq!(
            parse_command("OUTPUT /out"),
            Ok(ConsoleCommand::Output("/out".to_string()))
        );
    }

    #[test]
    fn simple_commands_and_aliases() {
        assert_eq!(parse_command("convert"), Ok(ConsoleCommand::Convert));
        assert_eq!(parse_command("  run "), Ok(ConsoleCommand::Convert));
        assert_eq!(parse_command("cancel"), Ok(ConsoleCommand::Cancel));
        assert_eq!(parse_command("dismiss"), Ok(ConsoleCommand::Dismiss));
        assert_eq!(parse_command("status"), Ok(ConsoleCommand::Status));
        assert_eq!(parse_command("?"), Ok(ConsoleCommand::Help));
        assert_eq!(parse_command("q"), Ok(ConsoleCommand::Quit));
    }

    #[test]
    fn output_keeps_spaces_in_directory() {
        assert_eq!(
            parse_command("output /home/me/KiCad Libs"),
            Ok(ConsoleCommand::Output("/home/me/KiCad Libs".to_string()))
        );
        assert_eq!(
            parse_command("out \"/home/me/KiCad Libs\""),
            Ok(ConsoleCommand::Output("/home/me/KiCad Libs".to_string()))
        );
        assert_eq!(
            parse_command("output '/a' '/b'"),
            Err(ParseError::TooManyArguments("output"))
        );
    }

    #[test]
    fn quoted_pick_arguments_stay_whole() {
        assert_eq!(
            parse_command("pick \"/lib/My Parts.elibz\" '/lib/Other Lib.elibz'"),
            Ok(ConsoleCommand::Pick(vec![
                "/lib/My Parts.elibz".to_string(),
                "/lib/Other Lib.elibz".to_string()
            ]))
        );
    }

    #[test]
    fn unbalanced_quote_is_an_error() {
        assert!(matches!(
            parse_command("pick \"/lib/My Parts.elibz"),
            Err(ParseError::Quoting(_))
        ));
    }

    #[test]
    fn rejects_blank_and_unknown() {
        assert_eq!(parse_command("   "), Err(ParseError::Empty));
        assert_eq!(
            parse_command("explode now"),
            Err(ParseError::Unknown("explode".to_string()))
        );
    }

    #[test]
    fn filter_keeps_matching_extension_in_order() {
        let paths = vec![
            "/a/two.ELIBZ".to_string(),
            "/a/readme.txt".to_string(),
            "/a/one.elibz".to_string(),
            "/a/noext".to_string(),
        ];

        let (accepted, rejected) = filter_archives(&paths, "elibz");

        assert_eq!(accepted, vec!["/a/two.ELIBZ", "/a/one.elibz"]);
        assert_eq!(rejected, vec!["/a/readme.txt", "/a/noext"]);
    }

    #[test]
    fn unquoted_words_join_into_one_archive_path() {
        let words: Vec<String> = [
            "/lib/My",
            "Parts.elibz",
            "/lib/b.elibz",
            "/lib/Loose",
            "Ends",
        ]
        .iter()
        .map(|w| w.to_string())
        .collect();

        let (accepted, rejected) = filter_archives(&words, "elibz");

        assert_eq!(accepted, vec!["/lib/My Parts.elibz", "/lib/b.elibz"]);
        assert_eq!(rejected, vec!["/lib/Loose Ends"]);
    }

    #[test]
    fn relative_paths_become_absolute() {
        let (accepted, _) = filter_archives(&["lib/part.elibz".to_string()], "elibz");

        assert!(Path::new(&accepted[0]).is_absolute());
        assert!(accepted[0].ends_with("part.elibz"));
    }
}
