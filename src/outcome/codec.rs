//! Plain-text encoding and decoding of outcomes.
//!
//! Two line-oriented grammars share one document format:
//!
//! - Pass documents: zero or more `<name-path> = <Type>(<raw-value>)` lines.
//! - Fail documents: exactly one `FAIL = <Class>[|<Class>...]` line, where a
//!   class token may carry a parenthesized diagnostic message.
//!
//! Blank lines and lines starting with `#` are ignored in both grammars.
//! Which decoder applies is decided by context, never by sniffing adapter
//! output: expected-outcome files dispatch on the `PASS`/`FAIL` marker in
//! their filename (falling back to document content when a file carries
//! neither marker), adapter stdout dispatches on the process exit code.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{ErrorClass, Outcome, Value};

/// Errors raised while decoding an outcome document.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("error in line {line}: unexpected format for value line")]
    MalformedValueLine { line: usize },

    #[error("error in line {line}: duplicated name-path: {name_path}")]
    DuplicateNamePath { line: usize, name_path: String },

    #[error("error in line {line}: unexpected format for failure line")]
    MalformedFailLine { line: usize },

    #[error("error in line {line}: error classes already defined in a previous line")]
    SecondFailLine { line: usize },

    #[error("error in line {line}: invalid error class format: {token}")]
    MalformedErrorClass { line: usize, token: String },

    #[error("error in line {line}: unknown error class: {token}")]
    UnknownErrorClass { line: usize, token: String },

    #[error("error in line {line}: duplicated error class: {class}")]
    DuplicateErrorClass { line: usize, class: ErrorClass },

    #[error("the document contains no failure line")]
    MissingFailLine,

    #[error("failed to read outcome file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: io::Error,
    },
}

/// Decode a Pass document into an outcome.
pub fn decode_pass(text: &str) -> Result<Outcome, DecodeError> {
    let mut values: BTreeMap<String, Value> = BTreeMap::new();
    for (index, raw_line) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (name_path, value) =
            parse_value_line(trimmed).ok_or(DecodeError::MalformedValueLine { line })?;
        if values.contains_key(&name_path) {
            return Err(DecodeError::DuplicateNamePath { line, name_path });
        }
        values.insert(name_path, value);
    }
    Ok(Outcome::Pass { values })
}

/// Decode a Fail document into an outcome.
///
/// The class list must end up non-empty and duplicate-free; a second
/// failure line is an error even if it repeats the first.
pub fn decode_fail(text: &str) -> Result<Outcome, DecodeError> {
    let mut classes: Vec<ErrorClass> = Vec::new();
    let mut message: Option<String> = None;
    for (index, raw_line) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if !classes.is_empty() {
            return Err(DecodeError::SecondFailLine { line });
        }
        let class_list =
            strip_fail_prefix(trimmed).ok_or(DecodeError::MalformedFailLine { line })?;
        for token in class_list.split('|') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let (class_token, class_message) =
                split_class_token(token).ok_or_else(|| DecodeError::MalformedErrorClass {
                    line,
                    token: token.to_string(),
                })?;
            let class = class_token.parse::<ErrorClass>().map_err(|_| {
                DecodeError::UnknownErrorClass {
                    line,
                    token: class_token.to_string(),
                }
            })?;
            if classes.contains(&class) {
                return Err(DecodeError::DuplicateErrorClass { line, class });
            }
            classes.push(class);
            if let Some(note) = class_message {
                if !note.is_empty() {
                    message = Some(note.to_string());
                }
            }
        }
        if classes.is_empty() {
            return Err(DecodeError::MalformedFailLine { line });
        }
    }
    if classes.is_empty() {
        return Err(DecodeError::MissingFailLine);
    }
    Ok(Outcome::Fail { classes, message })
}

/// Load and decode an expected-outcome file.
///
/// Corpus filenames carry a `PASS` or `FAIL` marker in their stem, which
/// selects the decoder. A file with neither marker is dispatched on its
/// content: a first significant `FAIL =` line selects the fail decoder.
pub fn decode_outcome_file(path: &Path) -> Result<Outcome, DecodeError> {
    let text = fs::read_to_string(path).map_err(|source| DecodeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    if file_name.contains("PASS") {
        decode_pass(&text)
    } else if file_name.contains("FAIL") || looks_like_fail_document(&text) {
        decode_fail(&text)
    } else {
        decode_pass(&text)
    }
}

/// Encode an outcome in document form.
///
/// Pass values are emitted in lexicographically sorted name-path order so
/// the write path is deterministic.
pub fn encode(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Pass { values } => {
            let mut text = String::new();
            for (name_path, value) in values {
                text.push_str(name_path);
                text.push_str(" = ");
                text.push_str(&value.to_outcome_text());
                text.push('\n');
            }
            text
        }
        Outcome::Fail { classes, .. } => {
            let joined: Vec<&str> = classes.iter().map(ErrorClass::name).collect();
            format!("FAIL = {}\n", joined.join("|"))
        }
    }
}

/// Write an outcome document to disk.
pub fn write_outcome_file(outcome: &Outcome, path: &Path) -> io::Result<()> {
    fs::write(path, encode(outcome))
}

fn parse_value_line(line: &str) -> Option<(String, Value)> {
    let (name, rest) = line.split_once('=')?;
    let name = name.trim();
    let rest = rest.trim();
    if name.is_empty() {
        return None;
    }
    let open = rest.find('(')?;
    if !rest.ends_with(')') || rest.len() < open + 2 {
        return None;
    }
    let value_type = rest[..open].trim();
    if value_type.is_empty() || !is_word(value_type) {
        return None;
    }
    let raw = rest[open + 1..rest.len() - 1].trim();
    Some((name.to_string(), Value::new(value_type, raw)))
}

/// Match `FAIL = <rest>` case-insensitively and return `<rest>`.
fn strip_fail_prefix(line: &str) -> Option<&str> {
    let prefix = line.get(..4)?;
    if !prefix.eq_ignore_ascii_case("FAIL") {
        return None;
    }
    let rest = line[4..].trim_start();
    Some(rest.strip_prefix('=')?.trim())
}

/// Split `Class` or `Class(message)` into its parts.
fn split_class_token(token: &str) -> Option<(&str, Option<&str>)> {
    match token.find('(') {
        None => is_word(token).then_some((token, None)),
        Some(open) => {
            if !token.ends_with(')') || token.len() < open + 2 {
                return None;
            }
            let class_token = &token[..open];
            if class_token.is_empty() || !is_word(class_token) {
                return None;
            }
            let message = token[open + 1..token.len() - 1].trim();
            Some((class_token, Some(message)))
        }
    }
}

fn is_word(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn looks_like_fail_document(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .is_some_and(|line| strip_fail_prefix(line).is_some())
}
