//! store::batch
//!
//! Line-oriented batch set/delete.
//!
//! Each line is one path, words separated by whitespace. Single quotes
//! group words (`'a b'`); inside quotes `\'` and `\\` escape. Blank lines
//! and lines starting with `#` are skipped.
//!
//! A failing line is recorded and processing continues unless
//! `stop_on_error` is set. The report lists every failure with its line
//! number.

use std::fmt;

use thiserror::Error;

use super::{Store, StoreError};
use crate::core::path::{quote, PathArgs};

/// Errors from parsing a batch line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A single quote was opened and never closed.
    #[error("unterminated quote")]
    UnterminatedQuote,
}

/// Which operation every line of a batch performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOp {
    Set,
    Delete,
}

impl fmt::Display for BatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOp::Set => write!(f, "Set"),
            BatchOp::Delete => write!(f, "Delete"),
        }
    }
}

/// One failed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// 1-based line number.
    pub line_no: usize,
    /// The path as written (re-quoted).
    pub path: String,
    /// Diagnostic.
    pub error: String,
}

/// Aggregate outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Lines applied successfully.
    pub applied: usize,
    /// Lines that failed, in order.
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    /// True if any line failed.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Split a line into words.
///
/// Returns `Ok(None)` for blank lines and comments.
///
/// # Example
///
/// ```
/// use cstore::store::batch::parse_line;
///
/// let words = parse_line("interfaces ethernet eth0 description 'uplink to core'").unwrap();
/// assert_eq!(words.unwrap().last().unwrap(), "uplink to core");
/// assert_eq!(parse_line("# comment").unwrap(), None);
/// ```
pub fn parse_line(line: &str) -> Result<Option<Vec<String>>, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = trimmed.chars();
    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped @ ('\'' | '\\')) => word.push(escaped),
                            Some(other) => {
                                word.push('\\');
                                word.push(other);
                            }
                            None => return Err(ParseError::UnterminatedQuote),
                        },
                        Some(other) => word.push(other),
                        None => return Err(ParseError::UnterminatedQuote),
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            other => {
                in_word = true;
                word.push(other);
            }
        }
    }
    if in_word {
        words.push(word);
    }
    Ok(Some(words))
}

/// Apply `op` to every path in `input`.
pub fn run_batch(store: &mut Store, op: BatchOp, input: &str, stop_on_error: bool) -> BatchReport {
    let mut report = BatchReport::default();
    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let words = match parse_line(line) {
            Ok(Some(words)) => words,
            Ok(None) => continue,
            Err(e) => {
                record(&mut report, op, line_no, line.trim().to_string(), e.to_string());
                if stop_on_error {
                    break;
                }
                continue;
            }
        };

        let result = PathArgs::new(&words)
            .map_err(StoreError::from)
            .and_then(|args| match op {
                BatchOp::Set => store.set(args),
                BatchOp::Delete => store.delete(args),
            });

        match result {
            Ok(()) => report.applied += 1,
            Err(e) => {
                let shown = words.iter().map(|w| quote(w)).collect::<Vec<_>>().join(" ");
                record(&mut report, op, line_no, shown, e.to_string());
                if stop_on_error {
                    break;
                }
            }
        }
    }
    report
}

fn record(report: &mut BatchReport, op: BatchOp, line_no: usize, path: String, error: String) {
    tracing::warn!(line = line_no, %op, path = %path, error = %error, "batch line failed");
    report.failures.push(BatchFailure {
        line_no,
        path,
        error,
    });
}
