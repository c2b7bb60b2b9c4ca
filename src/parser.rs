//! Parsing stage: separating redirection operators from command arguments.

use crate::lexer::Token;
use std::path::PathBuf;
use thiserror::Error;

/// Write mode for a redirection target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    /// `>` / `1>` / `2>`: create the file if needed and truncate it.
    Truncate,
    /// `>>` / `1>>` / `2>>`: create the file if needed and append to it.
    Append,
}

/// One resolved redirection: where a stream goes and how the file is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: PathBuf,
    pub mode: RedirectMode,
}

/// Per-command mapping of output streams to file targets.
///
/// An absent entry means the stream is inherited from the interpreter. At
/// most one target exists per stream: when a command names the same stream
/// twice, the later operator replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectPlan {
    pub stdout: Option<Redirect>,
    pub stderr: Option<Redirect>,
}

impl RedirectPlan {
    pub fn is_empty(&self) -> bool {
        self.stdout.is_none() && self.stderr.is_none()
    }
}

/// A token list with the redirections pulled out: the clean argument vector
/// plus the plan for wiring the command's output streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub argv: Vec<String>,
    pub redirects: RedirectPlan,
}

/// Errors that can occur while extracting redirections.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A redirection operator was the last token on the line.
    #[error("syntax error: missing file operand after `{0}`")]
    MissingRedirectTarget(String),
}

enum Stream {
    Stdout,
    Stderr,
}

// Operators are recognized only as standalone unquoted tokens; a quoted or
// escaped `>` is data.
fn as_operator(token: &Token) -> Option<(Stream, RedirectMode)> {
    if token.quoted {
        return None;
    }
    match token.text.as_str() {
        ">" | "1>" => Some((Stream::Stdout, RedirectMode::Truncate)),
        ">>" | "1>>" => Some((Stream::Stdout, RedirectMode::Append)),
        "2>" => Some((Stream::Stderr, RedirectMode::Truncate)),
        "2>>" => Some((Stream::Stderr, RedirectMode::Append)),
        _ => None,
    }
}

/// Scan a token list left to right, removing every redirection operator
/// together with its file operand and keeping the remaining tokens in order.
pub fn extract_redirects(tokens: Vec<Token>) -> Result<ParsedCommand, ParseError> {
    let mut argv = Vec::new();
    let mut plan = RedirectPlan::default();

    let mut iter = tokens.into_iter();
    while let Some(token) = iter.next() {
        match as_operator(&token) {
            Some((stream, mode)) => {
                let operand = iter
                    .next()
                    .ok_or(ParseError::MissingRedirectTarget(token.text))?;
                let redirect = Redirect {
                    target: PathBuf::from(operand.text),
                    mode,
                };
                match stream {
                    Stream::Stdout => plan.stdout = Some(redirect),
                    Stream::Stderr => plan.stderr = Some(redirect),
                }
            }
            None => argv.push(token.text),
        }
    }

    Ok(ParsedCommand {
        argv,
        redirects: plan,
    })
}
