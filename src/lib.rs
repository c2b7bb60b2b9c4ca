//! A tiny interactive command-line interpreter.
//!
//! This crate provides the building blocks of a minimal shell: a quote- and
//! escape-aware tokenizer, a redirection extractor, resolution of command
//! names to built-ins or executables on the search path, and a dispatcher
//! that runs built-ins in-process or spawns external programs with their
//! output streams wired to redirection targets.
//!
//! The main entry point is [`Interpreter`], which executes one line of input
//! at a time. The [`lexer`], [`parser`] and [`env`] modules expose the
//! individual stages for direct use.

pub mod builtin;
pub mod env;
pub mod external;
pub mod interpreter;
pub mod lexer;
pub mod parser;

pub use interpreter::{ExitCode, Interpreter, Resolved, ShellError};
