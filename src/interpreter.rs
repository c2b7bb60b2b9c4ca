use crate::builtin::{self, Builtin};
use crate::env::Environment;
use crate::external;
use crate::lexer::{self, LexError};
use crate::parser::{self, ParseError, Redirect, RedirectMode, RedirectPlan};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure,
/// mirroring POSIX shell conventions.
pub type ExitCode = i32;

/// What the first argument token resolved to. Computed fresh per command:
/// `cd` and filesystem changes between invocations must be observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Builtin(Builtin),
    External(PathBuf),
    NotFound,
}

/// Errors that abort a single command line. None of them terminate the read
/// loop; the driver prints them to standard error and prompts again.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("{0}: command not found")]
    CommandNotFound(String),
    #[error("{path}: {source}")]
    RedirectTarget {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A minimal shell-like interpreter executing one command line at a time.
///
/// Each line goes through tokenization, redirection extraction, command
/// resolution and execution, after which the interpreter is back to idle;
/// nothing is retained between lines except the [`Environment`].
pub struct Interpreter {
    env: Environment,
}

impl Interpreter {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Whether the `exit` builtin has been executed.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Execute one line of input and return its exit code.
    ///
    /// Parse failures, unknown commands and unopenable redirection targets
    /// come back as [`ShellError`]; in all of those cases nothing has been
    /// executed. Builtin diagnostics and child failure notices are printed
    /// to the interpreter's stderr here, and the command's exit code is
    /// returned.
    pub fn run_line(&mut self, line: &str) -> Result<ExitCode, ShellError> {
        let tokens = lexer::split_into_tokens(line)?;
        if tokens.is_empty() {
            return Ok(0);
        }

        let parsed = parser::extract_redirects(tokens)?;
        if parsed.argv.is_empty() {
            // A redirection with no command still creates its targets.
            let _targets = open_targets(&parsed.redirects)?;
            return Ok(0);
        }

        let name = parsed.argv[0].clone();
        let args = &parsed.argv[1..];

        match self.resolve(&name) {
            Resolved::Builtin(b) => self.run_builtin(b, args, &parsed.redirects),
            Resolved::External(path) => self.run_external(&name, &path, args, &parsed.redirects),
            Resolved::NotFound => Err(ShellError::CommandNotFound(name)),
        }
    }

    /// Map a command name to a builtin, an executable path, or nothing.
    pub fn resolve(&self, name: &str) -> Resolved {
        if let Some(builtin) = Builtin::from_name(name) {
            return Resolved::Builtin(builtin);
        }
        match external::find_command_path(&self.env, name) {
            Some(path) => Resolved::External(path),
            None => Resolved::NotFound,
        }
    }

    fn run_builtin(
        &mut self,
        builtin: Builtin,
        args: &[String],
        redirects: &RedirectPlan,
    ) -> Result<ExitCode, ShellError> {
        // Both targets are opened up front: a redirected stderr file is
        // created/truncated even though builtins write no error bytes to it.
        let targets = open_targets(redirects)?;

        let mut out: Box<dyn Write> = match targets.stdout {
            Some(file) => Box::new(file),
            None => Box::new(std::io::stdout()),
        };

        let code = match builtin::run(builtin, args, &mut *out, &mut self.env) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("{e}");
                1
            }
        };
        let _ = out.flush();
        Ok(code)
    }

    fn run_external(
        &mut self,
        name: &str,
        path: &Path,
        args: &[String],
        redirects: &RedirectPlan,
    ) -> Result<ExitCode, ShellError> {
        let stderr_redirected = redirects.stderr.is_some();
        let targets = open_targets(redirects)?;

        match external::spawn_external(&self.env, name, path, args, targets.stdout, targets.stderr)
        {
            Ok(code) => {
                // A command that redirected its own stderr swallows the
                // failure notice along with the rest of its error output.
                if code != 0 && !stderr_redirected {
                    eprintln!("{name}: exit status {code}");
                }
                Ok(code)
            }
            Err(_) => Err(ShellError::CommandNotFound(name.to_string())),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Environment::new())
    }
}

/// Redirection targets opened for the duration of one command. Dropping the
/// struct closes the files on every path out of `run_line`.
struct OpenTargets {
    stdout: Option<File>,
    stderr: Option<File>,
}

fn open_targets(plan: &RedirectPlan) -> Result<OpenTargets, ShellError> {
    Ok(OpenTargets {
        stdout: open_target(plan.stdout.as_ref())?,
        stderr: open_target(plan.stderr.as_ref())?,
    })
}

fn open_target(redirect: Option<&Redirect>) -> Result<Option<File>, ShellError> {
    let Some(redirect) = redirect else {
        return Ok(None);
    };

    let mut options = OpenOptions::new();
    options.write(true).create(true);
    match redirect.mode {
        RedirectMode::Truncate => options.truncate(true),
        RedirectMode::Append => options.append(true),
    };

    options
        .open(&redirect.target)
        .map(Some)
        .map_err(|source| ShellError::RedirectTarget {
            path: redirect.target.display().to_string(),
            source,
        })
}
