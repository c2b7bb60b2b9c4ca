use crate::env::Environment;
use crate::external;
use crate::interpreter::ExitCode;
use anyhow::{Result, anyhow};
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// The commands implemented inside the interpreter itself.
///
/// The set is closed and known at startup; every variant has a handler in
/// [`run`], and names outside the set fall through to external resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Echo,
    Exit,
    Type,
    Pwd,
    Cd,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "echo" => Some(Builtin::Echo),
            "exit" => Some(Builtin::Exit),
            "type" => Some(Builtin::Type),
            "pwd" => Some(Builtin::Pwd),
            "cd" => Some(Builtin::Cd),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Echo => "echo",
            Builtin::Exit => "exit",
            Builtin::Type => "type",
            Builtin::Pwd => "pwd",
            Builtin::Cd => "cd",
        }
    }
}

/// Execute a builtin in-process.
///
/// `out` is the command's stdout: either the interpreter's own stream or an
/// already-opened redirection target. Usage and runtime failures come back
/// as errors; the dispatcher prints them to the interpreter's stderr and
/// maps them to exit code 1.
pub fn run(
    builtin: Builtin,
    args: &[String],
    out: &mut dyn Write,
    env: &mut Environment,
) -> Result<ExitCode> {
    let argv: Vec<&str> = args.iter().map(String::as_str).collect();
    match builtin {
        // echo takes every argument as literal text (including ones that
        // look like options), so it skips argh entirely.
        Builtin::Echo => echo(&argv, out),
        Builtin::Exit => match parse::<Exit>("exit", &argv, out)? {
            Some(_) => exit(env),
            None => Ok(0),
        },
        Builtin::Type => match parse::<Type>("type", &argv, out)? {
            Some(cmd) => type_of(cmd, out, env),
            None => Ok(0),
        },
        Builtin::Pwd => match parse::<Pwd>("pwd", &argv, out)? {
            Some(_) => pwd(out, env),
            None => Ok(0),
        },
        Builtin::Cd => match parse::<Cd>("cd", &argv, out)? {
            Some(cmd) => cd(cmd, env),
            None => Ok(0),
        },
    }
}

// argh turns both `--help` and bad usage into EarlyExit; help text goes to
// the command's stdout (`None` result), usage problems become diagnostics.
fn parse<T: FromArgs>(name: &str, argv: &[&str], out: &mut dyn Write) -> Result<Option<T>> {
    match T::from_args(&[name], argv) {
        Ok(cmd) => Ok(Some(cmd)),
        Err(EarlyExit { output, status }) => {
            if status.is_err() {
                Err(anyhow!("{}", output.trim_end()))
            } else {
                writeln!(out, "{}", output.trim_end())?;
                Ok(None)
            }
        }
    }
}

fn echo(args: &[&str], out: &mut dyn Write) -> Result<ExitCode> {
    writeln!(out, "{}", args.join(" "))?;
    Ok(0)
}

#[derive(FromArgs)]
/// Leave the interpreter with status 0.
struct Exit {
    #[argh(positional, greedy)]
    /// ignored; accepted for compatibility with `exit <status>`.
    _args: Vec<String>,
}

fn exit(env: &mut Environment) -> Result<ExitCode> {
    env.should_exit = true;
    Ok(0)
}

#[derive(FromArgs)]
/// Report how a command name would be resolved.
struct Type {
    #[argh(positional)]
    /// command name to look up.
    name: Option<String>,
}

fn type_of(cmd: Type, out: &mut dyn Write, env: &Environment) -> Result<ExitCode> {
    let Some(name) = cmd.name else {
        return Err(anyhow!("type: missing operand"));
    };

    if Builtin::from_name(&name).is_some() {
        writeln!(out, "{name} is a shell builtin")?;
        Ok(0)
    } else if let Some(path) = external::find_command_path(env, &name) {
        writeln!(out, "{name} is {}", path.display())?;
        Ok(0)
    } else {
        writeln!(out, "{name}: not found")?;
        Ok(1)
    }
}

#[derive(FromArgs)]
/// Print the current working directory.
struct Pwd {}

fn pwd(out: &mut dyn Write, env: &Environment) -> Result<ExitCode> {
    writeln!(out, "{}", env.current_dir.display())?;
    Ok(0)
}

#[derive(FromArgs)]
/// Change the working directory.
struct Cd {
    #[argh(positional)]
    /// directory to switch to; `~` expands to $HOME, relative paths resolve
    /// against the current working directory.
    target: Option<String>,
}

fn cd(cmd: Cd, env: &mut Environment) -> Result<ExitCode> {
    let Some(target) = cmd.target.filter(|t| !t.is_empty()) else {
        return Err(anyhow!("cd: missing operand"));
    };

    let expanded = expand_tilde(&target, env)?;
    let candidate = if expanded.is_absolute() {
        expanded.clone()
    } else {
        env.current_dir.join(&expanded)
    };

    let resolved = fs::canonicalize(&candidate)
        .map_err(|e| anyhow!("cd: {}: {}", expanded.display(), describe_io(&e)))?;
    if !resolved.is_dir() {
        return Err(anyhow!("cd: {}: Not a directory", expanded.display()));
    }

    env.current_dir = resolved;
    Ok(0)
}

fn expand_tilde(target: &str, env: &Environment) -> Result<PathBuf> {
    if target == "~" || target.starts_with("~/") {
        let home = env.home_dir().ok_or_else(|| anyhow!("cd: HOME not set"))?;
        if target == "~" {
            Ok(home)
        } else {
            Ok(home.join(&target[2..]))
        }
    } else {
        Ok(PathBuf::from(target))
    }
}

fn describe_io(e: &std::io::Error) -> String {
    use std::io::ErrorKind;
    match e.kind() {
        ErrorKind::NotFound => "No such file or directory".to_string(),
        ErrorKind::PermissionDenied => "Permission denied".to_string(),
        ErrorKind::NotADirectory => "Not a directory".to_string(),
        _ => e.to_string(),
    }
}
