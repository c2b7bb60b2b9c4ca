//! Locating and launching external executables.

use crate::env::Environment;
use crate::interpreter::ExitCode;
use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

/// Resolve a command name to an executable path the way a shell would.
///
/// Behavior:
/// - A name containing a path separator is checked directly: absolute paths
///   as-is, relative paths against the environment's working directory.
/// - A bare name is searched for in each search-path directory in order; the
///   first executable match wins.
/// - When `env.search_cwd_fallback` is set and the search-path walk found
///   nothing, the working directory is checked once more.
///
/// The result is computed fresh on every call: `cd` and filesystem changes
/// between commands must be observed.
pub fn find_command_path(env: &Environment, name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    if Path::new(name).components().count() > 1 {
        let candidate = if Path::new(name).is_absolute() {
            PathBuf::from(name)
        } else {
            env.current_dir.join(name)
        };
        return is_executable(&candidate).then_some(candidate);
    }

    for dir in env.search_paths() {
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }

    if env.search_cwd_fallback {
        let candidate = env.current_dir.join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }

    None
}

/// A regular file the current user may execute.
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Spawn a resolved executable and block until it exits.
///
/// `name` is what the user typed and becomes the child's argv[0]; `path` is
/// where the executable was found. Opened redirection targets are handed to
/// the child directly; an absent target means the stream is inherited. Stdin
/// is always inherited.
pub fn spawn_external(
    env: &Environment,
    name: &str,
    path: &Path,
    args: &[String],
    stdout: Option<File>,
    stderr: Option<File>,
) -> Result<ExitCode> {
    let mut cmd = std::process::Command::new(path);
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.arg0(name);
    }
    cmd.args(args)
        .env_clear()
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir)
        .stdout(stdout.map(Stdio::from).unwrap_or_else(Stdio::inherit))
        .stderr(stderr.map(Stdio::from).unwrap_or_else(Stdio::inherit));

    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn {}", path.display()))?;
    let exit_status = child.wait()?;

    match exit_status.code() {
        Some(code) => Ok(code),
        None => Ok(terminated_by_signal(exit_status)),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> ExitCode {
    -1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env as stdenv;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn make_tool(dir: &Path, name: &str, executable: bool) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        let mode = if executable { 0o755 } else { 0o644 };
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    fn env_with_path(dirs: &[&Path]) -> Environment {
        let mut env = Environment::new();
        let joined = stdenv::join_paths(dirs.iter()).unwrap();
        env.set_var("PATH", joined.to_string_lossy().to_string());
        env
    }

    #[test]
    #[cfg(unix)]
    fn bare_name_found_in_search_path() {
        let dir = TempDir::new().unwrap();
        let tool = make_tool(dir.path(), "mytool", true);

        let env = env_with_path(&[dir.path()]);
        assert_eq!(find_command_path(&env, "mytool"), Some(tool));
    }

    #[test]
    #[cfg(unix)]
    fn first_search_path_match_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let expected = make_tool(first.path(), "mytool", true);
        make_tool(second.path(), "mytool", true);

        let env = env_with_path(&[first.path(), second.path()]);
        assert_eq!(find_command_path(&env, "mytool"), Some(expected));
    }

    #[test]
    #[cfg(unix)]
    fn non_executable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        make_tool(dir.path(), "mytool", false);

        let env = env_with_path(&[dir.path()]);
        assert_eq!(find_command_path(&env, "mytool"), None);
    }

    #[test]
    #[cfg(unix)]
    fn name_with_separator_bypasses_search_path() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("bin")).unwrap();
        let tool = make_tool(&dir.path().join("bin"), "mytool", true);

        // PATH deliberately does not contain the tool
        let mut env = env_with_path(&[]);
        env.current_dir = dir.path().to_path_buf();

        assert_eq!(find_command_path(&env, "bin/mytool"), Some(tool.clone()));
        assert_eq!(
            find_command_path(&env, tool.to_str().unwrap()),
            Some(tool)
        );
    }

    #[test]
    #[cfg(unix)]
    fn cwd_fallback_is_off_by_default() {
        let dir = TempDir::new().unwrap();
        make_tool(dir.path(), "mytool", true);

        let mut env = env_with_path(&[]);
        env.current_dir = dir.path().to_path_buf();

        assert_eq!(find_command_path(&env, "mytool"), None);

        env.search_cwd_fallback = true;
        assert_eq!(
            find_command_path(&env, "mytool"),
            Some(dir.path().join("mytool"))
        );
    }

    #[test]
    fn empty_name_resolves_to_nothing() {
        let env = Environment::new();
        assert_eq!(find_command_path(&env, ""), None);
    }

    #[test]
    #[cfg(unix)]
    fn spawn_reports_child_exit_code() {
        let env = Environment::new();
        let args = vec!["-c".to_string(), "exit 7".to_string()];
        let code =
            spawn_external(&env, "sh", Path::new("/bin/sh"), &args, None, None).unwrap();
        assert_eq!(code, 7);
    }

    #[test]
    #[cfg(unix)]
    fn spawn_wires_stdout_to_file() {
        let dir = TempDir::new().unwrap();
        let out_path = dir.path().join("out.txt");
        let out = File::create(&out_path).unwrap();

        let env = Environment::new();
        let args = vec!["-c".to_string(), "printf hi".to_string()];
        let code =
            spawn_external(&env, "sh", Path::new("/bin/sh"), &args, Some(out), None).unwrap();

        assert_eq!(code, 0);
        assert_eq!(std::fs::read_to_string(&out_path).unwrap(), "hi");
    }

    #[test]
    #[cfg(unix)]
    fn spawn_failure_is_an_error() {
        let env = Environment::new();
        let res = spawn_external(
            &env,
            "nope",
            Path::new("/definitely/not/here"),
            &[],
            None,
            None,
        );
        assert!(res.is_err());
    }
}
