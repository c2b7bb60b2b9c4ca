use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Mutable, user-level view of the process environment used by the interpreter.
///
/// The environment contains:
/// - `vars`: a map of environment variables visible to executed commands.
/// - `current_dir`: the working directory for command execution. This is the
///   only working directory the crate consults; the real process working
///   directory is never changed, so `cd`/`pwd` stay testable in-process.
/// - `should_exit`: set by the `exit` builtin (and by end-of-input in the
///   read loop) to tell the loop to terminate.
/// - `search_cwd_fallback`: when true, a bare command name that matched no
///   search-path directory is looked up once more in `current_dir`. Off by
///   default, matching POSIX `PATH` semantics.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub should_exit: bool,
    pub search_cwd_fallback: bool,
}

impl Environment {
    /// Capture the current process state into a new `Environment`.
    ///
    /// Copies variables from `std::env::vars()` and initializes `current_dir`
    /// from `std::env::current_dir()`.
    pub fn new() -> Self {
        let mut vars = HashMap::new();
        for (k, v) in stdenv::vars() {
            vars.insert(k, v);
        }
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
            search_cwd_fallback: false,
        }
    }

    /// Get the value of an environment variable.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    /// Set or override an environment variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// The ordered list of directories consulted to resolve a bare command
    /// name. Empty when `PATH` is unset.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        match self.get_var("PATH") {
            Some(path) => stdenv::split_paths(&path).collect(),
            None => Vec::new(),
        }
    }

    /// The user's home directory, used for `~` expansion in `cd`.
    pub fn home_dir(&self) -> Option<PathBuf> {
        self.get_var("HOME").map(PathBuf::from)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_var() {
        let mut env = Environment::new();
        env.vars.clear();

        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");
        assert_eq!(env.get_var("KEY"), Some("VALUE".to_string()));
    }

    #[test]
    fn captures_process_env() {
        let env = Environment::new();
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn search_paths_follow_path_order() {
        let mut env = Environment::new();
        let joined = stdenv::join_paths(["/usr/local/bin", "/usr/bin", "/bin"]).unwrap();
        env.set_var("PATH", joined.to_string_lossy().to_string());

        assert_eq!(
            env.search_paths(),
            vec![
                PathBuf::from("/usr/local/bin"),
                PathBuf::from("/usr/bin"),
                PathBuf::from("/bin"),
            ]
        );
    }

    #[test]
    fn search_paths_empty_without_path_var() {
        let mut env = Environment::new();
        env.vars.remove("PATH");
        assert!(env.search_paths().is_empty());
    }

    #[test]
    fn home_dir_reads_home_var() {
        let mut env = Environment::new();
        env.set_var("HOME", "/home/someone");
        assert_eq!(env.home_dir(), Some(PathBuf::from("/home/someone")));
    }
}
