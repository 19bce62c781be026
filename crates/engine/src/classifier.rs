// Path classifier: decides whether writing to a path is safe.

use std::path::{Path, PathBuf};

use bash_scanner_core::{Config, PathClassification};

use crate::glob::glob_match;

const SYSTEM_PREFIXES: &[&str] = &[
    "/etc/", "/usr/", "/var/", "/bin/", "/sbin/", "/boot/", "/sys/", "/proc/", "/lib/", "/lib64/",
    "/opt/",
];

/// Classifies write targets relative to a working directory, the user's
/// home directory and the configured safe paths.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    cwd: String,
    home: Option<String>,
    safe_paths: Vec<String>,
}

impl PathClassifier {
    pub fn new(cwd: impl AsRef<Path>, config: Option<&Config>) -> Self {
        Self {
            cwd: path_string(cwd.as_ref()),
            home: dirs::home_dir().map(|h| path_string(&h)),
            safe_paths: config.map(|c| c.safe_paths.clone()).unwrap_or_default(),
        }
    }

    /// Override the home directory used for `~` and `$HOME`.
    pub fn with_home_dir(mut self, home: impl Into<PathBuf>) -> Self {
        let home = path_string(&home.into());
        self.home = (!home.is_empty()).then_some(home);
        self
    }

    pub fn classify_path(&self, path: &str) -> PathClassification {
        let verdict = |is_safe: bool, reason: String| PathClassification {
            path: path.to_string(),
            is_safe,
            reason,
        };

        if path.is_empty() {
            return verdict(true, "Empty path".into());
        }
        if path == "/dev/null" {
            return verdict(true, "Standard null device".into());
        }

        let resolved = self.resolve(path);

        if let Some(glob) = self.safe_paths.iter().find(|g| glob_match(g, &resolved)) {
            return verdict(true, format!("Matches configured safe path: {glob}"));
        }
        if is_within(&resolved, "/tmp") {
            return verdict(true, "Temporary directory".into());
        }
        // Checked on the original spelling, before cleaning removes it.
        if path.contains("..") {
            return verdict(false, "Parent directory traversal detected".into());
        }
        if let Some(prefix) = SYSTEM_PREFIXES
            .iter()
            .find(|p| resolved.starts_with(*p) || resolved == p.trim_end_matches('/'))
        {
            return verdict(false, format!("System directory: {prefix}"));
        }
        if let Some(home) = &self.home
            && is_within(&resolved, home)
            && !self.in_cwd(&resolved)
        {
            return verdict(false, "Home directory write outside CWD".into());
        }
        if !resolved.starts_with('/') {
            return verdict(true, "Relative path in current working directory".into());
        }
        if self.in_cwd(&resolved) {
            return verdict(true, "Within current working directory".into());
        }
        verdict(false, "Absolute path outside CWD and not in safe list".into())
    }

    /// Expand the `~`, `$HOME`, `$PWD` and `$(pwd)` aliases, then clean.
    fn resolve(&self, path: &str) -> String {
        let mut resolved = path.to_string();
        if let Some(home) = &self.home {
            resolved = resolved.replace("$HOME", home);
            if let Some(rest) = resolved.strip_prefix("~/") {
                resolved = format!("{home}/{rest}");
            } else if resolved == "~" {
                resolved = home.clone();
            }
        }
        if !self.cwd.is_empty() {
            resolved = resolved.replace("$(pwd)", &self.cwd).replace("$PWD", &self.cwd);
        }
        clean_path(&resolved)
    }

    fn in_cwd(&self, resolved: &str) -> bool {
        !self.cwd.is_empty() && is_within(resolved, &self.cwd)
    }
}

/// True if the path still contains something only known at run time:
/// a command substitution, a backtick, or a variable other than the
/// `$HOME`, `$PWD` and `$(pwd)` aliases.
pub fn is_dynamic_path(path: &str) -> bool {
    let stripped = path.replace("$(pwd)", "").replace("$HOME", "").replace("$PWD", "");
    stripped.contains('$') || stripped.contains('`')
}

fn is_within(path: &str, dir: &str) -> bool {
    path == dir || path.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Lexically clean a slash-separated path: collapse repeated separators,
/// drop `.` elements and resolve `..` against preceding elements.
/// A rooted `..` stays at the root; an empty result becomes `.`.
pub(crate) fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            _ => parts.push(part),
        }
    }
    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}
