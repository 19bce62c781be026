// Static command tables and the predicates the scanner cascades through.

const SAFE_PIPE_COMMANDS: &[&str] = &[
    "grep", "egrep", "fgrep", "awk", "gawk", "sed", "head", "tail", "wc", "sort", "uniq", "cut",
    "tr", "jq", "yq", "cat", "tee", "xargs", "column", "paste", "join",
];

const DESTRUCTIVE_DELETE_COMMANDS: &[&str] = &["rm", "rmdir"];

const NETWORK_COMMANDS: &[&str] =
    &["curl", "wget", "nc", "netcat", "ssh", "scp", "rsync", "ftp", "sftp"];

const PERMISSION_COMMANDS: &[&str] = &["chmod", "chown", "chgrp"];

const PACKAGE_INSTALL_COMMANDS: &[&str] = &[
    "apt", "apt-get", "brew", "npm", "yarn", "pnpm", "pip", "pip3", "go", "gem", "bundle",
];

/// Package managers that only install with an explicit `install` subcommand.
const INSTALL_SUBCOMMAND_MANAGERS: &[&str] = &["npm", "yarn", "pnpm", "pip", "pip3", "go"];

const ARCHIVE_COMMANDS: &[&str] = &["tar", "unzip", "gunzip", "untar"];

const DEV_TOOL_COMMANDS: &[&str] = &[
    "make", "cmake", "go", "npm", "yarn", "pnpm", "pytest", "jest", "mocha", "cargo", "rustc",
    "mvn", "gradle", "task",
];

const FILE_WRITE_COMMANDS: &[&str] = &["echo", "printf", "cat", "tee", "touch", "cp", "mv", "dd"];

/// Placeholder substituted for `{}` in a `find -exec` command.
pub const FIND_RESULT: &str = "FIND_RESULT";

fn first_is_install(args: &[String]) -> bool {
    args.first().is_some_and(|a| a == "install")
}

pub fn is_safe_pipe_command(cmd: &str) -> bool {
    SAFE_PIPE_COMMANDS.contains(&cmd)
}

/// `rm`/`rmdir` with a force flag, or any argument containing both `r` and `f`.
pub fn is_destructive_delete(cmd: &str, args: &[String]) -> bool {
    DESTRUCTIVE_DELETE_COMMANDS.contains(&cmd)
        && args
            .iter()
            .any(|a| (a.contains('r') && a.contains('f')) || a == "-f" || a == "--force")
}

pub fn is_network_command(cmd: &str) -> bool {
    NETWORK_COMMANDS.contains(&cmd)
}

pub fn is_permission_command(cmd: &str) -> bool {
    PERMISSION_COMMANDS.contains(&cmd)
}

pub fn is_package_install_command(cmd: &str, args: &[String]) -> bool {
    if !PACKAGE_INSTALL_COMMANDS.contains(&cmd) {
        return false;
    }
    !INSTALL_SUBCOMMAND_MANAGERS.contains(&cmd) || first_is_install(args)
}

/// `tar` with an extract flag (`-x`, `-xzf`, ...), or one of the
/// single-purpose extractors.
pub fn is_archive_extract(cmd: &str, args: &[String]) -> bool {
    match cmd {
        "tar" => args.iter().any(|a| a.starts_with('-') && a.contains('x')),
        _ => ARCHIVE_COMMANDS.contains(&cmd),
    }
}

/// Build and test tooling. Package managers stop counting once they install.
pub fn is_dev_tool(cmd: &str, args: &[String]) -> bool {
    if !DEV_TOOL_COMMANDS.contains(&cmd) {
        return false;
    }
    match cmd {
        "npm" | "yarn" | "pnpm" | "go" => !first_is_install(args),
        _ => true,
    }
}

/// Whether the command writes files and, when it can be told from the
/// arguments alone, which path it writes. `cp`/`mv` write their last
/// argument, `touch` its first; the rest write through redirects.
pub fn check_file_write(cmd: &str, args: &[String]) -> (bool, Option<String>) {
    if !FILE_WRITE_COMMANDS.contains(&cmd) {
        return (false, None);
    }
    let target = match cmd {
        "cp" | "mv" if args.len() > 1 => args.last().cloned(),
        "touch" => args.first().cloned(),
        _ => None,
    };
    (true, target)
}

pub fn is_python_command(cmd: &str) -> bool {
    matches!(cmd, "python" | "python3" | "python2")
        || cmd.starts_with("python3.")
        || cmd.starts_with("python2.")
}

pub fn is_find_command(cmd: &str) -> bool {
    cmd == "find"
}

/// The pieces of a `find` invocation that matter for safety.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindExec {
    /// Root of the search; empty when `find` has no arguments.
    pub search_path: String,
    /// The `-exec`/`-execdir` command with `{}` replaced by [`FIND_RESULT`].
    /// `None` when there is no `-exec` or it names no command.
    pub exec: Option<Vec<String>>,
}

pub fn extract_find_exec(args: &[String]) -> FindExec {
    let Some(first) = args.first() else {
        return FindExec::default();
    };
    let search_path = if first.starts_with('-') { ".".to_string() } else { first.clone() };

    let exec = args
        .iter()
        .position(|a| a == "-exec" || a == "-execdir")
        .map(|start| {
            args[start + 1..]
                .iter()
                .take_while(|a| !matches!(a.as_str(), ";" | "+" | "\\;"))
                .map(|a| if a == "{}" { FIND_RESULT.to_string() } else { a.clone() })
                .collect::<Vec<_>>()
        })
        .filter(|cmd| !cmd.is_empty());

    FindExec { search_path, exec }
}
