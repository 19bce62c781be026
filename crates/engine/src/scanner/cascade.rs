// Command rules: the ordered checks every simple command runs through.

use bash_scanner_core::{Config, Violation};

use crate::classifier::{PathClassifier, is_dynamic_path};
use crate::rules::{
    check_file_write, extract_find_exec, is_archive_extract, is_destructive_delete, is_dev_tool,
    is_find_command, is_network_command, is_package_install_command, is_permission_command,
    is_python_command, is_safe_pipe_command,
};

const NETWORK_ADVICE: &str =
    "Network operations require review. Ensure the endpoint is trusted and necessary.";
const INSTALL_ADVICE: &str =
    "Package installation modifies the system. Verify this is intentional and required.";
const DELETE_ADVICE: &str = "Ensure you're operating in the correct directory. Consider using 'rm' without -f flag and verify the path.";
const PERMISSION_ADVICE: &str =
    "Permission changes on system files are dangerous. Ensure you have the correct path.";
const WRITE_ADVICE: &str =
    "Avoid writing to system directories. Use paths within your project or /tmp instead.";

/// A simple command with its words flattened.
#[derive(Debug, Clone)]
pub(super) struct Call {
    pub name: String,
    pub args: Vec<String>,
}

/// One observation about a command.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Finding {
    Safe(String),
    Violation(Violation),
}

/// Outcome of a rule inspecting a command.
pub(super) enum RuleOutcome {
    /// This rule decides the command; later rules are skipped.
    Verdict(Vec<Finding>),
    /// This rule doesn't apply; try the next one.
    Continue,
}

pub(super) struct RuleContext<'a> {
    pub config: &'a Config,
    pub classifier: &'a PathClassifier,
}

/// Rules run in order; the first `Verdict` wins.
pub(super) trait CommandRule {
    fn check(&self, ctx: &RuleContext, call: &Call) -> RuleOutcome;
}

pub(super) const CASCADE: &[&dyn CommandRule] = &[
    &Whitelisted,
    &Python,
    &Find,
    &SafePipe,
    &DevTool,
    &Network,
    &PackageInstall,
    &DestructiveDelete,
    &Permission,
    &ArchiveExtract,
    &FileWrite,
    &Fallback,
];

fn safe(note: impl Into<String>) -> RuleOutcome {
    RuleOutcome::Verdict(vec![Finding::Safe(note.into())])
}

fn violation(message: String, command: &str, path: &str, recommendation: &str) -> Finding {
    Finding::Violation(Violation {
        message,
        command: command.to_string(),
        path: path.to_string(),
        recommendation: recommendation.to_string(),
    })
}

/// Classify a write target. Shared by redirects and file-writing commands.
pub(super) fn classify_write(classifier: &PathClassifier, command: &str, path: &str) -> Finding {
    let class = classifier.classify_path(path);
    if class.is_safe {
        let unresolved = if is_dynamic_path(path) { "; unresolved" } else { "" };
        Finding::Safe(format!("write to {path} ({}{unresolved})", class.reason))
    } else {
        violation(
            format!("File write to unsafe location: {path} ({})", class.reason),
            command,
            path,
            WRITE_ADVICE,
        )
    }
}

struct Whitelisted;

impl CommandRule for Whitelisted {
    fn check(&self, ctx: &RuleContext, call: &Call) -> RuleOutcome {
        let full = if call.args.is_empty() {
            call.name.clone()
        } else {
            format!("{} {}", call.name, call.args.join(" "))
        };
        let listed = ctx
            .config
            .whitelisted_commands
            .iter()
            .any(|w| *w == call.name || *w == full);
        if listed {
            safe(format!("{} (whitelisted)", call.name))
        } else {
            RuleOutcome::Continue
        }
    }
}

struct Python;

impl CommandRule for Python {
    fn check(&self, _ctx: &RuleContext, call: &Call) -> RuleOutcome {
        // Script contents are not inspected.
        if is_python_command(&call.name) {
            safe(format!("{} (python - not analyzed)", call.name))
        } else {
            RuleOutcome::Continue
        }
    }
}

struct Find;

impl CommandRule for Find {
    fn check(&self, ctx: &RuleContext, call: &Call) -> RuleOutcome {
        if !is_find_command(&call.name) {
            return RuleOutcome::Continue;
        }
        let find = extract_find_exec(&call.args);
        let Some((exec_name, exec_args)) = find.exec.as_deref().and_then(|e| e.split_first())
        else {
            return safe("find (no -exec)");
        };

        let root = &find.search_path;
        let root_safe = ctx.classifier.classify_path(root).is_safe;
        let flag = |what: String| {
            RuleOutcome::Verdict(vec![violation(
                format!("In find -exec from {root}: {what} will execute on multiple files"),
                &call.name,
                root,
                "",
            )])
        };

        if is_destructive_delete(exec_name, exec_args) {
            if root_safe {
                return safe(format!("find -exec {exec_name} (safe path)"));
            }
            return flag(format!("Destructive delete command '{exec_name}'"));
        }
        if is_permission_command(exec_name) {
            if root_safe {
                return RuleOutcome::Verdict(vec![]);
            }
            return flag(format!("Permission change command '{exec_name}'"));
        }
        if is_network_command(exec_name) {
            return flag(format!("Network operation '{exec_name}'"));
        }
        if is_safe_pipe_command(exec_name) || is_dev_tool(exec_name, exec_args) {
            return safe(format!("find -exec {exec_name} (safe operation)"));
        }
        safe(format!("find -exec {exec_name} (from {root})"))
    }
}

struct SafePipe;

impl CommandRule for SafePipe {
    fn check(&self, _ctx: &RuleContext, call: &Call) -> RuleOutcome {
        if is_safe_pipe_command(&call.name) {
            safe(format!("{} (safe pipe)", call.name))
        } else {
            RuleOutcome::Continue
        }
    }
}

struct DevTool;

impl CommandRule for DevTool {
    fn check(&self, _ctx: &RuleContext, call: &Call) -> RuleOutcome {
        if is_dev_tool(&call.name, &call.args) {
            safe(format!("{} (dev tool)", call.name))
        } else {
            RuleOutcome::Continue
        }
    }
}

struct Network;

impl CommandRule for Network {
    fn check(&self, _ctx: &RuleContext, call: &Call) -> RuleOutcome {
        if !is_network_command(&call.name) {
            return RuleOutcome::Continue;
        }
        RuleOutcome::Verdict(vec![violation(
            "Network operation detected".into(),
            &call.name,
            "",
            NETWORK_ADVICE,
        )])
    }
}

struct PackageInstall;

impl CommandRule for PackageInstall {
    fn check(&self, _ctx: &RuleContext, call: &Call) -> RuleOutcome {
        if !is_package_install_command(&call.name, &call.args) {
            return RuleOutcome::Continue;
        }
        RuleOutcome::Verdict(vec![violation(
            "Package installation detected".into(),
            &call.name,
            "",
            INSTALL_ADVICE,
        )])
    }
}

struct DestructiveDelete;

impl CommandRule for DestructiveDelete {
    fn check(&self, ctx: &RuleContext, call: &Call) -> RuleOutcome {
        if !is_destructive_delete(&call.name, &call.args) {
            return RuleOutcome::Continue;
        }
        let findings = call
            .args
            .iter()
            .filter(|a| !a.starts_with('-'))
            .map(|path| {
                let class = ctx.classifier.classify_path(path);
                if class.is_safe {
                    Finding::Safe(format!("delete {path} (safe path)"))
                } else {
                    violation(
                        format!("Destructive delete targeting: {path} ({})", class.reason),
                        &call.name,
                        path,
                        DELETE_ADVICE,
                    )
                }
            })
            .collect();
        RuleOutcome::Verdict(findings)
    }
}

struct Permission;

impl CommandRule for Permission {
    fn check(&self, ctx: &RuleContext, call: &Call) -> RuleOutcome {
        if !is_permission_command(&call.name) {
            return RuleOutcome::Continue;
        }
        let Some(path) = call.args.last() else {
            return RuleOutcome::Verdict(vec![]);
        };
        let class = ctx.classifier.classify_path(path);
        if class.is_safe {
            return RuleOutcome::Verdict(vec![]);
        }
        RuleOutcome::Verdict(vec![violation(
            format!("Permission change on: {path} ({})", class.reason),
            &call.name,
            path,
            PERMISSION_ADVICE,
        )])
    }
}

struct ArchiveExtract;

impl CommandRule for ArchiveExtract {
    fn check(&self, ctx: &RuleContext, call: &Call) -> RuleOutcome {
        if !is_archive_extract(&call.name, &call.args) {
            return RuleOutcome::Continue;
        }
        let target = call
            .args
            .iter()
            .position(|a| a == "-C")
            .and_then(|i| call.args.get(i + 1))
            .filter(|t| !t.is_empty());
        let Some(target) = target else {
            return RuleOutcome::Verdict(vec![]);
        };
        let class = ctx.classifier.classify_path(target);
        if class.is_safe {
            return RuleOutcome::Verdict(vec![]);
        }
        RuleOutcome::Verdict(vec![violation(
            format!("Archive extraction to unsafe location: {target} ({})", class.reason),
            &call.name,
            target,
            "",
        )])
    }
}

struct FileWrite;

impl CommandRule for FileWrite {
    fn check(&self, ctx: &RuleContext, call: &Call) -> RuleOutcome {
        match check_file_write(&call.name, &call.args) {
            (true, Some(path)) if !path.is_empty() => {
                RuleOutcome::Verdict(vec![classify_write(ctx.classifier, &call.name, &path)])
            }
            _ => RuleOutcome::Continue,
        }
    }
}

/// Unrecognised commands are noted, not flagged.
struct Fallback;

impl CommandRule for Fallback {
    fn check(&self, _ctx: &RuleContext, call: &Call) -> RuleOutcome {
        safe(call.name.clone())
    }
}
