// Core domain types for file operations, scan verdicts, config and categories.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What a command does to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Create,
    Modify,
    Delete,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Create => write!(f, "create"),
            OperationType::Modify => write!(f, "modify"),
            OperationType::Delete => write!(f, "delete"),
        }
    }
}

/// A single path-affecting argument or redirect target.
///
/// Field names serialize in PascalCase (`Path`, `HasGlob`, ...), the shape
/// existing `scan --json` consumers read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileOperation {
    pub path: String,
    pub operation: OperationType,
    /// Command that produced the operation, or `>` / `>>` for redirects.
    pub command: String,
    /// 1-based source line.
    pub line: usize,
    pub has_glob: bool,
    pub has_var: bool,
}

/// Everything `analyze` extracts from a script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnalysisResult {
    pub operations: Vec<FileOperation>,
    /// Every invoked command flattened to one string, e.g. `go build ./...`.
    pub commands: Vec<String>,
    /// `cd` targets and absolute-path arguments outside `/dev/`.
    pub referenced_paths: Vec<String>,
}

impl AnalysisResult {
    pub fn created(&self) -> Vec<&FileOperation> {
        self.filter_by_op(OperationType::Create)
    }

    pub fn modified(&self) -> Vec<&FileOperation> {
        self.filter_by_op(OperationType::Modify)
    }

    pub fn deleted(&self) -> Vec<&FileOperation> {
        self.filter_by_op(OperationType::Delete)
    }

    /// Distinct operation paths in first-occurrence order.
    pub fn paths(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.operations
            .iter()
            .map(|op| op.path.as_str())
            .filter(|p| seen.insert(*p))
            .collect()
    }

    fn filter_by_op(&self, op: OperationType) -> Vec<&FileOperation> {
        self.operations.iter().filter(|o| o.operation == op).collect()
    }
}

/// Verdict for a single path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathClassification {
    pub path: String,
    pub is_safe: bool,
    pub reason: String,
}

/// One detected issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub message: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub recommendation: String,
}

/// Result of scanning one command string.
///
/// `allowed` is true exactly when there are no violations and no parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<FileOperation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safe_operations: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parse_error: String,
}

/// Safety configuration read from `.bash-scanner.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Glob patterns of paths that are always safe to write.
    #[serde(default)]
    pub safe_paths: Vec<String>,
    /// Command names or full `cmd args...` strings that skip analysis.
    #[serde(default)]
    pub whitelisted_commands: Vec<String>,
}

/// Intent category of a command or tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Build,
    Test,
    Install,
    Explore,
    Lint,
    Cleanup,
    Git,
    Docker,
    K8s,
    Run,
    Plan,
    Edit,
    Clarify,
    Read,
    Other,
}

impl Category {
    /// All categories, highest priority first.
    pub const ALL: [Category; 15] = [
        Category::Install,
        Category::Edit,
        Category::Run,
        Category::Test,
        Category::Build,
        Category::Cleanup,
        Category::Docker,
        Category::K8s,
        Category::Git,
        Category::Explore,
        Category::Lint,
        Category::Plan,
        Category::Read,
        Category::Clarify,
        Category::Other,
    ];

    /// Tie-break weight when a compound command spans several categories.
    pub fn priority(self) -> u32 {
        match self {
            Category::Install => 100,
            Category::Edit => 90,
            Category::Run => 80,
            Category::Test => 70,
            Category::Build => 60,
            Category::Cleanup => 50,
            Category::Docker | Category::K8s => 40,
            Category::Git => 30,
            Category::Explore | Category::Lint | Category::Plan => 20,
            Category::Read => 15,
            Category::Clarify => 10,
            Category::Other => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Build => "build",
            Category::Test => "test",
            Category::Install => "install",
            Category::Explore => "explore",
            Category::Lint => "lint",
            Category::Cleanup => "cleanup",
            Category::Git => "git",
            Category::Docker => "docker",
            Category::K8s => "k8s",
            Category::Run => "run",
            Category::Plan => "plan",
            Category::Edit => "edit",
            Category::Clarify => "clarify",
            Category::Read => "read",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

/// Matching rules for one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Exact commands or prefixes (`go build` matches `go build ./...`).
    #[serde(default)]
    pub commands: Vec<String>,
    /// Regular expressions tried after every category's `commands`.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Agent tool names, e.g. `Edit` or `Grep`.
    #[serde(default)]
    pub tools: Vec<String>,
}

/// Category rules keyed by category, as read from `.bash-categories.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    #[serde(default)]
    pub categories: HashMap<Category, CategoryRule>,
}

/// PreToolUse hook payload received on stdin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<serde_json::Value>,
}

impl HookInput {
    /// The shell command of a `Bash` tool call.
    pub fn bash_command(&self) -> Option<&str> {
        if self.tool_name.as_deref() != Some("Bash") {
            return None;
        }
        self.tool_input.as_ref()?.get("command")?.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionDecision {
    Allow,
    Deny,
    Ask,
}

/// Hook response printed on stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookOutput {
    #[serde(rename = "continue")]
    pub continue_: bool,
    #[serde(rename = "stopReason", default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(rename = "hookSpecificOutput", default, skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookSpecificOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    pub hook_event_name: String,
    pub permission_decision: PermissionDecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl HookOutput {
    /// Let the tool call proceed without expressing a decision.
    pub fn pass() -> Self {
        Self {
            continue_: true,
            stop_reason: None,
            hook_specific_output: None,
        }
    }

    pub fn decision(decision: PermissionDecision, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            continue_: true,
            stop_reason: None,
            hook_specific_output: Some(HookSpecificOutput {
                hook_event_name: "PreToolUse".to_string(),
                permission_decision: decision,
                reason: (!reason.is_empty()).then_some(reason),
            }),
        }
    }

    /// Map a scan verdict onto an allow/deny decision.
    pub fn from_scan(result: &ScanResult) -> Self {
        if result.allowed {
            Self::decision(PermissionDecision::Allow, "")
        } else {
            Self::decision(PermissionDecision::Deny, result.reason.clone())
        }
    }
}
