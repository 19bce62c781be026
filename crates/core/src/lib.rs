pub mod errors;
pub mod types;

pub use errors::LoadError;
pub use types::{
    AnalysisResult, Category, CategoryConfig, CategoryRule, Config, FileOperation, HookInput,
    HookOutput, HookSpecificOutput, OperationType, PathClassification, PermissionDecision,
    ScanResult, Violation,
};
