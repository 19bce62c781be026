pub mod analyze;
pub mod category;
pub mod classifier;
mod glob;
pub mod rules;
pub mod scanner;
pub mod words;

pub use analyze::analyze;
pub use category::{CategoryClassifier, category_priority};
pub use classifier::{PathClassifier, is_dynamic_path};
pub use rules::{FIND_RESULT, FindExec, extract_find_exec};
pub use scanner::Scanner;
pub use words::{contains_glob, contains_var, word_value};
