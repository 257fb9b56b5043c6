pub mod command_executor;
pub mod heuristics;
pub mod rules;
pub mod token_manager;

pub use command_executor::SafeCommandExecutor;
pub use heuristics::{ArtifactRole, CheckKind, HeuristicAnalyzer};
pub use rules::{CheckReport, Evidence, Rule, RuleSet, SubCheck};
pub use token_manager::SecureTokenManager;
