pub mod bundle;
pub mod core;
pub mod orchestration;
pub mod publish;
pub mod security;
pub mod validation;

pub use crate::bundle::{BundleAssembler, BundleManifest};
pub use crate::core::*;
pub use crate::orchestration::{PipelineResult, PipelineRunner, ReleasePipeline};
pub use crate::security::{CheckKind, CheckReport, HeuristicAnalyzer, SafeCommandExecutor, SecureTokenManager};
pub use crate::validation::{InventoryReport, SourceInventoryChecker};
