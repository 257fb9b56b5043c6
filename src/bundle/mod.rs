pub mod assembler;

pub use assembler::{BundleAssembler, BundleManifest, ExclusionRule};
