pub mod source_inventory;

pub use source_inventory::{InventoryReport, SourceInventoryChecker};
