//! Scene document export.

pub mod usd;

pub use usd::{export_usda, write_usda, UsdExportOptions};
