//! Writers for the finished portrait and its JSON run report.
pub mod output;
pub mod report;

pub use output::save_image;
pub use report::{RunReport, write_report};
