//! I/O layer: decoding the input photo (`reader`) and writing the result
//! image plus the optional JSON run report (`writers`).
pub mod reader;
pub use reader::load_image;

pub mod writers;
