pub mod command;
pub mod compression;
pub mod filename;

pub use command::{Pipeline, Stage};
pub use compression::Compression;
