//! Shared utilities across imgcheck modules.

pub mod files;
pub mod temp;

pub use files::{write_file_with_dirs, write_tree};
pub use temp::Scratch;
