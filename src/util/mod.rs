pub mod file_reader;

pub use file_reader::{FileError, FileReader};
