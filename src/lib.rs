pub mod bundle;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod pip;
pub mod process;
pub mod transfer;
pub mod utils;

pub use bundle::{Bundle, FileEntry};
pub use error::{Error, Result};
