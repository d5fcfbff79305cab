// File I/O operations

pub mod csv;
pub mod discover;
pub mod error;
pub mod naming;
pub mod template;
pub mod writer;

pub use discover::{discover, Discovery};
pub use error::IoError;
pub use template::Template;
pub use writer::{write_workbook, WriteResult};
