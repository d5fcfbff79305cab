// Read-side errors, split so callers can tell unreadable input from bad content

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoError {
    /// A file could not be opened or read, or a directory could not be listed.
    Io(String),
    /// A file was read but its contents are not valid CSV/TSV or xlsx.
    Parse(String),
    /// The input directory holds no `.tsv` or `.csv` files.
    NoExtracts(String),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) | Self::Parse(msg) => write!(f, "{msg}"),
            Self::NoExtracts(dir) => write!(f, "{dir}: no .tsv or .csv files found"),
        }
    }
}

impl std::error::Error for IoError {}
