//! Error types for geoipdb.

use thiserror::Error;

/// Error type for geoipdb operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Version header line missing, too short, or with a bad record count
    #[error("malformed version header at line {line_no}: {line:?}")]
    MalformedHeader { line_no: usize, line: String },

    /// Summary line too short or with a bad count
    #[error("malformed summary at line {line_no}: {line:?}")]
    MalformedSummary { line_no: usize, line: String },

    /// Detail record too short, with a bad extent or a bad country field
    #[error("malformed record at line {line_no}: {line:?}")]
    MalformedRecord { line_no: usize, line: String },

    /// Start address is not a dotted-decimal IPv4 literal
    #[error("invalid IPv4 address: {0}")]
    InvalidAddress(String),

    /// Start address plus extent leaves the 32-bit address space
    #[error("range {start} + {extent} exceeds the IPv4 address space")]
    RangeOverflow { start: String, extent: u64 },

    /// A country group holds more entries than the u16 count field can express
    #[error("country {country} has {count} ranges, more than the format allows")]
    CountOverflow { country: String, count: usize },

    /// A record of another address family reached the IPv4 table builder
    #[error("unexpected resource type: {0}")]
    UnexpectedResourceType(String),

    /// Invalid country code
    #[error("invalid country code: {0}")]
    InvalidCountryCode(String),

    /// Refusing to write a database without any country
    #[error("range table is empty, refusing to write an empty database")]
    EmptyTable,

    /// Database or index bytes do not follow the layout
    #[error("corrupt database: {0}")]
    CorruptDatabase(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Download error
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for geoipdb operations.
pub type Result<T> = std::result::Result<T, Error>;
