//! Binary per-country range database.
//!
//! A database is a pair of files. The database file holds one group per
//! country, in ascending packed country code order; the index file holds the
//! byte offset of every group. All integers are little-endian.
//!
//! # Database file
//!
//! ```text
//! +----------------+----------------+----------------+
//! |  Country Code  |     Count N    |    Reserved    |
//! |    (2 Bytes)   |    (2 Bytes)   |    (2 Bytes)   |
//! +----------------+----------------+----------------+----^---+
//! |           Begin Address         |                     |
//! |            (4 Bytes)            |                     +
//! +---------------------------------+                 N times
//! |            End Address          |                     +
//! |            (4 Bytes)            |                     |
//! +---------------------------------+---------------------v---+
//! ```
//!
//! A group with N ranges occupies `6 + 8 * N` bytes. End addresses are
//! exclusive.
//!
//! # Index file
//!
//! ```text
//! +----------------+---------------------------------+
//! |  Country Code  |     Offset in Database File     |
//! |    (2 Bytes)   |             (4 Bytes)           |
//! +----------------+---------------------------------+
//! ```

mod format;
mod reader;
pub mod writer;


pub use format::*;
pub use reader::{DatabaseReader, Ranges};
pub use writer::{DatabaseWriter, EncodedDatabase};
