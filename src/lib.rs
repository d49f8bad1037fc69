//! geoipdb - compile registry delegation reports into a per-country IPv4
//! range database.
//!
//! A regional internet registry publishes a delegation report listing every
//! address block it assigned and the country it was assigned to. This crate
//! turns that report into two compact binary files:
//!
//! - a database file holding, per country, the sorted list of its ranges
//! - an index file giving the byte offset of each country's block
//!
//! A lookup client binary-searches the index by country code and then scans
//! the small contiguous range list of that country.
//!
//! # Quick Start
//!
//! ```ignore
//! use geoipdb::{build_database, CountryFilter, ResourceType};
//!
//! let text = std::fs::read_to_string("delegated-apnic-latest")?;
//! let countries: CountryFilter = "CN, US".parse()?;
//! let db = build_database(&text, ResourceType::Ipv4, &countries)?;
//! std::fs::write("geoipdb.bin", &db.bin)?;
//! std::fs::write("geoipdb.idx", &db.idx)?;
//! ```
//!
//! # Pipeline
//!
//! 1. [`report`]: parse the text into a version header, summaries and
//!    detail records
//! 2. [`select`]: keep one address family and the requested countries
//! 3. [`table`]: convert records into `[begin, end)` ranges, sort them by
//!    country then address, and count them per country
//! 4. [`database`]: serialize the sorted table into the two files
//!
//! Any error aborts the whole build; no partial database is produced.

mod country;
mod error;
mod metadata;
mod resource_type;

pub mod database;
pub mod fetch;
pub mod pipeline;
pub mod report;
pub mod select;
pub mod table;

// Re-export core types
pub use country::CountryCode;
pub use error::{Error, Result};
pub use resource_type::ResourceType;

pub use database::{DatabaseReader, DatabaseWriter, EncodedDatabase};
pub use fetch::{read_report_file, ReportFetcher, DEFAULT_REPORT_URL};
pub use metadata::FetchMetadata;
pub use pipeline::{build_and_write, build_database, build_table, BuildOptions};
pub use report::{DelegationRecord, Report, ReportParser};
pub use select::{select_by_country, select_by_filter, select_by_type, CountryFilter};
pub use table::{CountryStatistics, RangeEntry, RangeTable, RangeTableBuilder};
