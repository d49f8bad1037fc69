//! Line schemas of a delegation report.
//!
//! Every line kind declares its arity up front and extracts its fields by
//! position, so a short line is rejected by a plain length comparison.

use crate::{CountryCode, ResourceType};

/// A pipe-delimited report line with a fixed minimum number of fields.
pub trait ReportLine: Sized {
    /// Number of fields the line must carry.
    const ARITY: usize;

    /// Build the line from its fields. `fields.len() >= ARITY` is guaranteed.
    fn from_fields(fields: &[&str]) -> Option<Self>;

    /// Split `line` on `|` and parse it, or `None` if it is too short or a
    /// typed field does not parse.
    fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() < Self::ARITY {
            return None;
        }
        Self::from_fields(&fields)
    }
}

/// Version header, the first meaningful line of a report.
///
/// `version|registry|serial|records|startdate|enddate|UTCoffset`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionHeader {
    pub version: String,
    pub registry: String,
    pub serial: String,
    /// Number of detail records announced by the registry
    pub records: u32,
    pub start_date: String,
    pub end_date: String,
    pub utc_offset: String,
}

impl ReportLine for VersionHeader {
    const ARITY: usize = 7;

    fn from_fields(fields: &[&str]) -> Option<Self> {
        Some(Self {
            version: fields[0].to_string(),
            registry: fields[1].to_string(),
            serial: fields[2].to_string(),
            records: fields[3].trim().parse().ok()?,
            start_date: fields[4].to_string(),
            end_date: fields[5].to_string(),
            utc_offset: fields[6].to_string(),
        })
    }
}

/// Per resource type summary line.
///
/// `registry|*|type|*|count|summary`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub registry: String,
    pub resource_type: ResourceType,
    pub count: u32,
    pub label: String,
}

impl ReportLine for Summary {
    const ARITY: usize = 6;

    fn from_fields(fields: &[&str]) -> Option<Self> {
        Some(Self {
            registry: fields[0].to_string(),
            resource_type: ResourceType::parse(fields[2])?,
            count: fields[4].trim().parse().ok()?,
            label: fields[5].trim().to_string(),
        })
    }
}

/// One delegated block.
///
/// `registry|cc|type|start|value|date|status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationRecord {
    pub registry: String,
    /// `None` for blocks not assigned to any country
    pub country: Option<CountryCode>,
    pub resource_type: ResourceType,
    /// Family dependent start value, dotted decimal for IPv4
    pub start: String,
    /// Number of units starting at `start` (hosts for IPv4)
    pub extent: u64,
    pub date: String,
    pub status: String,
}

impl ReportLine for DelegationRecord {
    const ARITY: usize = 7;

    fn from_fields(fields: &[&str]) -> Option<Self> {
        let country = match fields[1].trim() {
            "" => None,
            cc => Some(CountryCode::pack(cc).ok()?),
        };
        Some(Self {
            registry: fields[0].to_string(),
            country,
            resource_type: ResourceType::parse(fields[2])?,
            start: fields[3].trim().to_string(),
            extent: fields[4].trim().parse().ok()?,
            date: fields[5].to_string(),
            status: fields[6].trim().to_string(),
        })
    }
}
