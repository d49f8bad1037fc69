//! Registry delegation report model and parser.
//!
//! A report is a line oriented, pipe delimited text feed:
//!
//! ```text
//! 2|apnic|20240101|74521|19830613|20231231|+1000      version header
//! apnic|*|asn|*|11245|summary                         summaries
//! apnic|*|ipv4|*|52345|summary
//! apnic|*|ipv6|*|10931|summary
//! apnic|JP|asn|173|1|20020801|allocated               detail records
//! apnic|CN|ipv4|1.0.1.0|256|20110414|allocated
//! ```

mod parser;
mod record;

pub use parser::ReportParser;
pub use record::{DelegationRecord, ReportLine, Summary, VersionHeader};

use crate::ResourceType;

/// A fully parsed delegation report.
#[derive(Debug, Clone)]
pub struct Report {
    pub version: VersionHeader,
    pub summaries: Vec<Summary>,
    pub records: Vec<DelegationRecord>,
}

impl Report {
    /// Parse report text. See [`ReportParser::parse`].
    pub fn parse(text: &str) -> crate::Result<Self> {
        ReportParser::parse(text)
    }

    /// Number of detail records of one resource type.
    pub fn count_of(&self, resource_type: ResourceType) -> usize {
        self.records
            .iter()
            .filter(|record| record.resource_type == resource_type)
            .count()
    }

    /// Compare the counts announced by the header and summaries with the
    /// parsed records, logging every disagreement.
    ///
    /// Returns `true` when everything agrees. Disagreement is never an error.
    pub fn check_counts(&self) -> bool {
        let mut consistent = true;

        if self.version.records as usize != self.records.len() {
            log::warn!(
                "Header announces {} records, parsed {}",
                self.version.records,
                self.records.len()
            );
            consistent = false;
        }

        for summary in &self.summaries {
            let parsed = self.count_of(summary.resource_type);
            if summary.count as usize != parsed {
                log::warn!(
                    "Summary announces {} {} records, parsed {}",
                    summary.count,
                    summary.resource_type,
                    parsed
                );
                consistent = false;
            }
        }

        consistent
    }
}
