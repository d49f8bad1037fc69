//! End-to-end database build: report text in, database bytes out.

use std::path::Path;

use crate::database::{DatabaseWriter, EncodedDatabase};
use crate::report::Report;
use crate::select::{select_by_filter, select_by_type, CountryFilter};
use crate::table::{CountryStatistics, RangeTable, RangeTableBuilder};
use crate::{Error, ResourceType, Result};

/// Options of a database build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Address family to keep, only IPv4 tables can be built
    pub resource_type: ResourceType,
    /// Countries to keep
    pub countries: CountryFilter,
    /// Replace the output files atomically
    pub atomic: bool,
}

impl BuildOptions {
    /// Options selecting `countries` with the defaults for everything else.
    pub fn new(countries: CountryFilter) -> Self {
        Self {
            countries,
            ..Self::default()
        }
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            resource_type: ResourceType::Ipv4,
            countries: CountryFilter::default(),
            atomic: true,
        }
    }
}

/// Parse, select, sort and count.
pub fn build_table(
    report_text: &str,
    resource_type: ResourceType,
    countries: &CountryFilter,
) -> Result<(RangeTable, CountryStatistics)> {
    if resource_type != ResourceType::Ipv4 {
        return Err(Error::UnexpectedResourceType(format!(
            "cannot build a {} database",
            resource_type
        )));
    }

    let report = Report::parse(report_text)?;
    report.check_counts();
    log::info!(
        "Parsed {} report serial {}: {} records",
        report.version.registry,
        report.version.serial,
        report.records.len()
    );

    let records = select_by_type(&report.records, resource_type);
    let records = select_by_filter(records, countries);
    log::info!(
        "Selected {} {} records for {}",
        records.len(),
        resource_type,
        countries
    );

    let mut builder = RangeTableBuilder::new();
    for record in &records {
        builder.add(record)?;
    }
    if builder.unassigned() > 0 {
        log::debug!("Skipped {} unassigned records", builder.unassigned());
    }

    let (table, statistics) = builder.build()?;
    log::info!(
        "Built {} ranges in {} countries",
        table.len(),
        statistics.len()
    );
    Ok((table, statistics))
}

/// Build the database and index bytes from report text.
///
/// Pure: nothing is written to disk.
pub fn build_database(
    report_text: &str,
    resource_type: ResourceType,
    countries: &CountryFilter,
) -> Result<EncodedDatabase> {
    let (table, statistics) = build_table(report_text, resource_type, countries)?;
    DatabaseWriter::new().encode(&table, &statistics)
}

/// Build the database from report text and write both files.
pub fn build_and_write(
    report_text: &str,
    options: &BuildOptions,
    bin_path: &Path,
    idx_path: &Path,
) -> Result<EncodedDatabase> {
    let (table, statistics) = build_table(report_text, options.resource_type, &options.countries)?;
    DatabaseWriter::new()
        .with_atomic(options.atomic)
        .write(&table, &statistics, bin_path, idx_path)
}
