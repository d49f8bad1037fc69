//! Sorted per-country IPv4 range table.

use std::net::Ipv4Addr;

use crate::report::DelegationRecord;
use crate::{CountryCode, Error, ResourceType, Result};

/// Largest number of ranges a single country group can hold on disk.
pub const MAX_GROUP_ENTRIES: usize = u16::MAX as usize;

/// A half-open IPv4 range `[begin, end)` assigned to a country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeEntry {
    pub country: CountryCode,
    /// First address, inclusive
    pub begin: u32,
    /// One past the last address
    pub end: u32,
}

impl RangeEntry {
    /// Convert an IPv4 detail record.
    ///
    /// Returns `Ok(None)` for records without a country.
    pub fn from_record(record: &DelegationRecord) -> Result<Option<Self>> {
        if record.resource_type != ResourceType::Ipv4 {
            return Err(Error::UnexpectedResourceType(format!(
                "{} record {} in an IPv4 table",
                record.resource_type, record.start
            )));
        }
        let country = match record.country {
            Some(country) => country,
            None => return Ok(None),
        };

        let begin: Ipv4Addr = record
            .start
            .parse()
            .map_err(|_| Error::InvalidAddress(record.start.clone()))?;
        let begin = u32::from(begin);

        let end = u64::from(begin) + record.extent;
        let end = u32::try_from(end).map_err(|_| Error::RangeOverflow {
            start: record.start.clone(),
            extent: record.extent,
        })?;

        Ok(Some(Self { country, begin, end }))
    }

    /// Whether `ip` falls inside the range.
    pub fn contains(&self, ip: u32) -> bool {
        self.begin <= ip && ip < self.end
    }
}

/// Range entries ordered by country, then by begin address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeTable {
    entries: Vec<RangeEntry>,
}

impl RangeTable {
    /// Sort `entries` into table order.
    ///
    /// The sort is stable, so entries with equal country and begin keep
    /// their input order.
    pub fn new(mut entries: Vec<RangeEntry>) -> Self {
        entries.sort_by_key(|entry| (entry.country, entry.begin));
        Self { entries }
    }

    pub fn entries(&self) -> &[RangeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Contiguous runs of entries sharing a country, in table order.
    pub fn groups(&self) -> Groups<'_> {
        Groups {
            rest: &self.entries,
        }
    }

    /// Count the entries of every country group.
    ///
    /// Fails with [`Error::CountOverflow`] when a group does not fit the
    /// 16-bit count of the database format.
    pub fn count_by_country(&self) -> Result<CountryStatistics> {
        let mut groups = Vec::new();
        for (country, entries) in self.groups() {
            let count = u16::try_from(entries.len()).map_err(|_| Error::CountOverflow {
                country: country.to_string(),
                count: entries.len(),
            })?;
            groups.push(CountryCount { country, count });
        }
        Ok(CountryStatistics { groups })
    }
}

/// Iterator over the country groups of a [`RangeTable`].
pub struct Groups<'a> {
    rest: &'a [RangeEntry],
}

impl<'a> Iterator for Groups<'a> {
    type Item = (CountryCode, &'a [RangeEntry]);

    fn next(&mut self) -> Option<Self::Item> {
        let country = self.rest.first()?.country;
        let len = self
            .rest
            .iter()
            .position(|entry| entry.country != country)
            .unwrap_or(self.rest.len());
        let (group, rest) = self.rest.split_at(len);
        self.rest = rest;
        Some((country, group))
    }
}

/// Number of ranges in one country group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryCount {
    pub country: CountryCode,
    pub count: u16,
}

/// Per-country entry counts, in the group order of the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryStatistics {
    groups: Vec<CountryCount>,
}

impl CountryStatistics {
    pub fn groups(&self) -> &[CountryCount] {
        &self.groups
    }

    /// The bare counts, in group order.
    pub fn counts(&self) -> Vec<u16> {
        self.groups.iter().map(|group| group.count).collect()
    }

    /// Number of country groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Sum of all counts, equal to the length of the table.
    pub fn total(&self) -> usize {
        self.groups.iter().map(|group| group.count as usize).sum()
    }
}

/// Builder turning IPv4 detail records into a [`RangeTable`].
#[derive(Debug, Default)]
pub struct RangeTableBuilder {
    entries: Vec<RangeEntry>,
    unassigned: usize,
}

impl RangeTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record.
    ///
    /// Records of other resource types are an error; the caller is expected
    /// to have applied the type filter. Unassigned records are skipped.
    pub fn add(&mut self, record: &DelegationRecord) -> Result<()> {
        match RangeEntry::from_record(record)? {
            Some(entry) => self.entries.push(entry),
            None => {
                log::debug!("Skipping unassigned block {}", record.start);
                self.unassigned += 1;
            }
        }
        Ok(())
    }

    /// Number of records skipped because they carry no country.
    pub fn unassigned(&self) -> usize {
        self.unassigned
    }

    /// Sort the collected entries and count them per country.
    pub fn build(self) -> Result<(RangeTable, CountryStatistics)> {
        let table = RangeTable::new(self.entries);
        let statistics = table.count_by_country()?;
        Ok((table, statistics))
    }

    /// Build a table straight from a slice of records.
    pub fn from_records(records: &[DelegationRecord]) -> Result<(RangeTable, CountryStatistics)> {
        let mut builder = Self::new();
        for record in records {
            builder.add(record)?;
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportLine;

    fn record(line: &str) -> DelegationRecord {
        DelegationRecord::parse_line(line).unwrap()
    }

    fn cc(code: &str) -> CountryCode {
        CountryCode::pack(code).unwrap()
    }

    #[test]
    fn test_entry_from_record() {
        let entry = RangeEntry::from_record(&record("apnic|CN|ipv4|1.0.0.0|256|20100101|allocated"))
            .unwrap()
            .unwrap();
        assert_eq!(entry.country, cc("CN"));
        assert_eq!(entry.begin, 0x0100_0000);
        assert_eq!(entry.end, 0x0100_0100);
        assert!(entry.contains(0x0100_00FF));
        assert!(!entry.contains(0x0100_0100));
    }

    #[test]
    fn test_entry_zero_extent() {
        let entry = RangeEntry::from_record(&record("apnic|CN|ipv4|1.0.0.0|0|20100101|allocated"))
            .unwrap()
            .unwrap();
        assert_eq!(entry.begin, entry.end);
    }

    #[test]
    fn test_entry_invalid_address() {
        for start in ["1.0.0", "1.0.0.256", "a.b.c.d", "2001:db8::"] {
            let line = format!("apnic|CN|ipv4|{start}|256|20100101|allocated");
            assert!(matches!(
                RangeEntry::from_record(&record(&line)),
                Err(Error::InvalidAddress(_))
            ));
        }
    }

    #[test]
    fn test_entry_range_overflow() {
        let last = record("apnic|CN|ipv4|255.255.255.0|255|20100101|allocated");
        assert_eq!(RangeEntry::from_record(&last).unwrap().unwrap().end, u32::MAX);

        let overflow = record("apnic|CN|ipv4|255.255.255.0|256|20100101|allocated");
        assert!(matches!(
            RangeEntry::from_record(&overflow),
            Err(Error::RangeOverflow { extent: 256, .. })
        ));
    }

    #[test]
    fn test_entry_wrong_type() {
        let asn = record("apnic|JP|asn|173|1|20020801|allocated");
        assert!(matches!(
            RangeEntry::from_record(&asn),
            Err(Error::UnexpectedResourceType(_))
        ));
    }

    #[test]
    fn test_entry_unassigned() {
        let free = record("apnic||ipv4|4.0.0.0|256||available");
        assert_eq!(RangeEntry::from_record(&free).unwrap(), None);
    }

    #[test]
    fn test_build_sorts_and_counts() {
        let records = [
            record("apnic|US|ipv4|2.0.0.0|1024|20100101|allocated"),
            record("apnic|CN|ipv4|3.0.0.0|512|20100101|allocated"),
            record("apnic||ipv4|4.0.0.0|256||available"),
            record("apnic|AU|ipv4|1.0.0.0|256|20100101|allocated"),
            record("apnic|CN|ipv4|1.0.1.0|256|20100101|allocated"),
        ];
        let mut builder = RangeTableBuilder::new();
        for r in &records {
            builder.add(r).unwrap();
        }
        assert_eq!(builder.unassigned(), 1);

        let (table, stats) = builder.build().unwrap();
        let order: Vec<_> = table
            .entries()
            .iter()
            .map(|e| (e.country.to_string(), e.begin))
            .collect();
        assert_eq!(
            order,
            [
                ("AU".to_string(), 0x0100_0000),
                ("CN".to_string(), 0x0100_0100),
                ("CN".to_string(), 0x0300_0000),
                ("US".to_string(), 0x0200_0000),
            ]
        );
        assert_eq!(stats.counts(), [1, 2, 1]);
        assert_eq!(stats.total(), table.len());
    }

    #[test]
    fn test_sort_invariant() {
        let entries: Vec<_> = (0..200u32)
            .map(|i| RangeEntry {
                country: cc(["US", "CN", "JP", "AU"][(i % 4) as usize]),
                begin: (i * 7919) % 1000,
                end: (i * 7919) % 1000 + 1,
            })
            .collect();
        let table = RangeTable::new(entries);
        for pair in table.entries().windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert!(a.country < b.country || (a.country == b.country && a.begin <= b.begin));
        }

        let stats = table.count_by_country().unwrap();
        assert_eq!(stats.len(), 4);
        assert_eq!(stats.total(), 200);
    }

    #[test]
    fn test_stable_on_equal_keys() {
        let first = RangeEntry { country: cc("CN"), begin: 10, end: 20 };
        let second = RangeEntry { country: cc("CN"), begin: 10, end: 30 };
        let table = RangeTable::new(vec![first, second]);
        assert_eq!(table.entries(), [first, second]);
    }

    #[test]
    fn test_groups() {
        let table = RangeTable::new(vec![
            RangeEntry { country: cc("US"), begin: 5, end: 6 },
            RangeEntry { country: cc("CN"), begin: 1, end: 2 },
            RangeEntry { country: cc("CN"), begin: 3, end: 4 },
        ]);
        let groups: Vec<_> = table.groups().map(|(c, g)| (c.to_string(), g.len())).collect();
        assert_eq!(groups, [("CN".to_string(), 2), ("US".to_string(), 1)]);
        assert_eq!(RangeTable::default().groups().count(), 0);
    }

    #[test]
    fn test_count_overflow() {
        let entries = (0..=MAX_GROUP_ENTRIES as u32)
            .map(|i| RangeEntry { country: cc("CN"), begin: i, end: i + 1 })
            .collect();
        let table = RangeTable::new(entries);
        assert!(matches!(
            table.count_by_country(),
            Err(Error::CountOverflow { count: 65536, .. })
        ));
    }

    #[test]
    fn test_count_at_limit() {
        let entries = (0..MAX_GROUP_ENTRIES as u32)
            .map(|i| RangeEntry { country: cc("CN"), begin: i, end: i + 1 })
            .collect();
        let stats = RangeTable::new(entries).count_by_country().unwrap();
        assert_eq!(stats.counts(), [u16::MAX]);
    }
}
