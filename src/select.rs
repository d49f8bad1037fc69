//! Record selection by resource type and country.

use ahash::AHashSet;
use std::fmt;
use std::str::FromStr;

use crate::report::DelegationRecord;
use crate::{CountryCode, Error, ResourceType};

/// Which countries end up in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountryFilter {
    /// Every record, including unassigned ones
    All,
    /// Only records assigned to one of these countries
    Only(AHashSet<CountryCode>),
}

impl CountryFilter {
    /// Filter for a single country.
    pub fn single(code: CountryCode) -> Self {
        let mut set = AHashSet::new();
        set.insert(code);
        CountryFilter::Only(set)
    }

    /// Whether a record's country passes the filter.
    pub fn matches(&self, country: Option<CountryCode>) -> bool {
        match self {
            CountryFilter::All => true,
            CountryFilter::Only(codes) => country.map_or(false, |code| codes.contains(&code)),
        }
    }
}

impl Default for CountryFilter {
    fn default() -> Self {
        CountryFilter::single(CountryCode::CN)
    }
}

impl FromStr for CountryFilter {
    type Err = Error;

    /// Parse `"CN"`, `"CN, US"` or `"All"`.
    ///
    /// Matching is case-insensitive and whitespace is ignored. `ALL`
    /// anywhere in the list selects every country.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();

        if normalized.contains("ALL") {
            return Ok(CountryFilter::All);
        }

        let mut codes = AHashSet::new();
        for part in normalized.split(',').filter(|part| !part.is_empty()) {
            codes.insert(CountryCode::pack(part)?);
        }
        if codes.is_empty() {
            return Err(Error::Config(format!("no country codes in {:?}", s)));
        }
        Ok(CountryFilter::Only(codes))
    }
}

impl fmt::Display for CountryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountryFilter::All => write!(f, "ALL"),
            CountryFilter::Only(codes) => {
                let mut codes: Vec<_> = codes.iter().collect();
                codes.sort();
                let names: Vec<String> = codes.iter().map(|code| code.to_string()).collect();
                write!(f, "{}", names.join(","))
            }
        }
    }
}

/// Keep the records of one resource type, in their original order.
pub fn select_by_type(
    records: &[DelegationRecord],
    resource_type: ResourceType,
) -> Vec<DelegationRecord> {
    records
        .iter()
        .filter(|record| record.resource_type == resource_type)
        .cloned()
        .collect()
}

/// Keep the records assigned to `code`, in their original order.
pub fn select_by_country(records: &[DelegationRecord], code: CountryCode) -> Vec<DelegationRecord> {
    records
        .iter()
        .filter(|record| record.country == Some(code))
        .cloned()
        .collect()
}

/// Keep the records passing `filter`, in their original order.
///
/// [`CountryFilter::All`] returns the input unchanged.
pub fn select_by_filter(records: Vec<DelegationRecord>, filter: &CountryFilter) -> Vec<DelegationRecord> {
    match filter {
        CountryFilter::All => records,
        CountryFilter::Only(_) => records
            .into_iter()
            .filter(|record| filter.matches(record.country))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportLine;

    fn records() -> Vec<DelegationRecord> {
        [
            "apnic|CN|ipv4|1.0.0.0|256|20100101|allocated",
            "apnic|US|ipv4|2.0.0.0|1024|20100101|allocated",
            "apnic|CN|ipv6|2001:250::|35|20000426|allocated",
            "apnic|JP|asn|173|1|20020801|allocated",
            "apnic||ipv4|4.0.0.0|256||available",
            "apnic|CN|ipv4|3.0.0.0|512|20100101|allocated",
        ]
        .iter()
        .map(|line| DelegationRecord::parse_line(line).unwrap())
        .collect()
    }

    fn cc(code: &str) -> CountryCode {
        CountryCode::pack(code).unwrap()
    }

    #[test]
    fn test_select_by_type() {
        let ipv4 = select_by_type(&records(), ResourceType::Ipv4);
        let starts: Vec<_> = ipv4.iter().map(|r| r.start.as_str()).collect();
        assert_eq!(starts, ["1.0.0.0", "2.0.0.0", "4.0.0.0", "3.0.0.0"]);

        assert_eq!(select_by_type(&records(), ResourceType::Asn).len(), 1);
    }

    #[test]
    fn test_select_by_country() {
        let cn = select_by_country(&records(), cc("CN"));
        assert_eq!(cn.len(), 3);
        assert!(cn.iter().all(|r| r.country == Some(cc("CN"))));

        assert!(select_by_country(&records(), cc("DE")).is_empty());
    }

    #[test]
    fn test_all_is_identity_after_type_filter() {
        let ipv4 = select_by_type(&records(), ResourceType::Ipv4);
        let selected = select_by_filter(ipv4.clone(), &CountryFilter::All);
        assert_eq!(selected, ipv4);
    }

    #[test]
    fn test_select_by_filter_set() {
        let filter: CountryFilter = "cn, us".parse().unwrap();
        let ipv4 = select_by_type(&records(), ResourceType::Ipv4);
        let selected = select_by_filter(ipv4, &filter);
        let starts: Vec<_> = selected.iter().map(|r| r.start.as_str()).collect();
        assert_eq!(starts, ["1.0.0.0", "2.0.0.0", "3.0.0.0"]);
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!("All".parse::<CountryFilter>().unwrap(), CountryFilter::All);
        assert_eq!("CN, all".parse::<CountryFilter>().unwrap(), CountryFilter::All);
        assert_eq!("CN".parse::<CountryFilter>().unwrap(), CountryFilter::single(cc("CN")));

        let filter: CountryFilter = " cn , US ,".parse().unwrap();
        assert_eq!(filter.to_string(), "CN,US");

        assert!("".parse::<CountryFilter>().is_err());
        assert!("CHN".parse::<CountryFilter>().is_err());
    }

    #[test]
    fn test_filter_matches_unassigned() {
        assert!(CountryFilter::All.matches(None));
        assert!(!CountryFilter::single(cc("CN")).matches(None));
    }
}
