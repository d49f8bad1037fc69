//! Delegation report parser.

use std::iter::Peekable;

use super::record::{DelegationRecord, ReportLine, Summary, VersionHeader};
use super::Report;
use crate::{Error, Result};

/// Parser for registry delegation reports.
pub struct ReportParser;

impl ReportParser {
    /// Parse a complete report.
    ///
    /// The first meaningful line is the version header, followed by the
    /// summary lines (those ending in `summary`), followed by detail records
    /// until the end of input. Blank lines and `#` comments are skipped
    /// everywhere. The first malformed line aborts the parse.
    pub fn parse(text: &str) -> Result<Report> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line))
            .filter(|(_, line)| !is_ignorable(line))
            .peekable();

        let version = match lines.next() {
            Some((line_no, line)) => {
                VersionHeader::parse_line(line).ok_or_else(|| Error::MalformedHeader {
                    line_no,
                    line: line.to_string(),
                })?
            }
            None => {
                return Err(Error::MalformedHeader {
                    line_no: 0,
                    line: String::new(),
                })
            }
        };

        let summaries = parse_summaries(&mut lines)?;

        let mut records = Vec::new();
        for (line_no, line) in lines {
            let record = DelegationRecord::parse_line(line).ok_or_else(|| Error::MalformedRecord {
                line_no,
                line: line.to_string(),
            })?;
            records.push(record);
        }

        log::debug!(
            "Parsed report {} serial {}: {} summaries, {} records",
            version.registry,
            version.serial,
            summaries.len(),
            records.len()
        );

        Ok(Report {
            version,
            summaries,
            records,
        })
    }
}

fn parse_summaries<'a, I>(lines: &mut Peekable<I>) -> Result<Vec<Summary>>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let mut summaries = Vec::new();
    while let Some((line_no, line)) = lines.next_if(|(_, line)| line.trim_end().ends_with("summary")) {
        let summary = Summary::parse_line(line).ok_or_else(|| Error::MalformedSummary {
            line_no,
            line: line.to_string(),
        })?;
        summaries.push(summary);
    }
    Ok(summaries)
}

fn is_ignorable(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CountryCode, ResourceType};

    const REPORT: &str = r#"
# APNIC delegation report
#
2|apnic|20240101|3|19830613|20231231|+1000
apnic|*|asn|*|0|summary
apnic|*|ipv4|*|3|summary
apnic|*|ipv6|*|0|summary

apnic|CN|ipv4|1.0.0.0|256|20100101|allocated
apnic|US|ipv4|2.0.0.0|1024|20100101|allocated
apnic|CN|ipv4|3.0.0.0|512|20100101|allocated
"#;

    #[test]
    fn test_parse_report() {
        let report = ReportParser::parse(REPORT).unwrap();
        assert_eq!(report.version.registry, "apnic");
        assert_eq!(report.version.records, 3);
        assert_eq!(report.summaries.len(), 3);
        assert_eq!(report.summaries[1].resource_type, ResourceType::Ipv4);
        assert_eq!(report.records.len(), 3);

        let cn = CountryCode::pack("CN").unwrap();
        assert_eq!(report.records[0].country, Some(cn));
        assert_eq!(report.records[2].start, "3.0.0.0");
    }

    #[test]
    fn test_parse_without_summaries() {
        let text = "2|apnic|1|1|19830613|20231231|+1000\napnic|JP|ipv4|1.0.16.0|4096|20110412|allocated\n";
        let report = ReportParser::parse(text).unwrap();
        assert!(report.summaries.is_empty());
        assert_eq!(report.records.len(), 1);
    }

    #[test]
    fn test_crlf_lines() {
        let text = "2|apnic|1|1|19830613|20231231|+1000\r\napnic|*|ipv4|*|1|summary\r\napnic|JP|ipv4|1.0.16.0|4096|20110412|allocated\r\n";
        let report = ReportParser::parse(text).unwrap();
        assert_eq!(report.summaries.len(), 1);
        assert_eq!(report.records[0].status, "allocated");
    }

    #[test]
    fn test_empty_input_is_malformed_header() {
        let err = ReportParser::parse("\n# only comments\n\n").unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { line_no: 0, .. }));
    }

    #[test]
    fn test_short_header() {
        let err = ReportParser::parse("2|apnic|1|1|19830613\n").unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { line_no: 1, .. }));
    }

    #[test]
    fn test_bad_header_record_count() {
        let err = ReportParser::parse("2|apnic|1|lots|19830613|20231231|+1000\n").unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }));
    }

    #[test]
    fn test_malformed_summary() {
        let text = "2|apnic|1|1|19830613|20231231|+1000\napnic|*|ipv4|x|summary\n";
        let err = ReportParser::parse(text).unwrap_err();
        match err {
            Error::MalformedSummary { line_no, line } => {
                assert_eq!(line_no, 2);
                assert_eq!(line, "apnic|*|ipv4|x|summary");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_numeric_extent() {
        let text = "2|apnic|1|2|19830613|20231231|+1000\n\
                    apnic|CN|ipv4|1.0.0.0|256|20100101|allocated\n\
                    apnic|CN|ipv4|3.0.0.0|many|20100101|allocated\n";
        let err = ReportParser::parse(text).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line_no: 3, .. }));
    }

    #[test]
    fn test_short_record() {
        let text = "2|apnic|1|1|19830613|20231231|+1000\napnic|CN|ipv4|1.0.0.0|256\n";
        assert!(matches!(
            ReportParser::parse(text),
            Err(Error::MalformedRecord { line_no: 2, .. })
        ));
    }

    #[test]
    fn test_summary_after_records_is_a_record() {
        let text = "2|apnic|1|1|19830613|20231231|+1000\n\
                    apnic|CN|ipv4|1.0.0.0|256|20100101|allocated\n\
                    apnic|*|ipv4|*|1|summary\n";
        assert!(matches!(
            ReportParser::parse(text),
            Err(Error::MalformedRecord { line_no: 3, .. })
        ));
    }
}
