//! Resource type vocabulary of delegation reports.

use std::fmt;

/// ResourceType is the kind of number resource a report line describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceType {
    /// IPv4 address block (extent is a host count)
    #[default]
    Ipv4,
    /// IPv6 address block (extent is a prefix length)
    Ipv6,
    /// Autonomous system numbers (extent is a count of ASNs)
    Asn,
}

impl ResourceType {
    /// Parse a resource type from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ipv4" => Some(ResourceType::Ipv4),
            "ipv6" => Some(ResourceType::Ipv6),
            "asn" => Some(ResourceType::Asn),
            _ => None,
        }
    }

    /// Get the canonical string representation as used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Ipv4 => "ipv4",
            ResourceType::Ipv6 => "ipv6",
            ResourceType::Asn => "asn",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
