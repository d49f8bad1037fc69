//! Database and index layout constants.

use crate::table::RangeEntry;
use crate::CountryCode;

/// Size of the per-country header in the database file.
pub const GROUP_HEADER_SIZE: usize = 6;

/// Size of one range in the database file.
pub const RANGE_ENTRY_SIZE: usize = 8;

/// Size of one index entry.
pub const INDEX_ENTRY_SIZE: usize = 6;

/// Bytes a country group with `count` ranges occupies in the database file.
pub fn group_size(count: usize) -> usize {
    GROUP_HEADER_SIZE + RANGE_ENTRY_SIZE * count
}

/// Country group header (6 bytes, little-endian).
///
/// The code and the count take four bytes; the last two bytes are reserved
/// and always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupHeader {
    /// Packed country code
    pub country: u16,
    /// Number of ranges following the header
    pub count: u16,
}

impl GroupHeader {
    pub fn encode(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.country.to_le_bytes());
        buffer.extend_from_slice(&self.count.to_le_bytes());
        buffer.extend_from_slice(&[0u8; 2]); // reserved
    }

    pub fn decode(data: &[u8]) -> Option<Self> {
        let bytes = data.get(..GROUP_HEADER_SIZE)?;
        Some(Self {
            country: u16::from_le_bytes([bytes[0], bytes[1]]),
            count: u16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }
}

/// Encode one range (begin, end) as 8 little-endian bytes.
pub fn encode_range(entry: &RangeEntry, buffer: &mut Vec<u8>) {
    buffer.extend_from_slice(&entry.begin.to_le_bytes());
    buffer.extend_from_slice(&entry.end.to_le_bytes());
}

/// Decode the range at the start of `data`.
pub fn decode_range(data: &[u8]) -> Option<(u32, u32)> {
    let bytes = data.get(..RANGE_ENTRY_SIZE)?;
    Some((
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
    ))
}

/// Index entry (6 bytes, little-endian).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub country: CountryCode,
    /// Offset of the country's group header in the database file
    pub offset: u32,
}

impl IndexEntry {
    pub fn encode(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.country.packed().to_le_bytes());
        buffer.extend_from_slice(&self.offset.to_le_bytes());
    }

    /// Decode an index entry; `None` if the country bytes are not letters.
    pub fn decode(data: &[u8]) -> Option<Self> {
        let bytes = data.get(..INDEX_ENTRY_SIZE)?;
        Some(Self {
            country: CountryCode::from_packed(u16::from_le_bytes([bytes[0], bytes[1]]))?,
            offset: u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
        })
    }
}
