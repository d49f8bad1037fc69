//! Database reader with memory-mapping support.

use memmap2::Mmap;
use std::fs::File;
use std::net::Ipv4Addr;
use std::path::Path;

use super::format::*;
use crate::{CountryCode, Error, Result};

enum Storage {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Storage {
    fn bytes(&self) -> &[u8] {
        match self {
            Storage::Owned(data) => data,
            Storage::Mapped(mmap) => mmap,
        }
    }
}

/// A validated country group location.
#[derive(Debug, Clone, Copy)]
struct Group {
    country: CountryCode,
    offset: usize,
    count: usize,
}

/// Lookup client for a database/index file pair.
///
/// The index is binary-searched by country code, then the country's
/// contiguous range list is scanned.
pub struct DatabaseReader {
    bin: Storage,
    groups: Vec<Group>,
}

impl DatabaseReader {
    /// Open a database and its index from disk.
    pub fn open(bin_path: &Path, idx_path: &Path) -> Result<Self> {
        let file = File::open(bin_path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let idx = std::fs::read(idx_path)?;
        Self::load(Storage::Mapped(mmap), &idx)
    }

    /// Load a database from in-memory bytes.
    pub fn from_bytes(bin: Vec<u8>, idx: &[u8]) -> Result<Self> {
        Self::load(Storage::Owned(bin), idx)
    }

    fn load(bin: Storage, idx: &[u8]) -> Result<Self> {
        if idx.is_empty() || idx.len() % INDEX_ENTRY_SIZE != 0 {
            return Err(Error::CorruptDatabase(format!(
                "index length {} is not a positive multiple of {}",
                idx.len(),
                INDEX_ENTRY_SIZE
            )));
        }

        let data = bin.bytes();
        let mut groups: Vec<Group> = Vec::with_capacity(idx.len() / INDEX_ENTRY_SIZE);
        let mut expected_offset = 0usize;

        for chunk in idx.chunks_exact(INDEX_ENTRY_SIZE) {
            let entry = IndexEntry::decode(chunk)
                .ok_or_else(|| Error::CorruptDatabase(format!("bad index entry {:02x?}", chunk)))?;

            if let Some(prev) = groups.last() {
                if prev.country >= entry.country {
                    return Err(Error::CorruptDatabase(format!(
                        "index not sorted at {}",
                        entry.country
                    )));
                }
            }

            let offset = entry.offset as usize;
            if offset != expected_offset {
                return Err(Error::CorruptDatabase(format!(
                    "{} starts at {}, expected {}",
                    entry.country, offset, expected_offset
                )));
            }

            let header = data
                .get(offset..)
                .and_then(GroupHeader::decode)
                .ok_or_else(|| {
                    Error::CorruptDatabase(format!("{} header out of bounds", entry.country))
                })?;
            if header.country != entry.country.packed() {
                return Err(Error::CorruptDatabase(format!(
                    "{} index entry points at another country",
                    entry.country
                )));
            }

            let count = header.count as usize;
            expected_offset = offset + group_size(count);
            if expected_offset > data.len() {
                return Err(Error::CorruptDatabase(format!(
                    "{} ranges run past the end of the database",
                    entry.country
                )));
            }

            groups.push(Group {
                country: entry.country,
                offset,
                count,
            });
        }

        if expected_offset != data.len() {
            return Err(Error::CorruptDatabase(format!(
                "{} trailing bytes after the last country",
                data.len() - expected_offset
            )));
        }

        Ok(Self { bin, groups })
    }

    /// Number of countries in the database.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Countries in index order.
    pub fn countries(&self) -> Vec<CountryCode> {
        self.groups.iter().map(|group| group.country).collect()
    }

    /// The ranges of one country as `(begin, end)` pairs.
    pub fn ranges(&self, country: CountryCode) -> Option<Ranges<'_>> {
        let pos = self
            .groups
            .binary_search_by_key(&country, |group| group.country)
            .ok()?;
        Some(self.group_ranges(&self.groups[pos]))
    }

    /// Whether `ip` lies in one of the ranges of `country`.
    pub fn contains(&self, country: CountryCode, ip: Ipv4Addr) -> bool {
        let ip = u32::from(ip);
        self.ranges(country)
            .map_or(false, |mut ranges| ranges.any(|(begin, end)| begin <= ip && ip < end))
    }

    /// Find the country owning `ip`, scanning every group.
    pub fn lookup(&self, ip: Ipv4Addr) -> Option<CountryCode> {
        let ip = u32::from(ip);
        self.groups.iter().find_map(|group| {
            let mut ranges = self.group_ranges(group);
            ranges
                .any(|(begin, end)| begin <= ip && ip < end)
                .then_some(group.country)
        })
    }

    fn group_ranges(&self, group: &Group) -> Ranges<'_> {
        let start = group.offset + GROUP_HEADER_SIZE;
        let end = start + group.count * RANGE_ENTRY_SIZE;
        Ranges {
            data: &self.bin.bytes()[start..end],
        }
    }
}

/// Iterator over the `(begin, end)` ranges of one country.
pub struct Ranges<'a> {
    data: &'a [u8],
}

impl<'a> Iterator for Ranges<'a> {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        let range = decode_range(self.data)?;
        self.data = &self.data[RANGE_ENTRY_SIZE..];
        Some(range)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.data.len() / RANGE_ENTRY_SIZE;
        (len, Some(len))
    }
}

impl ExactSizeIterator for Ranges<'_> {}
