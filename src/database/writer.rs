//! Database and index file writer.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use super::format::*;
use crate::table::{CountryStatistics, RangeTable};
use crate::{Error, Result};

/// The two serialized files of a database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedDatabase {
    /// Contents of the database (`.bin`) file
    pub bin: Vec<u8>,
    /// Contents of the index (`.idx`) file
    pub idx: Vec<u8>,
}

/// Writer for the per-country range database.
pub struct DatabaseWriter {
    atomic: bool,
}

impl DatabaseWriter {
    /// Create a writer that replaces existing files atomically.
    pub fn new() -> Self {
        Self { atomic: true }
    }

    /// Choose between staged (atomic) and in-place writes.
    ///
    /// In-place writes truncate the destination files directly, so a crash
    /// between the two writes leaves the pair inconsistent.
    pub fn with_atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    /// Serialize a sorted table and its statistics.
    pub fn encode(&self, table: &RangeTable, statistics: &CountryStatistics) -> Result<EncodedDatabase> {
        if table.is_empty() {
            return Err(Error::EmptyTable);
        }
        if statistics.total() != table.len() {
            return Err(Error::Config(format!(
                "statistics cover {} ranges but the table holds {}",
                statistics.total(),
                table.len()
            )));
        }

        let groups = statistics.groups();
        let bin_size: usize = groups.iter().map(|g| group_size(g.count as usize)).sum();
        let mut bin = Vec::with_capacity(bin_size);
        let mut idx = Vec::with_capacity(groups.len() * INDEX_ENTRY_SIZE);

        let mut table_groups = table.groups();
        for group in groups {
            let (country, entries) = table_groups
                .next()
                .filter(|(country, entries)| {
                    *country == group.country && entries.len() == group.count as usize
                })
                .ok_or_else(|| {
                    Error::Config(format!("statistics do not match table at {}", group.country))
                })?;

            let offset = u32::try_from(bin.len())
                .map_err(|_| Error::Config("database exceeds 4 GiB".to_string()))?;
            IndexEntry { country, offset }.encode(&mut idx);

            GroupHeader {
                country: country.packed(),
                count: group.count,
            }
            .encode(&mut bin);
            for entry in entries {
                encode_range(entry, &mut bin);
            }
        }
        if table_groups.next().is_some() {
            return Err(Error::Config(
                "table has more country groups than the statistics".to_string(),
            ));
        }

        Ok(EncodedDatabase { bin, idx })
    }

    /// Serialize and write both files.
    ///
    /// Nothing is created when the table is empty.
    pub fn write(
        &self,
        table: &RangeTable,
        statistics: &CountryStatistics,
        bin_path: &Path,
        idx_path: &Path,
    ) -> Result<EncodedDatabase> {
        let encoded = self.encode(table, statistics)?;
        self.write_encoded(&encoded, bin_path, idx_path)?;
        Ok(encoded)
    }

    /// Write already serialized files.
    pub fn write_encoded(&self, encoded: &EncodedDatabase, bin_path: &Path, idx_path: &Path) -> Result<()> {
        if encoded.bin.is_empty() {
            return Err(Error::EmptyTable);
        }

        if self.atomic {
            let bin_file = stage(bin_path, &encoded.bin)?;
            let idx_file = stage(idx_path, &encoded.idx)?;
            bin_file.persist(bin_path).map_err(|e| Error::Io(e.error))?;
            idx_file.persist(idx_path).map_err(|e| Error::Io(e.error))?;
        } else {
            let mut bin_file = fs::File::create(bin_path)?;
            bin_file.write_all(&encoded.bin)?;
            let mut idx_file = fs::File::create(idx_path)?;
            idx_file.write_all(&encoded.idx)?;
        }

        log::info!(
            "Wrote {:?} ({} bytes) and {:?} ({} bytes)",
            bin_path,
            encoded.bin.len(),
            idx_path,
            encoded.idx.len()
        );
        Ok(())
    }
}

impl Default for DatabaseWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `data` to a temp file next to `path`, ready to be renamed over it.
///
/// The staged file gets the mode `File::create` would give a new file, or
/// the mode of the file it replaces.
fn stage(path: &Path, data: &[u8]) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(".geoipdb");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // umask applies, as for File::create
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut file = builder.tempfile_in(dir)?;

    file.write_all(data)?;
    file.as_file().sync_all()?;
    if let Ok(existing) = fs::metadata(path) {
        file.as_file().set_permissions(existing.permissions())?;
    }
    Ok(file)
}
