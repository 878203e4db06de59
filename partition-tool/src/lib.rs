//! ESP-IDF compatible partition table CSV parser and binary generator.
//!
//! The binary format is handled by [`esp_partition_table`]; this crate adds
//! the file based workflows of `gen_esp32part.py`: CSV to binary, binary to
//! CSV.

pub mod error;

mod csv;

use std::fs;
use std::io::Write;
use std::path::Path;

pub use error::Error;
pub use esp_partition_table::{
    DecodeOptions,
    Flags,
    Partition,
    PartitionTable,
    PartitionType,
    SubType,
    MD5_DIGEST_SIZE,
    MD5_MAGIC,
    PARTITION_TABLE_OFFSET,
    SLOT_SIZE,
    TABLE_LENGTH,
};

/// File based conversions of a [`PartitionTable`].
pub trait PartitionTableFiles: Sized {
    /// Parse ESP-IDF partition CSV content from a string.
    fn from_csv(content: &str) -> Result<Self, Error>;

    /// Parse the ESP-IDF partition CSV file at the given `path`.
    fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Self, Error>;

    /// Serialize the table to CSV and return the content as a `String`.
    fn to_csv(&self) -> Result<String, Error>;

    /// Serialize the table to a CSV file at the given `path`.
    fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error>;

    /// Encode the table and write the `TABLE_LENGTH` byte image to `path`.
    fn generate_partition_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error>;

    /// Decode a binary table read from `path`.
    ///
    /// `offset` is the position of the table within the file: `0` for a
    /// plain table image, `PARTITION_TABLE_OFFSET` for a full flash dump.
    fn parse_partition_file<P: AsRef<Path>>(
        path: P,
        offset: usize,
        options: DecodeOptions,
    ) -> Result<Self, Error>;
}

impl PartitionTableFiles for PartitionTable {
    fn from_csv(content: &str) -> Result<Self, Error> {
        csv::parser::parse_csv(content)
    }

    fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = fs::read_to_string(&path)?;
        csv::parser::parse_csv(&content)
    }

    fn to_csv(&self) -> Result<String, Error> {
        csv::writer::write_csv_content(self)
    }

    fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        csv::writer::write_csv(self, path)
    }

    fn generate_partition_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let data = self.encode()?;
        fs::File::create(path)?.write_all(&data)?;
        Ok(())
    }

    fn parse_partition_file<P: AsRef<Path>>(
        path: P,
        offset: usize,
        options: DecodeOptions,
    ) -> Result<Self, Error> {
        let data = fs::read(path)?;
        let region = data.get(offset..).ok_or_else(|| {
            Error::InvalidValue(format!(
                "offset {:#x} is beyond the end of the file ({} bytes)",
                offset,
                data.len()
            ))
        })?;
        let end = region.len().min(TABLE_LENGTH);
        Ok(PartitionTable::decode_with(&region[..end], options)?)
    }
}

/// Parse a decimal or `0x` prefixed hex number, optionally with a `K` or
/// `M` suffix, as used for offsets and sizes in partition CSV files.
pub fn parse_size(value: &str) -> Option<u64> {
    csv::parser::parse_number(value.trim())
}

/// The MD5 digest the encoded table carries in its trailer slot.
pub fn table_digest(table: &PartitionTable) -> Result<[u8; MD5_DIGEST_SIZE], Error> {
    let data = table.encode()?;
    let start = table.len() * SLOT_SIZE + MD5_MAGIC.len();
    let mut digest = [0u8; MD5_DIGEST_SIZE];
    digest.copy_from_slice(&data[start..start + MD5_DIGEST_SIZE]);
    Ok(digest)
}
