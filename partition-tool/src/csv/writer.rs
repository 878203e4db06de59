use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::{
    Writer,
    WriterBuilder,
};
use esp_partition_table::{
    Flags,
    PartitionTable,
};

use super::CsvRow;
use crate::error::Error;

/// Column header, written as a comment line ahead of the records.
const HEADER_LINE: &str = "# Name,Type,SubType,Offset,Size,Flags\n";

/// Names like `#boot` are quoted so they are not read back as a comment.
fn writer_builder() -> WriterBuilder {
    let mut builder = WriterBuilder::new();
    builder.has_headers(false).comment(Some(b'#'));
    builder
}

/// Serialize a partition table to a CSV file at the given `output_path`.
///
/// Partitions are written in table order with explicit hex offsets and
/// sizes, so the file parses back to the same table.
pub(crate) fn write_csv<P: AsRef<Path>>(
    table: &PartitionTable,
    output_path: P,
) -> Result<(), Error> {
    let mut file = File::create(output_path)?;
    file.write_all(HEADER_LINE.as_bytes())?;
    let mut wtr = writer_builder().from_writer(file);
    write_records(&mut wtr, table)
}

/// Serialize a partition table to CSV and return the content as a `String`.
///
/// See [`write_csv`] for details on ordering and formatting.
pub(crate) fn write_csv_content(table: &PartitionTable) -> Result<String, Error> {
    let mut wtr = writer_builder().from_writer(HEADER_LINE.as_bytes().to_vec());
    write_records(&mut wtr, table)?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| Error::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| Error::InvalidValue(format!("CSV output is not valid UTF-8: {}", e)))
}

fn write_records<W: Write>(wtr: &mut Writer<W>, table: &PartitionTable) -> Result<(), Error> {
    for partition in table {
        wtr.serialize(CsvRow {
            name: partition.name.clone(),
            partition_type: partition.partition_type().name().to_string(),
            subtype: partition.subtype.name().to_string(),
            offset: format!("{:#x}", partition.offset),
            size: format!("{:#x}", partition.size),
            flags: format_flags(partition.flags),
        })?;
    }

    wtr.flush()?;
    Ok(())
}

fn format_flags(flags: Flags) -> String {
    let mut names = Vec::new();
    if flags.contains(Flags::ENCRYPTED) {
        names.push("encrypted".to_string());
    }
    if flags.contains(Flags::READONLY) {
        names.push("readonly".to_string());
    }

    let unnamed = flags.bits() & !(Flags::ENCRYPTED | Flags::READONLY).bits();
    if unnamed != 0 {
        names.push(format!("{:#x}", unnamed));
    }

    names.join(":")
}
