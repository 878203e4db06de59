use esp_partition_table::{
    Flags,
    Partition,
    PartitionTable,
    PartitionType,
    SubType,
    MAX_NAME_LENGTH,
    PARTITION_TABLE_OFFSET,
};

use super::{
    CsvRow,
    APP_ALIGNMENT,
    DATA_ALIGNMENT,
    HEADERS,
};
use crate::error::Error;

/// Parse ESP-IDF partition CSV content from a string into a [`PartitionTable`].
///
/// Partitions without an offset are placed directly after the previous one,
/// aligned to 64 KiB for app partitions and 4 KiB for data partitions. The
/// first free address is the sector following the partition table.
pub(crate) fn parse_csv(content: &str) -> Result<PartitionTable, Error> {
    let mut table = PartitionTable::new();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers = csv::StringRecord::from(HEADERS.to_vec());
    let mut next_offset = u64::from(PARTITION_TABLE_OFFSET) + 0x1000;

    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |pos| pos.line());
        let row: CsvRow = record.deserialize(Some(&headers))?;

        let partition = parse_row(row, line, next_offset)?;
        next_offset = partition.end();
        table.push(partition);
    }

    Ok(table)
}

fn parse_row(row: CsvRow, line: u64, next_offset: u64) -> Result<Partition, Error> {
    validate_name(&row.name, line)?;

    let partition_type = parse_type(&row.partition_type).ok_or_else(|| Error::InvalidType {
        line,
        value: row.partition_type.clone(),
    })?;
    let subtype =
        parse_subtype(partition_type, &row.subtype).ok_or_else(|| Error::InvalidSubType {
            line,
            value: row.subtype.clone(),
        })?;

    let offset = if row.offset.is_empty() {
        let alignment = match partition_type {
            PartitionType::App => APP_ALIGNMENT,
            PartitionType::Data => DATA_ALIGNMENT,
        };
        next_offset.next_multiple_of(alignment)
    } else {
        parse_number(&row.offset).ok_or_else(|| invalid_number(line, "offset", &row.offset))?
    };
    let offset =
        u32::try_from(offset).map_err(|_| invalid_number(line, "offset", &offset.to_string()))?;

    let size = parse_number(&row.size)
        .and_then(|size| u32::try_from(size).ok())
        .ok_or_else(|| invalid_number(line, "size", &row.size))?;

    let flags = parse_flags(&row.flags, line)?;

    Ok(Partition::new(subtype, offset, size, row.name).with_flags(flags))
}

fn validate_name(name: &str, line: u64) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::InvalidName {
            line,
            reason: "name must not be empty".to_string(),
        });
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(Error::InvalidName {
            line,
            reason: format!(
                "name '{}' is too long (max {} bytes)",
                name, MAX_NAME_LENGTH
            ),
        });
    }
    Ok(())
}

/// Types may be given by name or as a number, e.g. `data` or `0x01`.
fn parse_type(value: &str) -> Option<PartitionType> {
    match parse_number(value) {
        Some(code) => PartitionType::from_byte(u8::try_from(code).ok()?).ok(),
        None => PartitionType::from_name(value).ok(),
    }
}

fn parse_subtype(partition_type: PartitionType, value: &str) -> Option<SubType> {
    match parse_number(value) {
        Some(code) => SubType::from_byte(partition_type, u8::try_from(code).ok()?).ok(),
        None => SubType::from_name(partition_type, value).ok(),
    }
}

/// Flags are a colon separated list of `encrypted`, `readonly` and raw
/// numbers for bits without a name.
fn parse_flags(value: &str, line: u64) -> Result<Flags, Error> {
    let mut flags = Flags::NONE;

    for flag in value.split(':').map(str::trim).filter(|f| !f.is_empty()) {
        flags |= match flag {
            "encrypted" => Flags::ENCRYPTED,
            "readonly" => Flags::READONLY,
            _ => parse_number(flag)
                .and_then(|bits| u32::try_from(bits).ok())
                .map(Flags)
                .ok_or_else(|| Error::InvalidFlag {
                    line,
                    value: flag.to_string(),
                })?,
        };
    }

    Ok(flags)
}

/// Parse a decimal or `0x` prefixed hex number with an optional `K` or `M`
/// suffix.
pub(crate) fn parse_number(value: &str) -> Option<u64> {
    let (digits, multiplier) = match value.as_bytes().last()? {
        b'K' | b'k' => (&value[..value.len() - 1], 1024),
        b'M' | b'm' => (&value[..value.len() - 1], 1024 * 1024),
        _ => (value, 1),
    };

    let number = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u64>().ok()?
    };

    number.checked_mul(multiplier)
}

fn invalid_number(line: u64, field: &'static str, value: &str) -> Error {
    Error::InvalidNumber {
        line,
        field,
        value: value.to_string(),
    }
}
