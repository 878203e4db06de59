pub(crate) mod parser;
pub(crate) mod writer;

use serde::{
    Deserialize,
    Serialize,
};

pub(crate) const APP_ALIGNMENT: u64 = 0x10000;
pub(crate) const DATA_ALIGNMENT: u64 = 0x1000;

/// Column names, in file order. ESP-IDF CSV files carry them only as a
/// comment, so they are supplied when deserializing.
const HEADERS: [&str; 6] = ["name", "type", "subtype", "offset", "size", "flags"];

#[derive(Debug, Deserialize, Serialize)]
struct CsvRow {
    name: String,
    #[serde(rename = "type")]
    partition_type: String,
    subtype: String,
    #[serde(default)]
    offset: String,
    size: String,
    #[serde(default)]
    flags: String,
}
