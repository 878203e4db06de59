//! The closed registry of partition types and subtypes understood by the ESP-IDF bootloader.
//!
//! Every subtype is scoped to its parent type: the same byte means different things for `app`
//! and `data` partitions, so a [`SubType`] always carries its namespace.

use crate::error::Error;
use core::fmt;
use core::str::FromStr;
use strum::IntoEnumIterator;

#[derive(
    strum::FromRepr,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::Display,
    strum::EnumIter,
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum PartitionType {
    App = 0x00,
    Data = 0x01,
}

impl PartitionType {
    pub fn from_byte(byte: u8) -> Result<Self, Error> {
        Self::from_repr(byte).ok_or(Error::UnknownType(byte))
    }

    pub fn from_name(name: &str) -> Result<Self, Error> {
        Self::from_str(name).map_err(|_| Error::UnknownTypeName)
    }

    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

#[derive(
    strum::FromRepr,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum AppSubType {
    Factory = 0x00,
    Test = 0x20,
    #[strum(to_string = "ota_0")]
    Ota0 = 0x10,
    #[strum(to_string = "ota_1")]
    Ota1 = 0x11,
    #[strum(to_string = "ota_2")]
    Ota2 = 0x12,
    #[strum(to_string = "ota_3")]
    Ota3 = 0x13,
    #[strum(to_string = "ota_4")]
    Ota4 = 0x14,
    #[strum(to_string = "ota_5")]
    Ota5 = 0x15,
    #[strum(to_string = "ota_6")]
    Ota6 = 0x16,
    #[strum(to_string = "ota_7")]
    Ota7 = 0x17,
    #[strum(to_string = "ota_8")]
    Ota8 = 0x18,
    #[strum(to_string = "ota_9")]
    Ota9 = 0x19,
    #[strum(to_string = "ota_10")]
    Ota10 = 0x1A,
    #[strum(to_string = "ota_11")]
    Ota11 = 0x1B,
    #[strum(to_string = "ota_12")]
    Ota12 = 0x1C,
    #[strum(to_string = "ota_13")]
    Ota13 = 0x1D,
    #[strum(to_string = "ota_14")]
    Ota14 = 0x1E,
    #[strum(to_string = "ota_15")]
    Ota15 = 0x1F,
}

#[derive(
    strum::FromRepr,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum DataSubType {
    Ota = 0x00,
    Phy = 0x01,
    Nvs = 0x02,
    Coredump = 0x03,
    NvsKeys = 0x04,
    Efuse = 0x05,
    Esphttpd = 0x80,
    Fat = 0x81,
    Spiffs = 0x82,
}

/// A registered subtype together with the partition type it belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubType {
    App(AppSubType),
    Data(DataSubType),
}

impl SubType {
    pub const fn partition_type(self) -> PartitionType {
        match self {
            SubType::App(_) => PartitionType::App,
            SubType::Data(_) => PartitionType::Data,
        }
    }

    pub const fn to_byte(self) -> u8 {
        match self {
            SubType::App(subtype) => subtype as u8,
            SubType::Data(subtype) => subtype as u8,
        }
    }

    /// Resolves a subtype byte within the namespace of `partition_type`.
    pub fn from_byte(partition_type: PartitionType, subtype: u8) -> Result<Self, Error> {
        let resolved = match partition_type {
            PartitionType::App => AppSubType::from_repr(subtype).map(SubType::App),
            PartitionType::Data => DataSubType::from_repr(subtype).map(SubType::Data),
        };

        resolved.ok_or(Error::UnknownSubType {
            partition_type,
            subtype,
        })
    }

    /// Resolves a subtype name within the namespace of `partition_type`.
    pub fn from_name(partition_type: PartitionType, name: &str) -> Result<Self, Error> {
        let resolved = match partition_type {
            PartitionType::App => AppSubType::from_str(name).map(SubType::App),
            PartitionType::Data => DataSubType::from_str(name).map(SubType::Data),
        };

        resolved.map_err(|_| Error::UnknownSubTypeName(partition_type))
    }

    pub fn name(self) -> &'static str {
        match self {
            SubType::App(subtype) => subtype.into(),
            SubType::Data(subtype) => subtype.into(),
        }
    }

    /// The subtype a partition falls back to when its type is changed.
    pub const fn default_for(partition_type: PartitionType) -> Self {
        match partition_type {
            PartitionType::App => SubType::App(AppSubType::Factory),
            PartitionType::Data => SubType::Data(DataSubType::Ota),
        }
    }

    /// All registered subtypes of `partition_type`, in registry order.
    pub fn iter(partition_type: PartitionType) -> impl Iterator<Item = SubType> {
        let (app, data) = match partition_type {
            PartitionType::App => (Some(AppSubType::iter().map(SubType::App)), None),
            PartitionType::Data => (None, Some(DataSubType::iter().map(SubType::Data))),
        };

        app.into_iter().flatten().chain(data.into_iter().flatten())
    }
}

impl From<AppSubType> for SubType {
    fn from(subtype: AppSubType) -> Self {
        SubType::App(subtype)
    }
}

impl From<DataSubType> for SubType {
    fn from(subtype: DataSubType) -> Self {
        SubType::Data(subtype)
    }
}

impl fmt::Display for SubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}
