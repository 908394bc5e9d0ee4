pub mod cpu;
pub mod memory;
pub mod network;
pub mod parse;
pub mod storage;
pub mod time;

use serde::{Serialize, Serializer};

pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Number(u64),
    Text(String),
    Unknown,
}

impl Field {
    pub fn as_number(&self) -> Option<u64> {
        match self {
            Field::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Number(v) => serializer.serialize_u64(*v),
            Field::Text(s) => serializer.serialize_str(s),
            Field::Unknown => serializer.serialize_str(UNKNOWN),
        }
    }
}

impl From<u64> for Field {
    fn from(value: u64) -> Self {
        Field::Number(value)
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::Text(value)
    }
}

impl<T: Into<Field>> From<Option<T>> for Field {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Field::Unknown)
    }
}
