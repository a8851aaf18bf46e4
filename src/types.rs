//! Universal data types for the gateway driver
//!
//! These types provide a typed representation of the gateway's wire
//! concepts: column metadata, decoded column values, and the public result
//! of one execution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Column type tag, mirroring the upstream database's wire type set.
///
/// Modeled as a closed enum so an unknown tag fails deserialization loudly
/// instead of silently falling through to text decoding. A zero-valued type
/// is omitted from the JSON encoding entirely, so an absent tag defaults to
/// `Null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    #[serde(rename = "INT8")]
    Int8,
    #[serde(rename = "INT16")]
    Int16,
    #[serde(rename = "INT24")]
    Int24,
    #[serde(rename = "INT32")]
    Int32,
    #[serde(rename = "INT64")]
    Int64,
    #[serde(rename = "UINT8")]
    UInt8,
    #[serde(rename = "UINT16")]
    UInt16,
    #[serde(rename = "UINT24")]
    UInt24,
    #[serde(rename = "UINT32")]
    UInt32,
    #[serde(rename = "UINT64")]
    UInt64,
    #[serde(rename = "FLOAT32")]
    Float32,
    #[serde(rename = "FLOAT64")]
    Float64,
    #[serde(rename = "DECIMAL")]
    Decimal,
    #[serde(rename = "YEAR")]
    Year,
    #[serde(rename = "DATE")]
    Date,
    #[serde(rename = "TIME")]
    Time,
    #[serde(rename = "DATETIME")]
    Datetime,
    #[serde(rename = "TIMESTAMP")]
    Timestamp,
    #[serde(rename = "CHAR")]
    Char,
    #[serde(rename = "VARCHAR")]
    Varchar,
    #[serde(rename = "TEXT")]
    Text,
    #[serde(rename = "ENUM")]
    Enum,
    #[serde(rename = "SET")]
    Set,
    #[serde(rename = "JSON")]
    Json,
    #[serde(rename = "BLOB")]
    Blob,
    #[serde(rename = "BIT")]
    Bit,
    #[serde(rename = "BINARY")]
    Binary,
    #[serde(rename = "VARBINARY")]
    Varbinary,
    #[serde(rename = "GEOMETRY")]
    Geometry,
    #[default]
    #[serde(rename = "NULL")]
    Null,
}

/// Column metadata as reported by the gateway.
///
/// `orgTable`/`database`/`orgName` are only populated for included fields.
/// Immutable once received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(default)]
    pub name: String,

    /// Declared column type; backfilled to `NULL` when the wire response
    /// omits it (the JSON encoder drops zero-valued enums).
    #[serde(rename = "type", default)]
    pub ty: TypeTag,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
}

impl Field {
    /// Shorthand for a field carrying only a name and type tag.
    pub fn typed(name: impl Into<String>, ty: TypeTag) -> Self {
        Self {
            name: name.into(),
            ty,
            ..Self::default()
        }
    }
}

/// Decoded column value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
    Json(serde_json::Value),
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Row shape selected per execute call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowMode {
    /// Rows as field-name → value mappings
    #[default]
    Object,
    /// Rows as positional value sequences
    Array,
}

/// A single decoded result row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Row {
    Object(HashMap<String, Value>),
    Array(Vec<Value>),
}

impl Row {
    /// Looks up a column by name (object-mode rows only).
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Object(columns) => columns.get(name),
            Self::Array(_) => None,
        }
    }

    /// Looks up a column by position (array-mode rows only).
    pub fn at(&self, index: usize) -> Option<&Value> {
        match self {
            Self::Object(_) => None,
            Self::Array(values) => values.get(index),
        }
    }
}

/// Public result of one execution
#[derive(Debug, Clone, Serialize)]
pub struct ExecutedQuery {
    /// Column names, in field order
    pub headers: Vec<String>,
    /// Column name → declared type tag
    pub types: HashMap<String, TypeTag>,
    /// Full column metadata, type-backfilled
    pub fields: Vec<Field>,
    /// Decoded rows
    pub rows: Vec<Row>,
    /// Rows affected by a mutation; 0 when not reported
    pub rows_affected: u64,
    /// Last insert id as a decimal string, preserving 64-bit precision;
    /// "0" when not reported
    pub insert_id: String,
    /// Number of decoded rows
    pub size: usize,
    /// The literal SQL sent to the gateway
    pub statement: String,
    /// Elapsed milliseconds: server-reported when present, else wall-clock
    pub time: f64,
}
