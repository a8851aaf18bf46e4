//! Column type casting
//!
//! Maps a (declared column type, charset, decoded byte span) triple to a
//! typed [`Value`]. The dispatch mirrors the upstream database's wire type
//! semantics: 64-bit integrals, temporals, and decimals stay as exact text
//! so no precision is lost before the caller chooses a representation.

use std::sync::Arc;

use crate::error::{DatabaseError, DriverResult};
use crate::text::decode_utf8;
use crate::types::{Field, TypeTag, Value};

/// Collation id marking a column's bytes as opaque rather than
/// text-decodable.
pub const BINARY_CHARSET: i32 = 63;

/// A caster that fully replaces the default dispatch, per connection or per
/// call. When both are supplied, the per-call override wins.
pub type CastFn = Arc<dyn Fn(&Field, Option<&[u8]>) -> DriverResult<Value> + Send + Sync>;

impl TypeTag {
    /// 64-bit integrals stay as decimal text; widening is left to the
    /// caller so no precision is lost on the way through `f64`-unsafe
    /// representations.
    pub fn is_wide_integral(self) -> bool {
        matches!(self, Self::Int64 | Self::UInt64)
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::Datetime | Self::Timestamp)
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int24
                | Self::Int32
                | Self::UInt8
                | Self::UInt16
                | Self::UInt24
                | Self::UInt32
                | Self::Year
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Type tags whose bytes are opaque when paired with the binary
    /// charset.
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            Self::Blob | Self::Bit | Self::Varbinary | Self::Binary | Self::Geometry
        )
    }
}

fn is_binary_column(field: &Field) -> bool {
    field.charset == Some(BINARY_CHARSET) && field.ty.is_binary()
}

/// Casts one decoded column span to a typed value.
///
/// `None` propagates as `Value::Null` regardless of declared type. An empty
/// span short-circuits before type dispatch: binary columns yield an empty
/// byte array, everything else an empty string, both distinct from NULL.
pub fn cast(field: &Field, span: Option<&[u8]>) -> DriverResult<Value> {
    let bytes = match span {
        None => return Ok(Value::Null),
        Some(bytes) => bytes,
    };

    if bytes.is_empty() {
        if is_binary_column(field) {
            return Ok(Value::Bytes(Vec::new()));
        }
        return Ok(Value::Text(String::new()));
    }

    if field.ty.is_wide_integral() || field.ty.is_temporal() || field.ty == TypeTag::Decimal {
        return Ok(Value::Text(decode_utf8(bytes)));
    }

    if field.ty == TypeTag::Json {
        let document = serde_json::from_slice(bytes).map_err(|e| {
            DatabaseError::decode(format!("invalid JSON in column `{}`: {e}", field.name))
        })?;
        return Ok(Value::Json(document));
    }

    if field.ty.is_integral() {
        let text = numeric_text(field, bytes)?;
        let parsed = text.parse::<i64>().map_err(|e| {
            DatabaseError::decode(format!("invalid integer `{text}` in column `{}`: {e}", field.name))
        })?;
        return Ok(Value::Int(parsed));
    }

    if field.ty.is_float() {
        let text = numeric_text(field, bytes)?;
        let parsed = text.parse::<f64>().map_err(|e| {
            DatabaseError::decode(format!("invalid float `{text}` in column `{}`: {e}", field.name))
        })?;
        return Ok(Value::Float(parsed));
    }

    if is_binary_column(field) {
        return Ok(Value::Bytes(bytes.to_vec()));
    }

    // Everything else is text, including binary-charset columns carrying
    // text (e.g. identifier-returning system columns).
    Ok(Value::Text(decode_utf8(bytes)))
}

fn numeric_text<'a>(field: &Field, bytes: &'a [u8]) -> DriverResult<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| {
        DatabaseError::decode(format!("non-UTF-8 numeric text in column `{}`: {e}", field.name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_field(name: &str, ty: TypeTag) -> Field {
        Field {
            charset: Some(BINARY_CHARSET),
            ..Field::typed(name, ty)
        }
    }

    #[test]
    fn casts_null_spans() {
        let field = Field::typed("email", TypeTag::Varchar);
        assert_eq!(cast(&field, None).unwrap(), Value::Null);
    }

    #[test]
    fn casts_null_regardless_of_declared_type() {
        for ty in [TypeTag::Int64, TypeTag::Json, TypeTag::Blob, TypeTag::Null] {
            assert_eq!(cast(&Field::typed("c", ty), None).unwrap(), Value::Null);
        }
    }

    #[test]
    fn casts_wide_integrals_to_text() {
        let field = Field::typed("id", TypeTag::UInt64);
        assert_eq!(
            cast(&field, Some(b"18446744073709551615")).unwrap(),
            Value::Text("18446744073709551615".to_string())
        );
        let field = Field::typed("id", TypeTag::Int64);
        assert_eq!(cast(&field, Some(b"1")).unwrap(), Value::Text("1".to_string()));
    }

    #[test]
    fn casts_temporals_to_text() {
        let field = Field::typed("created_at", TypeTag::Datetime);
        assert_eq!(
            cast(&field, Some(b"2024-01-01 00:00:00")).unwrap(),
            Value::Text("2024-01-01 00:00:00".to_string())
        );
    }

    #[test]
    fn casts_decimals_to_text() {
        let field = Field::typed("price", TypeTag::Decimal);
        assert_eq!(cast(&field, Some(b"5.4")).unwrap(), Value::Text("5.4".to_string()));
    }

    #[test]
    fn casts_json_documents() {
        let field = Field::typed("metadata", TypeTag::Json);
        assert_eq!(
            cast(&field, Some(br#"{ "color": "blue" }"#)).unwrap(),
            Value::Json(serde_json::json!({ "color": "blue" }))
        );
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let field = Field::typed("metadata", TypeTag::Json);
        let err = cast(&field, Some(b"{ not json")).unwrap_err();
        assert!(matches!(err, DatabaseError::Decode { .. }));
    }

    #[test]
    fn casts_small_integrals_to_numbers() {
        assert_eq!(
            cast(&Field::typed("verified", TypeTag::Int8), Some(b"1")).unwrap(),
            Value::Int(1)
        );
        assert_eq!(
            cast(&Field::typed("age", TypeTag::Int32), Some(b"21")).unwrap(),
            Value::Int(21)
        );
        assert_eq!(
            cast(&Field::typed("year", TypeTag::Year), Some(b"2006")).unwrap(),
            Value::Int(2006)
        );
    }

    #[test]
    fn malformed_integer_is_a_decode_error() {
        let err = cast(&Field::typed("n", TypeTag::Int32), Some(b"12abc")).unwrap_err();
        assert!(matches!(err, DatabaseError::Decode { .. }));
    }

    #[test]
    fn casts_floats_to_numbers() {
        assert_eq!(
            cast(&Field::typed("f", TypeTag::Float32), Some(b"2.32")).unwrap(),
            Value::Float(2.32)
        );
        assert_eq!(
            cast(&Field::typed("d", TypeTag::Float64), Some(b"101.4")).unwrap(),
            Value::Float(101.4)
        );
    }

    #[test]
    fn casts_binary_columns_to_bytes() {
        assert_eq!(
            cast(&binary_field("blob", TypeTag::Blob), Some(&[197])).unwrap(),
            Value::Bytes(vec![197])
        );
        assert_eq!(
            cast(&binary_field("raw", TypeTag::Varbinary), Some(&[197])).unwrap(),
            Value::Bytes(vec![197])
        );
    }

    #[test]
    fn casts_binary_typed_text_columns_to_text() {
        // VARBINARY carrying a text charset decodes as text.
        let field = Field {
            charset: Some(255),
            ..Field::typed("name", TypeTag::Varbinary)
        };
        assert_eq!(cast(&field, Some(b"table")).unwrap(), Value::Text("table".to_string()));
    }

    #[test]
    fn wide_integral_wins_over_binary_charset() {
        let field = binary_field("id", TypeTag::Int64);
        assert_eq!(cast(&field, Some(b"1")).unwrap(), Value::Text("1".to_string()));
    }

    #[test]
    fn empty_span_rules() {
        assert_eq!(
            cast(&binary_field("blob", TypeTag::Blob), Some(b"")).unwrap(),
            Value::Bytes(Vec::new())
        );
        assert_eq!(
            cast(&Field::typed("s", TypeTag::Varchar), Some(b"")).unwrap(),
            Value::Text(String::new())
        );
        // Empty short-circuits before numeric parsing.
        assert_eq!(
            cast(&Field::typed("n", TypeTag::Int32), Some(b"")).unwrap(),
            Value::Text(String::new())
        );
    }

    #[test]
    fn casts_text_types_to_strings() {
        assert_eq!(
            cast(&Field::typed("email", TypeTag::Varchar), Some(b"user@example.com")).unwrap(),
            Value::Text("user@example.com".to_string())
        );
        assert_eq!(
            cast(&Field::typed("tags", TypeTag::Set), Some(b"foo,bar")).unwrap(),
            Value::Text("foo,bar".to_string())
        );
    }

    #[test]
    fn cast_is_idempotent_over_identical_inputs() {
        let field = binary_field("g", TypeTag::Geometry);
        let span: &[u8] = &[0, 1, 2, 3];
        assert_eq!(cast(&field, Some(span)).unwrap(), cast(&field, Some(span)).unwrap());
    }
}
