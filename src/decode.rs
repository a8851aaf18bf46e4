//! Packed row decoding and result assembly
//!
//! A result row travels as one base64 blob holding the concatenation of
//! every non-null column's raw bytes, plus a parallel array of decimal
//! byte-lengths. Decoding walks the length array left to right, carving
//! spans out of the blob; a negative length marks a NULL column that
//! consumed no bytes.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{DatabaseError, DriverResult};
use crate::types::{Field, Row, RowMode, Value};
use crate::wire::QueryResultRow;

/// Splits a decoded `values` buffer into per-column byte spans.
///
/// Trailing unconsumed bytes are not an error; the gateway is allowed to
/// over-deliver. A span extending past the buffer is a fatal decode error.
pub fn decode_row<'a>(lengths: &[String], values: &'a [u8]) -> DriverResult<Vec<Option<&'a [u8]>>> {
    let mut spans = Vec::with_capacity(lengths.len());
    let mut offset = 0usize;

    for length in lengths {
        let width = length.parse::<i64>().map_err(|e| {
            DatabaseError::decode(format!("invalid column length `{length}`: {e}"))
        })?;
        if width < 0 {
            spans.push(None);
            continue;
        }
        let width = width as usize;
        let end = offset
            .checked_add(width)
            .filter(|end| *end <= values.len())
            .ok_or_else(|| {
                DatabaseError::decode(format!(
                    "column span {offset}..{} overruns row data of {} bytes",
                    offset + width,
                    values.len()
                ))
            })?;
        spans.push(Some(&values[offset..end]));
        offset = end;
    }

    Ok(spans)
}

/// Decodes and casts every packed row into the requested row shape.
pub(crate) fn decode_rows(
    fields: &[Field],
    wire_rows: &[QueryResultRow],
    mode: RowMode,
    cast_fn: &dyn Fn(&Field, Option<&[u8]>) -> DriverResult<Value>,
) -> DriverResult<Vec<Row>> {
    wire_rows
        .iter()
        .map(|wire_row| decode_one(fields, wire_row, mode, cast_fn))
        .collect()
}

fn decode_one(
    fields: &[Field],
    wire_row: &QueryResultRow,
    mode: RowMode,
    cast_fn: &dyn Fn(&Field, Option<&[u8]>) -> DriverResult<Value>,
) -> DriverResult<Row> {
    // An absent blob means no column contributed bytes (all NULL, or a
    // zero-row result).
    let values = match &wire_row.values {
        Some(blob) => STANDARD
            .decode(blob)
            .map_err(|e| DatabaseError::decode(format!("invalid base64 row data: {e}")))?,
        None => Vec::new(),
    };
    let spans = decode_row(&wire_row.lengths, &values)?;

    match mode {
        RowMode::Object => {
            let mut columns = std::collections::HashMap::with_capacity(fields.len());
            for (field, span) in fields.iter().zip(spans) {
                columns.insert(field.name.clone(), cast_fn(field, span)?);
            }
            Ok(Row::Object(columns))
        }
        RowMode::Array => {
            let mut values = Vec::with_capacity(fields.len());
            for (field, span) in fields.iter().zip(spans) {
                values.push(cast_fn(field, span)?);
            }
            Ok(Row::Array(values))
        }
    }
}
