//! Wire shapes exchanged with the gateway
//!
//! Every request is POSTed as a JSON body and every response comes back as
//! JSON. Fields the gateway omits (empty results, zero counts) are modeled
//! with `Option` + defaults rather than required keys.

use serde::{Deserialize, Serialize};

use crate::error::ErrorBody;
use crate::types::Field;

/// Opaque session token. The driver stores and replays it verbatim; its
/// structure is never inspected.
pub type Session = serde_json::Value;

/// Body of an Execute request.
///
/// `session` serializes as an explicit `null` on the first request of a
/// connection so the gateway allocates one.
#[derive(Debug, Serialize)]
pub struct ExecuteRequest<'a> {
    pub query: &'a str,
    pub session: Option<&'a Session>,
}

/// One packed result row: a parallel array of decimal byte-lengths and a
/// base64 blob holding the concatenated raw bytes of every non-null column.
/// A negative length marks a NULL column; `values` is absent when no column
/// contributed bytes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResultRow {
    #[serde(default)]
    pub lengths: Vec<String>,
    #[serde(default)]
    pub values: Option<String>,
}

/// Result payload of a successful Execute.
///
/// `rowsAffected`/`insertId` travel as decimal strings to avoid 64-bit
/// precision loss in JSON numbers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    #[serde(default)]
    pub fields: Option<Vec<Field>>,
    #[serde(default)]
    pub rows: Option<Vec<QueryResultRow>>,
    #[serde(default)]
    pub rows_affected: Option<String>,
    #[serde(default)]
    pub insert_id: Option<String>,
}

/// Top-level Execute/CreateSession response.
///
/// Exactly one of `result`/`error` is meaningful; error responses
/// short-circuit with no row data. `timing` is server-reported elapsed
/// seconds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryExecuteResponse {
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub result: Option<QueryResult>,
    #[serde(default)]
    pub error: Option<ErrorBody>,
    #[serde(default)]
    pub timing: Option<f64>,
}
