//! SQL value sanitization
//!
//! Substitutes positional (`?`) or named (`:name`) placeholders in a SQL
//! template with escaped literal representations of typed parameter values.
//! The gateway receives only literal SQL; this is the sole line of defense
//! between caller-supplied values and the statement text, so the escape
//! table matches the upstream database's accepted escape set byte for byte.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;

/// A bindable parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Exact decimal, rendered unquoted without binary-float rounding
    Decimal(Decimal),
    Text(String),
    /// Rendered as a hex literal `x'..'`
    Bytes(Vec<u8>),
    /// Rendered as quoted ISO-8601 text with millisecond precision
    DateTime(NaiveDateTime),
    /// Elements sanitized independently and joined with `, ` for `IN (...)`
    List(Vec<Param>),
}

impl Param {
    /// Binds any displayable value as its text conversion.
    pub fn stringable(value: impl ToString) -> Self {
        Self::Text(value.to_string())
    }

    /// Binds a list of values, e.g. for `IN (...)` clauses.
    pub fn list<I, P>(values: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i8> for Param {
    fn from(value: i8) -> Self {
        Self::Int(value as i64)
    }
}

impl From<i16> for Param {
    fn from(value: i16) -> Self {
        Self::Int(value as i64)
    }
}

impl From<i32> for Param {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u8> for Param {
    fn from(value: u8) -> Self {
        Self::UInt(value as u64)
    }
}

impl From<u16> for Param {
    fn from(value: u16) -> Self {
        Self::UInt(value as u64)
    }
}

impl From<u32> for Param {
    fn from(value: u32) -> Self {
        Self::UInt(value as u64)
    }
}

impl From<u64> for Param {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<f32> for Param {
    fn from(value: f32) -> Self {
        Self::Float(value as f64)
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Decimal> for Param {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for Param {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for Param {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<NaiveDateTime> for Param {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<DateTime<Utc>> for Param {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value.naive_utc())
    }
}

impl From<NaiveDate> for Param {
    fn from(value: NaiveDate) -> Self {
        Self::Text(value.format("%Y-%m-%d").to_string())
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Param::Null)
    }
}

/// Parameters for one execute call: nothing, a positional list, or a named
/// map.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Params {
    #[default]
    None,
    Positional(Vec<Param>),
    Named(HashMap<String, Param>),
}

impl Params {
    pub fn positional<I, P>(values: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        Self::Positional(values.into_iter().map(Into::into).collect())
    }

    pub fn named<I, K, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<Param>,
    {
        Self::Named(
            entries
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<()> for Params {
    fn from(_: ()) -> Self {
        Self::None
    }
}

impl<P: Into<Param>> From<Vec<P>> for Params {
    fn from(values: Vec<P>) -> Self {
        Self::positional(values)
    }
}

impl<P: Into<Param>, const N: usize> From<[P; N]> for Params {
    fn from(values: [P; N]) -> Self {
        Self::positional(values)
    }
}

impl<K: Into<String>, P: Into<Param>> From<HashMap<K, P>> for Params {
    fn from(entries: HashMap<K, P>) -> Self {
        Self::named(entries)
    }
}

/// Substitutes placeholders in `query` with escaped literals.
///
/// Positional mode consumes arguments left to right; `?` beyond the
/// argument count are left untouched. Named mode replaces every `:name`
/// occurrence whose key is present and leaves the rest untouched. The
/// template is scanned in a single pass, so placeholder-like text inside a
/// substituted value is never re-expanded.
pub fn format(query: &str, params: &Params) -> String {
    match params {
        Params::None => query.to_string(),
        Params::Positional(values) => format_positional(query, values),
        Params::Named(values) => format_named(query, values),
    }
}

fn format_positional(query: &str, values: &[Param]) -> String {
    let mut out = String::with_capacity(query.len());
    let mut next = 0;
    for ch in query.chars() {
        if ch == '?' && next < values.len() {
            out.push_str(&sanitize(&values[next]));
            next += 1;
        } else {
            out.push(ch);
        }
    }
    out
}

fn format_named(query: &str, values: &HashMap<String, Param>) -> String {
    let mut out = String::with_capacity(query.len());
    let mut rest = query;
    while let Some(colon) = rest.find(':') {
        out.push_str(&rest[..colon]);
        let after = &rest[colon + 1..];
        let name_len = after
            .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .unwrap_or(after.len());
        let name = &after[..name_len];
        match values.get(name) {
            Some(value) if !name.is_empty() => {
                out.push_str(&sanitize(value));
            }
            _ => {
                out.push(':');
                out.push_str(name);
            }
        }
        rest = &after[name_len..];
    }
    out.push_str(rest);
    out
}

/// Renders a single parameter as a literal SQL fragment.
pub fn sanitize(value: &Param) -> String {
    match value {
        Param::Null => "null".to_string(),
        Param::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        Param::Int(n) => n.to_string(),
        Param::UInt(n) => n.to_string(),
        Param::Float(f) => f.to_string(),
        Param::Decimal(d) => d.to_string(),
        Param::Text(text) => quote(text),
        Param::Bytes(bytes) => format!("x'{}'", hex::encode(bytes)),
        Param::DateTime(dt) => quote(&dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()),
        Param::List(items) => items.iter().map(sanitize).collect::<Vec<_>>().join(", "),
    }
}

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for ch in text.chars() {
        match ch {
            '\0' => quoted.push_str("\\0"),
            '\u{8}' => quoted.push_str("\\b"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{1a}' => quoted.push_str("\\Z"),
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\'' => quoted.push_str("\\'"),
            other => quoted.push(other),
        }
    }
    quoted.push('\'');
    quoted
}
