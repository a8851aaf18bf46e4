//! Byte/text codec helpers shared by the caster and the sanitizer.

/// Decodes a byte span as UTF-8 text. Invalid sequences are replaced with
/// U+FFFD rather than rejected; identifier-returning system columns are
/// declared with the binary charset but still carry text.
pub fn decode_utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Renders a byte span as a `0x`-prefixed lowercase hex string.
pub fn hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
