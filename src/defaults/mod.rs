pub mod mssql;
pub mod pg;

/// Default reported for columns backed by a sequence or identity generator.
pub const AUTO_INCREMENT: &str = "[AUTO INCREMENT]";

/// Strip one layer of enclosing single quotes, unescaping doubled quotes.
/// Returns `None` when the value is not a quoted literal.
fn unquote(value: &str) -> Option<String> {
    let inner = value.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace("''", "'"))
}
