use super::{unquote, AUTO_INCREMENT};

/// Spellings of a computed current time. Matched case-insensitively.
const CURRENT_TIME_MARKERS: &[&str] = &[
    "now()",
    "'now'::",
    "current_timestamp",
    "localtimestamp",
    "current_date",
    "transaction_timestamp()",
    "statement_timestamp()",
    "clock_timestamp()",
];

/// Normalize a PostgreSQL `column_default` expression.
///
/// Sequence and current-time checks run before cast stripping, so
/// `nextval('s'::regclass)` and `'now'::text` are never mistaken for literals.
/// Both checks look only at the expression outside string literals.
pub fn normalize_default(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    let expression = mask_literals(raw).to_ascii_lowercase();

    if expression.contains("nextval(") {
        return Some(AUTO_INCREMENT.to_string());
    }

    if CURRENT_TIME_MARKERS.iter().any(|m| expression.contains(m)) {
        return None;
    }

    if let Some(pos) = find_typecast_pos(raw) {
        let literal = raw[..pos].trim();
        let literal = unquote(literal).unwrap_or_else(|| literal.to_string());
        if literal.eq_ignore_ascii_case("null") {
            return None;
        }
        return Some(literal);
    }

    Some(raw.to_string())
}

/// Blank out the contents of string literals, keeping the quotes.
///
/// A literal spelling `now` is kept so `'now'::timestamp` stays recognizable.
fn mask_literals(expr: &str) -> String {
    let mut masked = String::with_capacity(expr.len());
    let mut literal: Option<String> = None;

    for ch in expr.chars() {
        match literal.take() {
            Some(content) if ch == '\'' => {
                masked.push('\'');
                if content.eq_ignore_ascii_case("now") {
                    masked.push_str(&content);
                }
                masked.push('\'');
            }
            Some(mut content) => {
                content.push(ch);
                literal = Some(content);
            }
            None if ch == '\'' => literal = Some(String::new()),
            None => masked.push(ch),
        }
    }

    masked
}

/// Position of the first `::` outside quotes and parentheses.
fn find_typecast_pos(expr: &str) -> Option<usize> {
    let bytes = expr.as_bytes();
    let mut in_quotes = false;
    let mut depth = 0u32;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => in_quotes = !in_quotes,
            b'(' if !in_quotes => depth += 1,
            b')' if !in_quotes => depth = depth.saturating_sub(1),
            b':' if !in_quotes && depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                return Some(i);
            }
            _ => {}
        }
        i += 1;
    }

    None
}
