use super::{unquote, AUTO_INCREMENT};

const CURRENT_TIME_MARKERS: &[&str] = &[
    "getdate()",
    "getutcdate()",
    "sysdatetime()",
    "sysutcdatetime()",
    "sysdatetimeoffset()",
    "current_timestamp",
];

/// Normalize a MSSQL `COLUMN_DEFAULT` expression such as `((0))` or `(N'x')`.
pub fn normalize_default(raw: Option<&str>) -> Option<String> {
    let stripped = strip_parens(raw?);
    let lowered = stripped.to_ascii_lowercase();

    if lowered.starts_with("next value for") {
        return Some(AUTO_INCREMENT.to_string());
    }

    if CURRENT_TIME_MARKERS.iter().any(|m| lowered.contains(m)) {
        return None;
    }

    if stripped.eq_ignore_ascii_case("null") {
        return None;
    }

    let literal = stripped.strip_prefix('N').filter(|s| s.starts_with('\''));
    match unquote(literal.unwrap_or(stripped)) {
        Some(unquoted) => Some(unquoted),
        None => Some(stripped.to_string()),
    }
}

/// Strip the wrapping parentheses MSSQL stores defaults with: `((0))` -> `0`.
fn strip_parens(expr: &str) -> &str {
    let mut s = expr.trim();
    while s.starts_with('(') && s.ends_with(')') && balanced(&s[1..s.len() - 1]) {
        s = s[1..s.len() - 1].trim();
    }
    s
}

fn balanced(s: &str) -> bool {
    let mut depth = 0i32;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
