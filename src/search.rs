use deunicode::deunicode;

/// Normalize a string for search indexing and querying.
/// Transliterates to ASCII, collapses whitespace and lowercases
/// (e.g., "Иван  Петров" -> "ivan petrov").
pub fn normalize(s: &str) -> String {
    deunicode(s)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A blank query means "no filter".
pub fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(normalize(trimmed))
    }
}

/// Substring pattern for `LIKE ... ESCAPE '\'`.
pub fn like_pattern(normalized: &str) -> String {
    let escaped = normalized
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
