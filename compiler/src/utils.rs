/// Render `text` as a double-quoted, escaped string literal.
pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

/// Map an article onto a definition keyword, e.g. "a struct".
pub fn with_article(keyword: &str) -> String {
    match keyword.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => format!("an {}", keyword),
        _ => format!("a {}", keyword),
    }
}
