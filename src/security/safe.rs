/// Characters rejected in names, emails, and passwords.
///
/// This is a narrow denylist guarding string-built queries, not an encoding
/// policy. Values are always bound as query parameters regardless.
const UNSAFE_CHARS: &[char] = &['\'', '"', '`'];

/// True if `s` is non-empty and free of quote-like characters
pub fn safe_str(s: &str) -> bool {
    !s.is_empty() && !s.contains(UNSAFE_CHARS)
}
