// Comment validity and input length capping.

/// Minimum trimmed length (in characters) for a comment to be worth classifying.
pub const MIN_COMMENT_CHARS: usize = 5;

/// Maximum number of characters handed to any classifier.
pub const MAX_INPUT_CHARS: usize = 2000;

/// A comment is valid when its trimmed text has at least `MIN_COMMENT_CHARS`
/// characters. Empty, whitespace-only, and very short comments (single emoji,
/// "ok", "lol") are dropped before classification.
pub fn is_valid_comment(comment: &str) -> bool {
    comment.trim().chars().take(MIN_COMMENT_CHARS).count() >= MIN_COMMENT_CHARS
}

/// Return the first `max_chars` characters of `text`.
///
/// Counts Unicode scalar values, not bytes, so multi-byte characters are never
/// split. Applied to the original string: leading whitespace counts.
pub fn cap_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
