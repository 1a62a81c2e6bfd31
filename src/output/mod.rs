// Terminal rendering helpers shared by the CLI commands.

pub mod terminal;

/// First `max_chars` characters of `text`, with "..." when anything was cut.
/// Counts characters, so multi-byte text never splits mid-codepoint.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

/// Format a probability as a percentage with two decimals ("42.10%").
pub fn percent(p: f64) -> String {
    format!("{:.2}%", p * 100.0)
}
