//! Head/tail windowing of long text to fit a character budget.
//!
//! Budgets count Unicode scalar values, not bytes, so multi-byte text is
//! never split inside a character.

/// Text prepared for a prompt, with a record of what was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncated {
    /// The (possibly windowed) text.
    pub text: String,
    /// Whether any characters were omitted.
    pub truncated: bool,
    /// Number of characters omitted from the middle.
    pub omitted: usize,
}

/// Windows `content` to `budget` characters.
///
/// Content within budget passes through unchanged. Longer content keeps the
/// first and last `budget / 2` characters joined by a marker naming the
/// omitted count.
#[must_use]
pub fn truncate(content: &str, budget: usize) -> Truncated {
    let total = content.chars().count();
    if total <= budget {
        return Truncated { text: content.to_string(), truncated: false, omitted: 0 };
    }

    let half = budget / 2;
    let omitted = total - 2 * half;
    let head: String = content.chars().take(half).collect();
    let tail: String = content.chars().skip(total - half).collect();

    Truncated { text: format!("{head}{}{tail}", marker(omitted)), truncated: true, omitted }
}

/// The separator inserted between head and tail.
#[must_use]
pub fn marker(omitted: usize) -> String {
    format!("\n\n... [{omitted} characters omitted] ...\n\n")
}

/// Caps `text` to `limit` characters, appending `...` when cut.
#[must_use]
pub fn cap(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut capped: String = text.chars().take(limit).collect();
    capped.push_str("...");
    capped
}
