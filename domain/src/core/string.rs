//! String utilities for the domain layer.

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Collapse all whitespace runs (including newlines) into single spaces.
///
/// Used for one-line previews of message content in chat listings.
pub fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One-line preview of `s`, at most `max_len` bytes.
pub fn preview(s: &str, max_len: usize) -> String {
    truncate(&single_line(s), max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        // 'の' is 3 bytes; cutting at 4 backs up to the first character
        assert_eq!(truncate("あのね", 9), "あのね");
        assert_eq!(truncate("あのねあのね", 7), "あ...");
    }

    #[test]
    fn test_single_line_collapses_newlines() {
        assert_eq!(single_line("  hello\n\n  world\t!"), "hello world !");
        assert_eq!(single_line(""), "");
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("line one\nline two", 11), "line one...");
        assert_eq!(preview("short", 12), "short");
    }
}
