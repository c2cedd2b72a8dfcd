//! Text normalization for extracted manual pages.

/// Normalize page text with minimal layout disruption.
///
/// - Trims trailing whitespace on each line.
/// - Collapses runs of blank lines into a single one.
/// - Drops leading and trailing blank lines.
pub fn normalize_page_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut blank_run = 0usize;

    for line in s.lines() {
        let line = line.trim_end();

        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if blank_run > 0 {
                out.push('\n');
            }
        }
        blank_run = 0;
        out.push_str(line);
    }

    out
}

/// First `max_chars` characters of `s`, cut on a char boundary.
pub fn preview(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_blank_runs() {
        let s = "\n\nWarning lamp   \n\n\n\nCheck oil level\t\nnow\n\n";
        assert_eq!(normalize_page_text(s), "Warning lamp\n\nCheck oil level\nnow");
    }

    #[test]
    fn preview_is_char_safe() {
        assert_eq!(preview("Bremsflüssigkeit prüfen", 14), "Bremsflüssigke");
        assert_eq!(preview("kurz", 200), "kurz");
        assert_eq!(preview("", 3), "");
    }
}
