// src/util.rs — Small string helpers shared by logging and output

/// Cut `s` to at most `max_len` bytes without splitting a UTF-8 character.
/// Used to keep oracle answers readable in log lines.
pub fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}

/// First character upper-cased, the rest lower-cased ("sci-fi MOVIES" → "Sci-fi movies").
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
