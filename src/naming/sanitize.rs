//! Filesystem-safe names from arbitrary titles

use super::identity::JobId;

/// Convert an arbitrary title into a lowercase, filesystem-safe name
///
/// Non-ASCII text is transliterated first (`Café` becomes `Cafe`, CJK is
/// romanized). ASCII letters and digits are then kept (lowercased), `_` is
/// kept as is, and every other run of characters (including `-`) collapses
/// into a single `-`.
/// Leading and trailing separators are trimmed. The result may be empty if
/// nothing retainable was present; see [`sanitize_or_generate`].
pub fn sanitize_filename(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in deunicode::deunicode(input).chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    out.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Sanitize `input`, substituting a fresh job identity if nothing survives
pub fn sanitize_or_generate(input: &str) -> String {
    let safe = sanitize_filename(input);
    if safe.is_empty() {
        JobId::generate().to_string()
    } else {
        safe
    }
}

/// Pick the part of a reported title used for naming: its last `/` segment
pub fn title_stem(title: &str) -> &str {
    title.rsplit('/').next().unwrap_or(title).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_input_unchanged() {
        assert_eq!(sanitize_filename("my-song-2024"), "my-song-2024");
        assert_eq!(sanitize_filename("abc123"), "abc123");
    }

    #[test]
    fn test_lowercases_and_collapses() {
        assert_eq!(sanitize_filename("Hello,   World!"), "hello-world");
        assert_eq!(sanitize_filename("  Artist - Title (Official Video) "), "artist-title-official-video");
    }

    #[test]
    fn test_keeps_underscores() {
        assert_eq!(sanitize_filename("vocal_take 2"), "vocal_take-2");
    }

    #[test]
    fn test_non_ascii_transliterated() {
        assert_eq!(sanitize_filename("Café del Mar"), "cafe-del-mar");
        assert_eq!(sanitize_filename("Motörhead – Ace of Spades"), "motorhead-ace-of-spades");
        assert_eq!(sanitize_filename("日本語"), "ri-ben-yu");
    }

    #[test]
    fn test_non_latin_title_keeps_readable_name() {
        let name = sanitize_or_generate(title_stem("Channel/Привет мир"));
        assert_eq!(name, "privet-mir");
    }

    #[test]
    fn test_empty_falls_back_to_identity() {
        assert_eq!(sanitize_filename("!!! ???"), "");
        let name = sanitize_or_generate("!!! ???");
        assert_eq!(name.len(), 12);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_deterministic() {
        let a = sanitize_filename("Some Title / Part 2");
        let b = sanitize_filename("Some Title / Part 2");
        assert_eq!(a, b);
    }

    #[test]
    fn test_title_stem_takes_last_segment() {
        assert_eq!(title_stem("AC/DC - Back in Black"), "DC - Back in Black");
        assert_eq!(title_stem("plain title "), "plain title");
        assert_eq!(title_stem("trailing/"), "");
    }
}
