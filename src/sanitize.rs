//! Sanitization of stored file URLs before validation.
//!
//! Episode file URLs come from user-editable post metadata and can carry
//! smuggled control characters (header/response-splitting payloads) or raw
//! spaces that break downstream requests. These transforms run before any
//! parsing or caching.

/// Truncates a URL at the first control character.
///
/// A newline or other control character inside a stored URL is never
/// legitimate; everything from that point onward is dropped so an injected
/// payload cannot ride along into headers or redirects.
///
/// # Arguments
///
/// * `raw` - The stored URL string, untrusted
///
/// # Returns
///
/// The content preceding the first control character, or the whole string
/// when none is present. Never fails.
///
/// # Examples
///
/// ```
/// use media_gateway::clean_file_url;
///
/// assert_eq!(
///     clean_file_url("https://x/file.mp3\nINJECTED"),
///     "https://x/file.mp3"
/// );
/// assert_eq!(clean_file_url("https://x/file.mp3"), "https://x/file.mp3");
/// ```
pub fn clean_file_url(raw: &str) -> String {
    match raw.find(|c: char| c.is_control()) {
        Some(idx) => raw[..idx].to_string(),
        None => raw.to_string(),
    }
}

/// Percent-encodes literal spaces in a URL.
///
/// Only spaces are encoded; existing percent sequences and all other URL
/// structure are left untouched, which makes the transform idempotent:
/// `encode_file_url(encode_file_url(x)) == encode_file_url(x)`. Trailing
/// end-of-line markers are stripped first.
///
/// # Examples
///
/// ```
/// use media_gateway::encode_file_url;
///
/// assert_eq!(
///     encode_file_url("https://x/my file.mp3"),
///     "https://x/my%20file.mp3"
/// );
/// ```
pub fn encode_file_url(raw: &str) -> String {
    raw.trim_end_matches(['\r', '\n']).replace(' ', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_truncates_at_newline() {
        assert_eq!(
            clean_file_url("https://x/file.mp3\nINJECTED"),
            "https://x/file.mp3"
        );
    }

    #[test]
    fn test_clean_truncates_at_carriage_return() {
        assert_eq!(
            clean_file_url("https://x/file.mp3\r\nSet-Cookie: evil"),
            "https://x/file.mp3"
        );
    }

    #[test]
    fn test_clean_truncates_at_null_byte() {
        assert_eq!(clean_file_url("https://x/a.mp3\0rest"), "https://x/a.mp3");
    }

    #[test]
    fn test_clean_passes_through_normal_url() {
        let url = "https://cdn.castos.com/episodes/42/audio.mp3?token=abc";
        assert_eq!(clean_file_url(url), url);
    }

    #[test]
    fn test_clean_empty_string() {
        assert_eq!(clean_file_url(""), "");
    }

    #[test]
    fn test_clean_control_char_first() {
        assert_eq!(clean_file_url("\nhttps://x/a.mp3"), "");
    }

    #[test]
    fn test_encode_spaces() {
        assert_eq!(
            encode_file_url("https://x/my file.mp3"),
            "https://x/my%20file.mp3"
        );
    }

    #[test]
    fn test_encode_is_idempotent() {
        let once = encode_file_url("https://x/my file.mp3");
        let twice = encode_file_url(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_encode_preserves_existing_sequences() {
        let url = "https://x/my%20file.mp3?q=a%2Bb";
        assert_eq!(encode_file_url(url), url);
    }

    #[test]
    fn test_encode_strips_trailing_eol() {
        assert_eq!(encode_file_url("https://x/a.mp3\r\n"), "https://x/a.mp3");
    }

    #[test]
    fn test_encode_multiple_spaces() {
        assert_eq!(
            encode_file_url("https://x/a b c.mp3"),
            "https://x/a%20b%20c.mp3"
        );
    }
}
