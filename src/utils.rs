use url::Url;

/// Marker appended to strings that were cut short
pub const TRUNCATION_SUFFIX: &str = "... [truncated]";

/// Cap a string at `max` characters, appending the truncation marker only when cut
pub fn truncate_str(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_SUFFIX),
        None => text.to_string(),
    }
}

/// Whether a URL parses and uses the http or https scheme
pub fn is_web_url(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_str("abcdefghijk", 10), "abcdefghij... [truncated]");
        // Counts characters, not bytes
        assert_eq!(truncate_str("ééé", 2), "éé... [truncated]");
    }

    #[test]
    fn test_is_web_url() {
        assert!(is_web_url("https://example.com/"));
        assert!(is_web_url("http://example.com/login"));
        assert!(!is_web_url("chrome://extensions"));
        assert!(!is_web_url("file:///etc/hosts"));
        assert!(!is_web_url("not a url"));
    }
}
