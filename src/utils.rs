//! Utility functions for the IPTV source cache

pub mod time;

pub use time::{Clock, ManualClock, SystemClock};

/// Normalize a URL for logging by trimming whitespace and trailing slashes
pub fn display_url(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

/// True when `name` can be used verbatim as one URL path segment
pub fn is_path_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_path_segment() {
        assert!(is_path_segment("news"));
        assert!(is_path_segment("sports-hd_2.eu"));
        assert!(!is_path_segment(""));
        assert!(!is_path_segment(".."));
        assert!(!is_path_segment("a/b"));
        assert!(!is_path_segment("with space"));
        assert!(!is_path_segment("ünicode"));
    }

    #[test]
    fn test_display_url() {
        assert_eq!(display_url(" http://x/list.m3u/ "), "http://x/list.m3u");
    }
}
