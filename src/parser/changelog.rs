//! Workshop changelog scraping

use regex::Regex;

/// Extract the most recent update timestamp from a changelog page.
///
/// The page carries a `workshopAnnouncement` block whose first
/// `<p id="<unix-timestamp>">` tag holds the posting time. Returns None
/// when the marker is absent (private, removed, or reshaped page).
pub fn extract_update_timestamp(html: &str) -> Option<i64> {
    // Single-line mode: the marker and the tag sit on different lines
    let pattern = Regex::new(r#"(?s)workshopAnnouncement.*?<p id="(\d+)">"#).unwrap();

    pattern
        .captures(html)
        .and_then(|caps| caps[1].parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANGELOG_PAGE: &str = r#"
        <div class="detailBox workshopAnnouncement">
            <div class="changeLogCtn">
                <p id="1700000000">Update: rebalanced recoil</p>
            </div>
            <p id="1690000000">older entry</p>
        </div>
    "#;

    #[test]
    fn test_extracts_first_timestamp() {
        assert_eq!(extract_update_timestamp(CHANGELOG_PAGE), Some(1700000000));
    }

    #[test]
    fn test_marker_absent() {
        assert_eq!(extract_update_timestamp("<html><body>nothing</body></html>"), None);
    }

    #[test]
    fn test_marker_without_timestamp_tag() {
        let html = r#"<div class="workshopAnnouncement"><p>no id</p></div>"#;
        assert_eq!(extract_update_timestamp(html), None);
    }
}
