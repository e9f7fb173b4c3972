//! Launcher preset document parsing
//!
//! A preset is an HTML export where each mod sits in a table row tagged
//! `data-type="ModContainer"`, with a display-name cell and a link whose
//! final path segment is the workshop item id.

use regex::Regex;

/// A malformed preset row. The import handler reports these to the
/// invocation context; rows added before the failure stay added.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("mod entry is missing a display name")]
    MissingName,

    #[error("mod entry '{0}' has no workshop link")]
    MissingLink(String),

    #[error("workshop link '{0}' has no item id")]
    MalformedLink(String),
}

/// One entry extracted from a preset document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetEntry {
    /// Normalized folder handle (e.g. "@cba_a3")
    pub folder: String,
    /// Workshop item id
    pub mod_id: String,
}

/// Extract mod entries row by row.
///
/// Rows decode independently so a caller adding entries as it goes keeps
/// everything before the first malformed row (imports are not atomic).
pub fn parse_preset_rows(html: &str) -> Vec<Result<PresetEntry, ImportError>> {
    let row_re = Regex::new(r#"(?s)<tr[^>]*data-type="ModContainer"[^>]*>(.*?)</tr>"#).unwrap();
    let name_re = Regex::new(r#"(?s)<td[^>]*data-type="DisplayName"[^>]*>(.*?)</td>"#).unwrap();
    let link_re = Regex::new(r#"<a[^>]*href="([^"]+)""#).unwrap();

    row_re
        .captures_iter(html)
        .map(|row| {
            let body = &row[1];

            let name = name_re
                .captures(body)
                .map(|caps| caps[1].trim().to_string())
                .filter(|n| !n.is_empty())
                .ok_or(ImportError::MissingName)?;

            let href = link_re
                .captures(body)
                .map(|caps| caps[1].to_string())
                .ok_or_else(|| ImportError::MissingLink(name.clone()))?;

            let mod_id = href
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| ImportError::MalformedLink(href.clone()))?
                .to_string();

            Ok(PresetEntry {
                folder: normalize_handle(&name),
                mod_id,
            })
        })
        .collect()
}

/// Extract every mod entry, failing on the first malformed row
pub fn parse_preset(html: &str) -> Result<Vec<PresetEntry>, ImportError> {
    parse_preset_rows(html).into_iter().collect()
}

/// Derive a folder handle from a display name.
///
/// Names already carrying the roster's `@` prefix are used as-is;
/// everything else is lowercased with non-word runs collapsed to `_`.
pub fn normalize_handle(name: &str) -> String {
    if name.starts_with('@') {
        return name.to_string();
    }

    let squash = Regex::new(r"\W+").unwrap();
    let lowered = name.to_lowercase();
    let collapsed = squash.replace_all(&lowered, "_");

    format!("@{}", collapsed.trim_matches('_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRESET: &str = r#"
        <html><body>
        <table>
            <tr data-type="ModContainer">
                <td data-type="DisplayName">CBA_A3</td>
                <td><a href="https://steamcommunity.com/workshop/123" data-type="Link">link</a></td>
            </tr>
            <tr data-type="ModContainer">
                <td data-type="DisplayName">ACE 3</td>
                <td><a href="https://steamcommunity.com/workshop/456" data-type="Link">link</a></td>
            </tr>
            <tr><td>not a mod row</td></tr>
        </table>
        </body></html>
    "#;

    #[test]
    fn test_parse_preset_rows() {
        let entries = parse_preset(PRESET).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0],
            PresetEntry {
                folder: "@cba_a3".to_string(),
                mod_id: "123".to_string(),
            }
        );
        assert_eq!(entries[1].folder, "@ace_3");
        assert_eq!(entries[1].mod_id, "456");
    }

    #[test]
    fn test_row_without_name_fails() {
        let html = r#"
            <tr data-type="ModContainer">
                <td><a href="https://steamcommunity.com/workshop/123">link</a></td>
            </tr>
        "#;
        assert!(matches!(parse_preset(html), Err(ImportError::MissingName)));
    }

    #[test]
    fn test_row_without_link_fails() {
        let html = r#"
            <tr data-type="ModContainer">
                <td data-type="DisplayName">Zeus Enhanced</td>
            </tr>
        "#;
        match parse_preset(html) {
            Err(ImportError::MissingLink(name)) => assert_eq!(name, "Zeus Enhanced"),
            other => panic!("expected MissingLink, got {:?}", other),
        }
    }

    #[test]
    fn test_id_from_final_path_segment() {
        let html = r#"
            <tr data-type="ModContainer">
                <td data-type="DisplayName">RHS</td>
                <td><a href="https://example.com/items/843425103/">link</a></td>
            </tr>
        "#;
        let entries = parse_preset(html).unwrap();
        assert_eq!(entries[0].mod_id, "843425103");
    }

    #[test]
    fn test_normalize_handle() {
        assert_eq!(normalize_handle("CBA_A3"), "@cba_a3");
        assert_eq!(normalize_handle("ACE 3"), "@ace_3");
        assert_eq!(normalize_handle("Task Force Radio (BETA)"), "@task_force_radio_beta");
        // Already-prefixed names pass through untouched
        assert_eq!(normalize_handle("@my_mod"), "@my_mod");
    }
}
