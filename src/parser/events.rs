//! Decoding of steamcmd progress output into per-item events

use regex::Regex;

/// One decoded line of steamcmd output.
///
/// Exactly one event is produced per line; lines matching none of the
/// known shapes decode to `Unrecognized` and are ignored by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    /// Download or validation of an item began
    Start(String),
    /// `Success. Downloaded item <id> ...`
    Success(String),
    /// `ERROR! Timeout downloading item <id>`
    Timeout(String),
    /// `ERROR! Download item <id> failed (<reason>)`
    Error { mod_id: String, reason: String },
    /// Anything else
    Unrecognized,
}

/// Line decoder with pre-compiled patterns.
///
/// Patterns are tested in a fixed order; the error shapes are checked
/// before the start marker so a line can never match twice.
pub struct LineDecoder {
    ansi: Regex,
    start: Regex,
    success: Regex,
    timeout: Regex,
    error: Regex,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            // CSI escape sequences; steamcmd colours its progress output
            ansi: Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").unwrap(),
            start: Regex::new(r"Downloading item (\d+)").unwrap(),
            success: Regex::new(r"Success\. Downloaded item (\d+)").unwrap(),
            timeout: Regex::new(r"ERROR! Timeout downloading item (\d+)").unwrap(),
            error: Regex::new(r"ERROR! Download item (\d+) failed \(([^)]*)\)").unwrap(),
        }
    }

    /// Strip ANSI escape sequences from a raw output line
    pub fn strip_ansi(&self, line: &str) -> String {
        self.ansi.replace_all(line, "").into_owned()
    }

    /// Decode a raw output line into exactly one event
    pub fn decode(&self, raw: &str) -> FetchEvent {
        let line = self.strip_ansi(raw);

        if let Some(caps) = self.timeout.captures(&line) {
            return FetchEvent::Timeout(caps[1].to_string());
        }
        if let Some(caps) = self.error.captures(&line) {
            return FetchEvent::Error {
                mod_id: caps[1].to_string(),
                reason: caps[2].to_string(),
            };
        }
        if let Some(caps) = self.success.captures(&line) {
            return FetchEvent::Success(caps[1].to_string());
        }
        if let Some(caps) = self.start.captures(&line) {
            return FetchEvent::Start(caps[1].to_string());
        }

        FetchEvent::Unrecognized
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_start() {
        let decoder = LineDecoder::new();
        assert_eq!(
            decoder.decode("Downloading item 450814997 ..."),
            FetchEvent::Start("450814997".to_string())
        );
    }

    #[test]
    fn test_decode_success() {
        let decoder = LineDecoder::new();
        assert_eq!(
            decoder.decode("Success. Downloaded item 123456 to \"/srv/steamapps\" (52428800 bytes)"),
            FetchEvent::Success("123456".to_string())
        );
    }

    #[test]
    fn test_decode_timeout() {
        let decoder = LineDecoder::new();
        assert_eq!(
            decoder.decode("ERROR! Timeout downloading item 123456"),
            FetchEvent::Timeout("123456".to_string())
        );
    }

    #[test]
    fn test_decode_error_with_reason() {
        let decoder = LineDecoder::new();
        assert_eq!(
            decoder.decode("ERROR! Download item 123456 failed (Failure)"),
            FetchEvent::Error {
                mod_id: "123456".to_string(),
                reason: "Failure".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_unrecognized() {
        let decoder = LineDecoder::new();
        assert_eq!(decoder.decode("Loading Steam API...OK"), FetchEvent::Unrecognized);
        assert_eq!(decoder.decode(""), FetchEvent::Unrecognized);
    }

    #[test]
    fn test_ansi_stripped_before_matching() {
        let decoder = LineDecoder::new();
        let line = "\x1b[1m\x1b[32mSuccess.\x1b[0m Downloaded item 987 to \"/x\"";
        assert_eq!(decoder.decode(line), FetchEvent::Success("987".to_string()));
    }

    #[test]
    fn test_patterns_mutually_exclusive() {
        // "Downloading item" appears inside the timeout line; the timeout
        // shape must win
        let decoder = LineDecoder::new();
        assert_eq!(
            decoder.decode("ERROR! Timeout downloading item 42"),
            FetchEvent::Timeout("42".to_string())
        );
    }
}
