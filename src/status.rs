use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse verdict derived from analysis text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityStatus {
    Secure,
    Insecure,
    Unknown,
}

impl SecurityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityStatus::Secure => "secure",
            SecurityStatus::Insecure => "insecure",
            SecurityStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SecurityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a status is read out of free-text model output.
///
/// The automatic trigger scans the whole text while the popup's manual path only
/// trusts an exact verdict on the first line. The two are kept separate on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusStrategy {
    /// Case-insensitive keyword scan over the full text; "insecure" wins over "secure"
    FullText,
    /// First line, trimmed and lowercased, must be exactly "secure" or "insecure"
    FirstLine,
}

impl StatusStrategy {
    pub fn classify(&self, text: &str) -> SecurityStatus {
        match self {
            StatusStrategy::FullText => classify_full_text(text),
            StatusStrategy::FirstLine => classify_first_line(text),
        }
    }
}

/// Keyword scan used by the automatic trigger
pub fn classify_full_text(text: &str) -> SecurityStatus {
    let lower = text.to_lowercase();
    // "secure" is a substring of "insecure", so the order matters
    if lower.contains("insecure") {
        SecurityStatus::Insecure
    } else if lower.contains("secure") {
        SecurityStatus::Secure
    } else {
        SecurityStatus::Unknown
    }
}

/// Exact first-line verdict used by the popup
pub fn classify_first_line(text: &str) -> SecurityStatus {
    let first = text.lines().next().unwrap_or_default().trim().to_lowercase();
    match first.as_str() {
        "secure" => SecurityStatus::Secure,
        "insecure" => SecurityStatus::Insecure,
        _ => SecurityStatus::Unknown,
    }
}
