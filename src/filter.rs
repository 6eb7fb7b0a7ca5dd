use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::is_web_url;

/// Configuration for which page loads trigger an automatic analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationFilterConfig {
    /// Whether automatic analysis runs at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Regex patterns for URLs to include (if empty, all web URLs are included unless excluded)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns for URLs to exclude (these take precedence over include patterns)
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl Default for NavigationFilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

/// Decides whether a completed navigation qualifies for automatic analysis
#[derive(Debug)]
pub struct NavigationFilter {
    config: NavigationFilterConfig,
    include_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
}

impl Default for NavigationFilter {
    fn default() -> Self {
        Self {
            config: NavigationFilterConfig::default(),
            include_regexes: Vec::new(),
            exclude_regexes: Vec::new(),
        }
    }
}

impl NavigationFilter {
    /// Compile the configured patterns
    pub fn new(config: NavigationFilterConfig) -> Result<Self, regex::Error> {
        let include_regexes = compile(&config.include_patterns)?;
        let exclude_regexes = compile(&config.exclude_patterns)?;

        Ok(Self {
            config,
            include_regexes,
            exclude_regexes,
        })
    }

    /// Determine if a loaded page should be analyzed automatically
    pub fn should_analyze(&self, url: &str) -> bool {
        // Only http(s) pages can host the collector
        if !self.config.enabled || !is_web_url(url) {
            return false;
        }

        // Exclusions take precedence
        if self.exclude_regexes.iter().any(|r| r.is_match(url)) {
            return false;
        }

        self.include_regexes.is_empty() || self.include_regexes.iter().any(|r| r.is_match(url))
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|p| Regex::new(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_accepts_web_pages_only() {
        let filter = NavigationFilter::default();

        assert!(filter.should_analyze("https://example.com/"));
        assert!(filter.should_analyze("http://example.com/login"));
        assert!(!filter.should_analyze("chrome://newtab/"));
        assert!(!filter.should_analyze("about:blank"));
        assert!(!filter.should_analyze("file:///tmp/page.html"));
        assert!(!filter.should_analyze(""));
    }

    #[test]
    fn test_regex_patterns() {
        let config = NavigationFilterConfig {
            enabled: true,
            include_patterns: vec![r"^https://[^/]*example\.com/".to_string()],
            exclude_patterns: vec![r"/static/".to_string()],
        };
        let filter = NavigationFilter::new(config).unwrap();

        // Matching include pattern should be allowed
        assert!(filter.should_analyze("https://shop.example.com/cart"));

        // Non-matching include pattern should be excluded
        assert!(!filter.should_analyze("https://other.org/cart"));

        // Matching exclude pattern should be excluded even if it matches include
        assert!(!filter.should_analyze("https://example.com/static/index.html"));
    }

    #[test]
    fn test_disabled_filter_rejects_everything() {
        let config = NavigationFilterConfig {
            enabled: false,
            ..NavigationFilterConfig::default()
        };
        let filter = NavigationFilter::new(config).unwrap();
        assert!(!filter.should_analyze("https://example.com/"));
    }

    #[test]
    fn test_invalid_pattern() {
        let config = NavigationFilterConfig {
            exclude_patterns: vec!["(unclosed".to_string()],
            ..NavigationFilterConfig::default()
        };
        assert!(NavigationFilter::new(config).is_err());
    }
}
