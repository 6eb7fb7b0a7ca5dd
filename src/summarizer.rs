use std::ops::Deref;

use crate::results::{DomSummary, PageSnapshot};
use crate::utils::truncate_str;

/// Maximum entries kept in each list field
pub const MAX_ITEMS: usize = 5;

/// Maximum title length in characters, before the truncation marker
pub const MAX_TITLE_CHARS: usize = 200;

/// A snapshot whose list fields and title have been bounded for prompting.
///
/// Same shape as [`PageSnapshot`]; the wrapper only records that [`summarize`] ran.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizedSnapshot(PageSnapshot);

impl SummarizedSnapshot {
    pub fn into_inner(self) -> PageSnapshot {
        self.0
    }
}

impl Deref for SummarizedSnapshot {
    type Target = PageSnapshot;

    fn deref(&self) -> &PageSnapshot {
        &self.0
    }
}

/// Bound a snapshot for transport: list fields keep their first [`MAX_ITEMS`]
/// entries, the title is capped at [`MAX_TITLE_CHARS`]. The URL and storage
/// data pass through unchanged.
pub fn summarize(snapshot: &PageSnapshot) -> SummarizedSnapshot {
    SummarizedSnapshot(PageSnapshot {
        url: snapshot.url.clone(),
        title: truncate_str(&snapshot.title, MAX_TITLE_CHARS),
        dom_summary: DomSummary {
            forms: prefix(&snapshot.dom_summary.forms),
            scripts: prefix(&snapshot.dom_summary.scripts),
            meta_tags: prefix(&snapshot.dom_summary.meta_tags),
        },
        storage_data: snapshot.storage_data.clone(),
        network_summary: prefix(&snapshot.network_summary),
        heuristic_findings: prefix(&snapshot.heuristic_findings),
    })
}

fn prefix<T: Clone>(items: &[T]) -> Vec<T> {
    items.iter().take(MAX_ITEMS).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{FormInfo, MetaInfo, NetworkEntry, ScriptInfo};
    use crate::utils::TRUNCATION_SUFFIX;

    fn large_snapshot() -> PageSnapshot {
        let mut snapshot = PageSnapshot {
            url: "https://example.com/".to_string(),
            title: "t".repeat(250),
            ..PageSnapshot::default()
        };
        for i in 0..8 {
            snapshot.dom_summary.forms.push(FormInfo {
                id: format!("form-{}", i),
                ..FormInfo::default()
            });
            snapshot.dom_summary.scripts.push(ScriptInfo {
                src: format!("https://example.com/{}.js", i),
                ..ScriptInfo::default()
            });
            snapshot.dom_summary.meta_tags.push(MetaInfo {
                name: format!("meta-{}", i),
                ..MetaInfo::default()
            });
            snapshot.network_summary.push(NetworkEntry {
                name: format!("resource-{}", i),
                ..NetworkEntry::default()
            });
            snapshot.heuristic_findings.push(format!("finding {}", i));
            snapshot
                .storage_data
                .local_storage
                .insert(format!("key-{}", i), "value".to_string());
        }
        snapshot
    }

    #[test]
    fn test_lists_are_capped_prefixes() {
        let snapshot = large_snapshot();
        let summary = summarize(&snapshot);

        assert_eq!(summary.dom_summary.forms.len(), MAX_ITEMS);
        assert_eq!(summary.dom_summary.scripts.len(), MAX_ITEMS);
        assert_eq!(summary.dom_summary.meta_tags.len(), MAX_ITEMS);
        assert_eq!(summary.network_summary.len(), MAX_ITEMS);
        assert_eq!(summary.heuristic_findings.len(), MAX_ITEMS);

        assert_eq!(
            summary.dom_summary.forms[..],
            snapshot.dom_summary.forms[..MAX_ITEMS]
        );
        assert_eq!(
            summary.heuristic_findings[..],
            snapshot.heuristic_findings[..MAX_ITEMS]
        );
    }

    #[test]
    fn test_uncapped_fields_pass_through() {
        let snapshot = large_snapshot();
        let summary = summarize(&snapshot);

        assert_eq!(summary.url, snapshot.url);
        assert_eq!(summary.storage_data, snapshot.storage_data);
        assert_eq!(summary.storage_data.local_storage.len(), 8);
    }

    #[test]
    fn test_long_title_is_truncated_with_marker() {
        let summary = summarize(&large_snapshot());
        assert!(summary.title.ends_with(TRUNCATION_SUFFIX));
        assert_eq!(
            summary.title.chars().count(),
            MAX_TITLE_CHARS + TRUNCATION_SUFFIX.chars().count()
        );
    }

    #[test]
    fn test_short_input_is_unchanged() {
        let mut snapshot = large_snapshot();
        snapshot.title = "Login".to_string();
        snapshot.dom_summary.forms.truncate(2);
        snapshot.network_summary.clear();

        let summary = summarize(&snapshot);
        assert_eq!(summary.title, "Login");
        assert_eq!(summary.dom_summary.forms, snapshot.dom_summary.forms);
        assert!(summary.network_summary.is_empty());
    }

    #[test]
    fn test_input_is_not_mutated() {
        let snapshot = large_snapshot();
        let before = snapshot.clone();
        let _ = summarize(&snapshot);
        assert_eq!(snapshot, before);
    }
}
