use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::status::SecurityStatus;

/// Point-in-time record of a page's security-relevant signals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    /// URL of the page
    pub url: String,

    /// Document title
    pub title: String,

    /// Forms, scripts and meta tags found in the document
    pub dom_summary: DomSummary,

    /// Contents of local and session storage
    pub storage_data: StorageData,

    /// Resource timing entries, in buffer order
    pub network_summary: Vec<NetworkEntry>,

    /// Human-readable flags raised by the static heuristics
    pub heuristic_findings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomSummary {
    pub forms: Vec<FormInfo>,
    pub scripts: Vec<ScriptInfo>,
    pub meta_tags: Vec<MetaInfo>,
}

/// A form element and its controls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormInfo {
    pub id: String,
    /// Absolute submission URL
    pub action: String,
    pub method: String,
    pub inputs: Vec<InputInfo>,
}

/// An input-like control contained in a form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub id: String,
    pub required: bool,
}

/// A script element; `src` is empty for inline scripts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptInfo {
    pub src: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub defer: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaInfo {
    pub name: String,
    pub content: String,
    pub http_equiv: String,
}

/// Flattened key/value pairs of both storage areas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageData {
    #[serde(default)]
    pub local_storage: BTreeMap<String, String>,
    #[serde(default)]
    pub session_storage: BTreeMap<String, String>,
}

/// A resource timing entry projected to the fields we report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkEntry {
    pub name: String,
    /// Initiator type (`script`, `img`, `fetch`, ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Duration in milliseconds
    pub duration: f64,
    /// Transferred bytes
    pub size: u64,
}

/// Outcome of one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Raw model response text
    pub analysis: String,

    /// Classification derived from the text, never requested from the model
    pub security_status: SecurityStatus,
}

impl AnalysisResult {
    /// Create a new analysis result
    pub fn new(analysis: String, security_status: SecurityStatus) -> Self {
        Self {
            analysis,
            security_status,
        }
    }
}
