use crate::analysis::api::ApiMessage;
use crate::summarizer::SummarizedSnapshot;
use crate::utils::truncate_str;

/// Maximum characters of encoded screenshot embedded in the prompt
pub const SCREENSHOT_EXCERPT_CHARS: usize = 500;

pub const SYSTEM_PROMPT: &str = "\
You are a cybersecurity expert performing a security design review using the STRIDE framework:
- S: Spoofing
- T: Tampering
- R: Repudiation
- I: Information Disclosure
- D: Denial of Service
- E: Elevation of Privilege

You are given DOM data, visible page content, and a screenshot. Your job is to:
1. Determine if the page appears secure or not.
2. If it's not secure, explain clearly which STRIDE categories are affected and why.
3. Keep the explanation easy to understand for someone with basic security knowledge.
4. Suggest simple fixes if possible.
";

/// Build the system and user messages for one analysis
pub fn build_messages(
    snapshot: &SummarizedSnapshot,
    screenshot: Option<&str>,
) -> Result<Vec<ApiMessage>, serde_json::Error> {
    let excerpt = truncate_str(screenshot.unwrap_or_default(), SCREENSHOT_EXCERPT_CHARS);

    let user = format!(
        "Analyze this browser screen using STRIDE.

Here is the structured page data:
- URL: {url}
- Page title: {title}
- DOM summary: {dom}
- Detected inputs and forms: {forms}
- LocalStorage/sessionStorage data: {storage}
- Network activity summary: {network}
- Static heuristics flags: {findings}

Here is the screenshot (base64-encoded image, truncated):
[data:image/png;base64,{excerpt}]
",
        url = snapshot.url,
        title = snapshot.title,
        dom = serde_json::to_string_pretty(&snapshot.dom_summary)?,
        forms = serde_json::to_string_pretty(&snapshot.dom_summary.forms)?,
        storage = serde_json::to_string_pretty(&snapshot.storage_data)?,
        network = serde_json::to_string_pretty(&snapshot.network_summary)?,
        findings = serde_json::to_string_pretty(&snapshot.heuristic_findings)?,
        excerpt = excerpt,
    );

    Ok(vec![ApiMessage::system(SYSTEM_PROMPT), ApiMessage::user(user)])
}
