use scraper::Html;

use crate::collector::dom::select_all;

pub const MIXED_CONTENT: &str = "Mixed content detected";
pub const INSECURE_FORMS: &str = "Insecure form submissions detected";
pub const SENSITIVE_INPUTS: &str = "Sensitive input fields detected";

/// Static checks, each raising at most one flag however many elements match
const CHECKS: &[(&str, &str)] = &[
    (
        r#"img[src^="http:"], script[src^="http:"], link[href^="http:"]"#,
        MIXED_CONTENT,
    ),
    (r#"form:not([action^="https"])"#, INSECURE_FORMS),
    (
        r#"input[type="password"], input[type="email"]"#,
        SENSITIVE_INPUTS,
    ),
];

/// Evaluate every static check against the document
pub fn findings(doc: &Html) -> Vec<String> {
    let findings: Vec<String> = CHECKS
        .iter()
        .filter(|(selector, _)| !select_all(doc, selector).is_empty())
        .map(|(_, flag)| flag.to_string())
        .collect();

    if !findings.is_empty() {
        ::log::info!("Heuristics flagged: {:?}", findings);
    }

    findings
}
