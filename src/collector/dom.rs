use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::results::{DomSummary, FormInfo, InputInfo, MetaInfo, ScriptInfo};

/// Select every element matching a CSS selector.
///
/// A selector that fails to parse matches nothing, so one broken extraction
/// cannot abort the whole snapshot.
pub fn select_all<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => doc.select(&selector).collect(),
        Err(e) => {
            ::log::warn!("Skipping invalid selector '{}': {:?}", css, e);
            Vec::new()
        }
    }
}

/// Document title as a browser reports it: `<title>` text with whitespace collapsed
pub fn title(doc: &Html) -> String {
    select_all(doc, "title")
        .first()
        .map(|t| t.text().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract forms, scripts and meta tags
pub fn summarize_dom(doc: &Html, base: Option<&Url>) -> DomSummary {
    let summary = DomSummary {
        forms: forms(doc, base),
        scripts: scripts(doc, base),
        meta_tags: meta_tags(doc),
    };

    ::log::debug!(
        "DOM summary: {} forms, {} scripts, {} meta tags",
        summary.forms.len(),
        summary.scripts.len(),
        summary.meta_tags.len()
    );

    summary
}

fn forms(doc: &Html, base: Option<&Url>) -> Vec<FormInfo> {
    select_all(doc, "form")
        .into_iter()
        .map(|form| FormInfo {
            id: attr(&form, "id"),
            action: resolve_action(base, form.value().attr("action")),
            method: form_method(form.value().attr("method")),
            inputs: controls(&form),
        })
        .collect()
}

fn controls(form: &ElementRef<'_>) -> Vec<InputInfo> {
    let selector = match Selector::parse("input, select, textarea, button") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    form.select(&selector)
        .map(|control| InputInfo {
            kind: control_type(&control),
            name: attr(&control, "name"),
            id: attr(&control, "id"),
            required: control.value().attr("required").is_some(),
        })
        .collect()
}

/// The `type` a browser would report for a form control
fn control_type(control: &ElementRef<'_>) -> String {
    let declared = control
        .value()
        .attr("type")
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty());

    match control.value().name() {
        "select" if control.value().attr("multiple").is_some() => "select-multiple".to_string(),
        "select" => "select-one".to_string(),
        "textarea" => "textarea".to_string(),
        "button" => match declared.as_deref() {
            Some(t @ ("submit" | "reset" | "button")) => t.to_string(),
            _ => "submit".to_string(),
        },
        _ => declared.unwrap_or_else(|| "text".to_string()),
    }
}

/// Resolve a form action the way `form.action` does: empty means the page itself
fn resolve_action(base: Option<&Url>, action: Option<&str>) -> String {
    let action = action.map(str::trim).unwrap_or_default();
    match base {
        Some(base) if action.is_empty() => base.to_string(),
        Some(base) => resolve(base, action),
        None => action.to_string(),
    }
}

fn form_method(method: Option<&str>) -> String {
    match method.map(|m| m.trim().to_ascii_lowercase()).as_deref() {
        Some(m @ ("get" | "post" | "dialog")) => m.to_string(),
        _ => "get".to_string(),
    }
}

fn scripts(doc: &Html, base: Option<&Url>) -> Vec<ScriptInfo> {
    select_all(doc, "script")
        .into_iter()
        .map(|script| {
            let src = script
                .value()
                .attr("src")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| match base {
                    Some(base) => resolve(base, s),
                    None => s.to_string(),
                })
                .unwrap_or_default();

            ScriptInfo {
                src,
                kind: attr(&script, "type"),
                is_async: script.value().attr("async").is_some(),
                defer: script.value().attr("defer").is_some(),
            }
        })
        .collect()
}

fn meta_tags(doc: &Html) -> Vec<MetaInfo> {
    select_all(doc, "meta")
        .into_iter()
        .map(|meta| MetaInfo {
            name: attr(&meta, "name"),
            content: attr(&meta, "content"),
            http_equiv: attr(&meta, "http-equiv"),
        })
        .collect()
}

fn attr(element: &ElementRef<'_>, name: &str) -> String {
    element.value().attr(name).unwrap_or_default().to_string()
}

fn resolve(base: &Url, reference: &str) -> String {
    base.join(reference)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| reference.to_string())
}
