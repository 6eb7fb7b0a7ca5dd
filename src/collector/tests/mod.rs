
use crate::collector::PageContext;

/// Page context for `html` served from `url`
pub(crate) fn page(url: &str, html: &str) -> PageContext {
    PageContext {
        url: url.to_string(),
        html: html.to_string(),
        ..PageContext::default()
    }
}
