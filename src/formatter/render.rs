use crate::formatter::{Fragment, format};

impl Fragment {
    /// HTML for this fragment
    pub fn to_html(&self) -> String {
        match self {
            Fragment::Heading(text) => format!("<p><strong>{}</strong></p>", text),
            Fragment::NumberedItem { number, text } => {
                format!("<p><strong>{}. {}</strong></p>", number, text)
            }
            Fragment::Paragraph(text) => format!("<p>{}</p>", text),
            Fragment::ListOpen => "<ul>".to_string(),
            Fragment::ListItem(text) => format!("<li>{}</li>", text),
            Fragment::ListClose => "</ul>".to_string(),
        }
    }
}

/// Render an analysis as HTML markup
pub fn to_html(analysis: &str) -> String {
    format(analysis).fragments().map(|f| f.to_html()).collect()
}

/// Render an analysis for a terminal, one block per line
pub fn to_text(analysis: &str) -> String {
    let mut out = String::new();
    for fragment in format(analysis).fragments() {
        let line = match fragment {
            Fragment::Heading(text) => format!("\n{}", plain(&text).to_uppercase()),
            Fragment::NumberedItem { number, text } => format!("{}. {}", number, plain(&text)),
            Fragment::Paragraph(text) => plain(&text),
            Fragment::ListItem(text) => format!("  • {}", plain(&text)),
            Fragment::ListOpen | Fragment::ListClose => continue,
        };
        out.push_str(&line);
        out.push('\n');
    }
    out.trim_start_matches('\n').to_string()
}

/// Undo inline markup for terminal output
fn plain(markup: &str) -> String {
    markup
        .replace("<strong>", "")
        .replace("</strong>", "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
