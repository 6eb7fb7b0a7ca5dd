//! Turns free-text model output into structured markup.
//!
//! Parsing is line-oriented. [`FormatterState`] carries the current section,
//! per-section numbering and whether a bullet list is open; [`Fragments`] threads
//! it over the input lines and yields [`Fragment`]s lazily. Renderers in
//! [`render`] turn fragments into HTML or terminal text.

pub mod render;

use regex::Regex;
use std::collections::VecDeque;
use std::str::Lines;
use std::sync::LazyLock;

static BOLD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").ok());
static STRONG_TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"</?strong>").ok());
static NUMBERED: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^(\d+)\.\s*(.+)$").ok());
static BULLET: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[*-]\s").ok());

/// Output unit of the formatter. Text is inline markup: HTML-escaped, with
/// `<strong>` spans where the source used `**bold**`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// A recognised section heading line
    Heading(String),
    /// A numbered item rendered as a bold paragraph
    NumberedItem { number: String, text: String },
    Paragraph(String),
    ListOpen,
    ListItem(String),
    ListClose,
}

/// Sections whose numbered items are renumbered from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    None,
    Stride,
    SimpleFixes,
    Recommendations,
}

impl Section {
    /// Recognise a heading line by case-insensitive substring
    fn from_heading(line: &str) -> Option<Section> {
        let lower = line.to_lowercase();
        if lower.contains("stride analysis:") {
            Some(Section::Stride)
        } else if lower.contains("simple fixes:") {
            Some(Section::SimpleFixes)
        } else if lower.contains("recommendations:") {
            Some(Section::Recommendations)
        } else {
            None
        }
    }
}

/// Parse state threaded through the input lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterState {
    pub section: Section,
    pub stride_counter: u32,
    pub simple_fixes_counter: u32,
    pub recommendations_counter: u32,
    pub in_list: bool,
}

impl Default for FormatterState {
    fn default() -> Self {
        Self {
            section: Section::None,
            stride_counter: 0,
            simple_fixes_counter: 0,
            recommendations_counter: 0,
            in_list: false,
        }
    }
}

impl FormatterState {
    /// Consume one line, pushing the fragments it produces
    pub fn step(&mut self, line: &str, out: &mut VecDeque<Fragment>) {
        let trimmed = line.trim();

        if let Some(section) = Section::from_heading(trimmed) {
            self.close_list(out);
            self.enter(section);
            out.push_back(Fragment::Heading(trimmed.to_string()));
            return;
        }

        let plain = match STRONG_TAG.as_ref() {
            Some(re) => re.replace_all(trimmed, "").into_owned(),
            None => trimmed.to_string(),
        };

        if let Some((literal, text)) = numbered(&plain) {
            self.close_list(out);
            let number = match self.next_number() {
                Some(n) => n.to_string(),
                None => literal,
            };
            out.push_back(Fragment::NumberedItem { number, text });
        } else if let Some(item) = bullet(trimmed) {
            if !self.in_list {
                out.push_back(Fragment::ListOpen);
                self.in_list = true;
            }
            out.push_back(Fragment::ListItem(item));
        } else {
            self.close_list(out);
            if !trimmed.is_empty() {
                out.push_back(Fragment::Paragraph(trimmed.to_string()));
            }
        }
    }

    /// Close whatever is still open at end of input
    pub fn finish(&mut self, out: &mut VecDeque<Fragment>) {
        self.close_list(out);
    }

    fn enter(&mut self, section: Section) {
        self.section = section;
        match section {
            Section::Stride => self.stride_counter = 0,
            Section::SimpleFixes => self.simple_fixes_counter = 0,
            Section::Recommendations => self.recommendations_counter = 0,
            Section::None => {}
        }
    }

    /// Advance the current section's counter; `None` outside a section
    fn next_number(&mut self) -> Option<u32> {
        let counter = match self.section {
            Section::Stride => &mut self.stride_counter,
            Section::SimpleFixes => &mut self.simple_fixes_counter,
            Section::Recommendations => &mut self.recommendations_counter,
            Section::None => return None,
        };
        *counter += 1;
        Some(*counter)
    }

    fn close_list(&mut self, out: &mut VecDeque<Fragment>) {
        if self.in_list {
            out.push_back(Fragment::ListClose);
            self.in_list = false;
        }
    }
}

fn numbered(line: &str) -> Option<(String, String)> {
    let caps = NUMBERED.as_ref()?.captures(line)?;
    Some((caps[1].to_string(), caps[2].trim().to_string()))
}

fn bullet(line: &str) -> Option<String> {
    let marker = BULLET.as_ref()?.find(line)?;
    Some(line[marker.end()..].trim().to_string())
}

/// Lazy fragment stream over the lines of an analysis
pub struct Fragments<'a> {
    lines: Lines<'a>,
    state: FormatterState,
    pending: VecDeque<Fragment>,
    finished: bool,
}

impl<'a> Fragments<'a> {
    fn new(markup: &'a str) -> Self {
        Self {
            lines: markup.lines(),
            state: FormatterState::default(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Parse state after the lines consumed so far
    pub fn state(&self) -> &FormatterState {
        &self.state
    }
}

impl Iterator for Fragments<'_> {
    type Item = Fragment;

    fn next(&mut self) -> Option<Fragment> {
        loop {
            if let Some(fragment) = self.pending.pop_front() {
                return Some(fragment);
            }
            if self.finished {
                return None;
            }
            match self.lines.next() {
                Some(line) => self.state.step(line, &mut self.pending),
                None => {
                    self.state.finish(&mut self.pending);
                    self.finished = true;
                }
            }
        }
    }
}

/// Escape markup characters, then turn `**text**` into `<strong>` spans
pub fn to_inline_markup(text: &str) -> String {
    let escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    match BOLD.as_ref() {
        Some(re) => re.replace_all(&escaped, "<strong>$1</strong>").into_owned(),
        None => escaped,
    }
}

/// Prepared analysis text whose fragments can be iterated lazily
pub struct Formatted {
    markup: String,
}

impl Formatted {
    pub fn fragments(&self) -> Fragments<'_> {
        Fragments::new(&self.markup)
    }
}

/// Prepare analysis text for formatting
pub fn format(analysis: &str) -> Formatted {
    Formatted {
        markup: to_inline_markup(analysis),
    }
}

/// Collect every fragment for an analysis
pub fn fragments(analysis: &str) -> Vec<Fragment> {
    format(analysis).fragments().collect()
}
