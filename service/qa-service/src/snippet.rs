//! Sanitizing of keyword-search snippets.
//!
//! Snippets come from indexed document text and are untrusted. The backend
//! marks matches with `[`/`]`; HTML highlight tags (`<b>`, `<strong>`,
//! `<em>`, `<mark>`) are accepted as well. The markup is parsed as an HTML
//! fragment: every other element is dropped and `<script>`/`<style>` bodies
//! are discarded entirely. What remains is plain text split into highlighted
//! and non-highlighted spans.

use scraper::{Html, Node};

/// A run of text with uniform highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snippet {
    spans: Vec<Span>,
}

const HIGHLIGHT_TAGS: [&str; 4] = ["b", "strong", "em", "mark"];
const SKIP_CONTENT_TAGS: [&str; 2] = ["script", "style"];

impl Snippet {
    pub fn parse(raw: &str) -> Self {
        let fragment = Html::parse_fragment(raw);
        let mut builder = SpanBuilder::default();
        // Bracket nesting carries across text nodes.
        let mut depth: u32 = 0;

        for node in fragment.root_element().descendants() {
            let inside = |tags: &[&str]| {
                node.ancestors()
                    .any(|a| a.value().as_element().is_some_and(|el| tags.iter().any(|t| *t == el.name())))
            };
            match node.value() {
                Node::Text(text) => {
                    if inside(&SKIP_CONTENT_TAGS[..]) {
                        continue;
                    }
                    let tagged = inside(&HIGHLIGHT_TAGS[..]);
                    for ch in text.chars() {
                        match ch {
                            '[' => depth += 1,
                            ']' if depth > 0 => depth -= 1,
                            _ => builder.push(ch, tagged || depth > 0),
                        }
                    }
                }
                Node::Element(el) if el.name() == "br" => {
                    builder.push(' ', depth > 0 || inside(&HIGHLIGHT_TAGS[..]));
                }
                _ => {}
            }
        }

        Self { spans: builder.finish() }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Plain text with highlights wrapped in `open`/`close`.
    pub fn to_marked(&self, open: &str, close: &str) -> String {
        let mut out = String::new();
        for span in &self.spans {
            if span.highlighted {
                out.push_str(open);
                out.push_str(&span.text);
                out.push_str(close);
            } else {
                out.push_str(&span.text);
            }
        }
        out
    }
}

#[derive(Default)]
struct SpanBuilder {
    spans: Vec<Span>,
    current: String,
    highlighted: bool,
}

impl SpanBuilder {
    fn push(&mut self, ch: char, highlighted: bool) {
        if highlighted != self.highlighted {
            self.flush();
            self.highlighted = highlighted;
        }
        self.current.push(ch);
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.current);
        match self.spans.last_mut() {
            Some(last) if last.highlighted == self.highlighted => last.text.push_str(&text),
            _ => self.spans.push(Span { text, highlighted: self.highlighted }),
        }
    }

    fn finish(mut self) -> Vec<Span> {
        self.flush();
        self.spans
    }
}
