use std::collections::HashSet;

use lazy_static::lazy_static;
use markdown::mdast::Node;
use regex::{Captures, Regex};

lazy_static! {
    static ref HEADING_OPEN_REGEX: Regex = Regex::new(r"<h([1-6])>").unwrap();
}

/// Generates anchor ids for headings, unique within one document.
///
/// `Getting Started` becomes `getting-started`; a second heading with the
/// same text becomes `getting-started-1`, then `getting-started-2`.
#[derive(Default)]
pub struct HeadingIds {
    seen: HashSet<String>,
}

impl HeadingIds {
    pub fn new() -> Self {
        HeadingIds::default()
    }

    pub fn generate(&mut self, text: &str) -> String {
        let base = base_id(text);
        if self.seen.insert(base.clone()) {
            return base;
        }

        let mut n = 1;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.seen.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// A heading written in markdown, with the anchor id it links to.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingAnchor {
    pub depth: u8,
    pub id: String,
    pub title: String,
}

#[derive(Debug)]
enum HeadingMark {
    Markdown(HeadingAnchor),
    // `<hN>` opening written as raw HTML, left as is
    Raw,
}

/// Every heading of a document in order, ids assigned once.
///
/// Feeds both the `id` attributes of the rendered HTML and the table of
/// contents, so a link always lands on the heading it names.
#[derive(Debug)]
pub struct DocumentHeadings {
    marks: Vec<HeadingMark>,
}

impl DocumentHeadings {
    pub fn from_tree(root: &Node) -> Self {
        let mut ids = HeadingIds::new();
        let mut marks = vec![];
        collect_marks(root, &mut ids, &mut marks);
        DocumentHeadings { marks }
    }

    pub fn anchors(&self) -> impl Iterator<Item = &HeadingAnchor> {
        self.marks.iter().filter_map(|mark| match mark {
            HeadingMark::Markdown(anchor) => Some(anchor),
            HeadingMark::Raw => None,
        })
    }

    /// Adds the ids to the `<hN>` openings of `html`, the markdown output of
    /// the same document. Raw HTML headings keep their markup.
    pub fn annotate(&self, html: &str) -> String {
        let mut marks = self.marks.iter();
        HEADING_OPEN_REGEX.replace_all(html, |caps: &Captures| {
            match marks.next() {
                Some(HeadingMark::Markdown(anchor)) => format!("<h{} id=\"{}\">", &caps[1], anchor.id),
                _ => caps[0].to_string(),
            }
        }).into_owned()
    }
}

fn collect_marks(node: &Node, ids: &mut HeadingIds, marks: &mut Vec<HeadingMark>) {
    match node {
        Node::Heading(heading) => {
            let mut title = String::new();
            heading_text(node, &mut title);
            let id = ids.generate(&title);
            marks.push(HeadingMark::Markdown(HeadingAnchor {
                depth: heading.depth,
                id,
                title: title.trim().to_string(),
            }));
        }
        Node::Html(html) => {
            marks.extend(HEADING_OPEN_REGEX.find_iter(&html.value).map(|_| HeadingMark::Raw));
        }
        _ => {}
    }

    if let Some(children) = node.children() {
        for child in children {
            collect_marks(child, ids, marks);
        }
    }
}

// Visible text only: inline HTML tags are left out
fn heading_text(node: &Node, buf: &mut String) {
    match node {
        Node::Text(text) => buf.push_str(&text.value),
        Node::InlineCode(code) => buf.push_str(&code.value),
        Node::Break(_) => buf.push(' '),
        Node::Html(_) => {}
        _ => {
            if let Some(children) = node.children() {
                for child in children {
                    heading_text(child, buf);
                }
            }
        }
    }
}

fn base_id(text: &str) -> String {
    let ascii = unidecode::unidecode(text.trim());
    let mut id = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            id.push(c.to_ascii_lowercase());
        } else if c.is_ascii_whitespace() || c == '-' || c == '_' {
            id.push('-');
        }
    }

    if id.is_empty() {
        return "heading".to_string();
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::markdown_renderer::parse_markdown;

    fn headings(src: &str) -> DocumentHeadings {
        DocumentHeadings::from_tree(&parse_markdown(src).unwrap())
    }

    fn ids(src: &str) -> Vec<String> {
        headings(src).anchors().map(|a| a.id.clone()).collect()
    }

    #[test]
    fn test_base_ids() {
        assert_eq!(base_id("Teste"), "teste");
        assert_eq!(base_id("  Teste 2 "), "teste-2");
        assert_eq!(base_id("Hello, World!"), "hello-world");
        assert_eq!(base_id("snake_case and-dash"), "snake-case-and-dash");
        assert_eq!(base_id("Introdução à Rust"), "introducao-a-rust");
        assert_eq!(base_id("!!!"), "heading");
        assert_eq!(base_id(""), "heading");
    }

    #[test]
    fn test_duplicates_get_suffix() {
        let mut ids = HeadingIds::new();
        assert_eq!(ids.generate("Setup"), "setup");
        assert_eq!(ids.generate("Setup"), "setup-1");
        assert_eq!(ids.generate("Setup"), "setup-2");
        assert_eq!(ids.generate("Other"), "other");
    }

    #[test]
    fn test_suffix_skips_taken_ids() {
        let mut ids = HeadingIds::new();
        assert_eq!(ids.generate("Setup 1"), "setup-1");
        assert_eq!(ids.generate("Setup"), "setup");
        assert_eq!(ids.generate("Setup"), "setup-2");
    }

    #[test]
    fn test_document_headings() {
        assert_eq!(ids("# Setup\n\n## Setup\n\ntext\n\n### Other"), ["setup", "setup-1", "other"]);
        assert!(ids("no headings here").is_empty());

        let doc = headings("# Title\n\n## Sub *part*");
        let anchors: Vec<&HeadingAnchor> = doc.anchors().collect();
        assert_eq!(anchors[0], &HeadingAnchor { depth: 1, id: "title".to_string(), title: "Title".to_string() });
        assert_eq!(anchors[1].depth, 2);
        assert_eq!(anchors[1].title, "Sub part");
    }

    #[test]
    fn test_multi_line_heading() {
        let doc = headings("Foo\nbar\n===\n\n# Foo bar");
        assert_eq!(doc.anchors().map(|a| a.id.as_str()).collect::<Vec<_>>(), ["foo-bar", "foo-bar-1"]);

        let html = doc.annotate("<h1>Foo\nbar</h1>\n<h1>Foo bar</h1>");
        assert_eq!(html, "<h1 id=\"foo-bar\">Foo\nbar</h1>\n<h1 id=\"foo-bar-1\">Foo bar</h1>");
    }

    #[test]
    fn test_raw_html_headings_are_skipped() {
        let doc = headings("# Intro\n\n<h2>Intro</h2>\n\n# Intro");
        assert_eq!(doc.anchors().map(|a| a.id.as_str()).collect::<Vec<_>>(), ["intro", "intro-1"]);

        let html = doc.annotate("<h1>Intro</h1>\n<h2>Intro</h2>\n<h1>Intro</h1>");
        assert_eq!(html, "<h1 id=\"intro\">Intro</h1>\n<h2>Intro</h2>\n<h1 id=\"intro-1\">Intro</h1>");
    }

    #[test]
    fn test_inline_html_is_not_heading_text() {
        assert_eq!(ids("## Hello <em>there</em>"), ["hello-there"]);
    }
}
