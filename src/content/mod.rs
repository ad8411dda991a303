use crate::error::RenderError;

pub mod code_blocks;
pub mod heading_ids;
pub mod markdown_renderer;
pub mod post_fields;
pub mod toc;
pub mod typographer;

use heading_ids::DocumentHeadings;

pub use post_fields::{estimate_read_time, normalize_tags, validate_post};

/// Everything a post derives from its markdown source.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedContent {
    pub html: String,
    pub toc: String,
    pub read_time_minutes: u32,
}

/// Markdown to HTML conversion, table of contents and read time.
///
/// Holds no state, so one instance can serve every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentPipeline;

impl ContentPipeline {
    pub fn new() -> Self {
        ContentPipeline
    }

    pub fn render(&self, md_text: &str) -> Result<String, RenderError> {
        markdown_renderer::render_markdown(md_text)
    }

    pub fn extract_toc(&self, md_text: &str) -> Result<String, RenderError> {
        let tree = markdown_renderer::parse_markdown(md_text)?;
        Ok(toc::render_toc(&DocumentHeadings::from_tree(&tree)))
    }

    /// Derived fields are always recomputed from the whole source. Heading
    /// ids are assigned once and shared by the HTML and the TOC.
    pub fn process(&self, md_text: &str) -> Result<ProcessedContent, RenderError> {
        let tree = markdown_renderer::parse_markdown(md_text)?;
        let headings = DocumentHeadings::from_tree(&tree);
        Ok(ProcessedContent {
            html: markdown_renderer::render_with_headings(md_text, &headings)?,
            toc: toc::render_toc(&headings),
            read_time_minutes: estimate_read_time(md_text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::POST_CONTENT_MD;

    #[test]
    fn test_process() {
        let pipeline = ContentPipeline::new();
        let processed = pipeline.process("# Hello\n\nSome words here.").unwrap();
        assert!(processed.html.contains("<h1 id=\"hello\">Hello</h1>"));
        assert!(processed.html.contains("<p>Some words here.</p>"));
        assert!(processed.toc.contains("<a href=\"#hello\">Hello</a>"));
        assert_eq!(processed.read_time_minutes, 1);
    }

    #[test]
    fn test_process_toc_matches_html_ids() {
        let processed = ContentPipeline::new().process("# Intro\n\n<h2>Intro</h2>\n\n# Intro").unwrap();
        assert!(processed.toc.contains("href=\"#intro-1\""));
        assert!(processed.html.contains("<h1 id=\"intro-1\">Intro</h1>"));
        assert!(processed.html.contains("<h2>Intro</h2>"));
    }

    #[test]
    fn test_process_without_headings() {
        let processed = ContentPipeline::new().process("plain text").unwrap();
        assert_eq!(processed.toc, "");
    }

    #[test]
    fn test_render_then_toc_is_idempotent() {
        let pipeline = ContentPipeline::new();
        let first = pipeline.process(POST_CONTENT_MD).unwrap();
        let second = pipeline.process(POST_CONTENT_MD).unwrap();
        assert_eq!(first, second);
        assert_eq!(pipeline.extract_toc(POST_CONTENT_MD).unwrap(), first.toc);
    }
}
