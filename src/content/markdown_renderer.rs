use markdown::mdast::Node;
use markdown::{CompileOptions, Options, ParseOptions};

use crate::content::code_blocks::number_code_lines;
use crate::content::heading_ids::DocumentHeadings;
use crate::content::typographer::smarten;
use crate::error::RenderError;

/// GitHub flavoured markdown with raw HTML passed through.
///
/// Raw HTML is only safe because the single author is trusted. Never feed
/// this configuration input from anyone else.
pub fn markdown_options() -> Options {
    Options {
        parse: ParseOptions::gfm(),
        compile: CompileOptions {
            allow_dangerous_html: true,
            allow_dangerous_protocol: true,
            ..CompileOptions::gfm()
        },
    }
}

pub fn parse_markdown(md_text: &str) -> Result<Node, RenderError> {
    markdown::to_mdast(md_text, &markdown_options().parse)
        .map_err(|e| RenderError::Markdown(e.reason))
}

pub fn render_markdown(md_text: &str) -> Result<String, RenderError> {
    let tree = parse_markdown(md_text)?;
    render_with_headings(md_text, &DocumentHeadings::from_tree(&tree))
}

/// Renders `md_text`, taking heading ids from `headings`, which must come
/// from the same source.
pub fn render_with_headings(md_text: &str, headings: &DocumentHeadings) -> Result<String, RenderError> {
    let html = markdown::to_html_with_options(md_text, &markdown_options())
        .map_err(|e| RenderError::Markdown(e.reason))?;

    let html = headings.annotate(&html);
    let html = smarten(&html);
    Ok(number_code_lines(&html))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_ids() {
        let html = render_markdown("# Teste\n\n## Teste 2\n\n## Teste 2").unwrap();
        assert!(html.contains("<h1 id=\"teste\">Teste</h1>"));
        assert!(html.contains("<h2 id=\"teste-2\">Teste 2</h2>"));
        assert!(html.contains("<h2 id=\"teste-2-1\">Teste 2</h2>"));
    }

    #[test]
    fn test_heading_with_inline_markup() {
        let html = render_markdown("## Using `cargo` & *friends*").unwrap();
        assert!(html.contains("<h2 id=\"using-cargo--friends\">"), "{}", html);
    }

    #[test]
    fn test_multi_line_heading_gets_id() {
        let html = render_markdown("Foo\nbar\n===\n\n# Foo bar").unwrap();
        assert!(html.contains("<h1 id=\"foo-bar\">Foo\nbar</h1>"), "{}", html);
        assert!(html.contains("<h1 id=\"foo-bar-1\">Foo bar</h1>"), "{}", html);
    }

    #[test]
    fn test_raw_html_heading_keeps_markup() {
        let html = render_markdown("# Intro\n\n<h2>Intro</h2>\n\n# Intro").unwrap();
        assert!(html.contains("<h1 id=\"intro\">Intro</h1>"), "{}", html);
        assert!(html.contains("<h2>Intro</h2>"), "{}", html);
        assert!(html.contains("<h1 id=\"intro-1\">Intro</h1>"), "{}", html);
        assert!(!html.contains("intro-2"), "{}", html);
    }

    #[test]
    fn test_gfm_extensions() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |").unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));

        let html = render_markdown("~~gone~~").unwrap();
        assert!(html.contains("<del>gone</del>"));

        let html = render_markdown("see https://example.com").unwrap();
        assert!(html.contains("<a href=\"https://example.com\">https://example.com</a>"));
    }

    #[test]
    fn test_raw_html_passthrough() {
        let html = render_markdown("<div class=\"note\">hi</div>").unwrap();
        assert!(html.contains("<div class=\"note\">hi</div>"));
    }

    #[test]
    fn test_typographic_substitutions() {
        let html = render_markdown("\"Quoted\" -- and more...").unwrap();
        assert!(html.contains("<p>&ldquo;Quoted&rdquo; &ndash; and more&hellip;</p>"), "{}", html);
    }

    #[test]
    fn test_fenced_code_line_numbers() {
        let html = render_markdown("```rust\nlet a = \"x\";\nlet b = a--;\n```").unwrap();
        assert!(html.contains("<pre class=\"code-block\"><code class=\"language-rust\">"));
        assert!(html.contains("<span class=\"line-number\">1</span>let a = &quot;x&quot;;</span>"));
        assert!(html.contains("<span class=\"line-number\">2</span>let b = a--;</span>"));
    }

    #[test]
    fn test_render_is_repeatable() {
        let src = crate::test_data::POST_CONTENT_MD;
        assert_eq!(render_markdown(src).unwrap(), render_markdown(src).unwrap());
    }

    #[test]
    fn test_parse_markdown() {
        let tree = parse_markdown("# Title\n\ntext").unwrap();
        let children = tree.children().unwrap();
        assert_eq!(children.len(), 2);
        assert!(matches!(children[0], Node::Heading(_)));
    }
}
