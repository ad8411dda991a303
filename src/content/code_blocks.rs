use std::fmt::Write;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Wraps every line of each `<pre><code>` block in a numbered span.
///
/// The `language-*` class emitted for fenced code is kept so the page can
/// apply syntax colouring to it.
pub fn number_code_lines(html: &str) -> String {
    lazy_static! {
        static ref CODE_BLOCK_REGEX: Regex = Regex::new(
            r#"(?s)<pre><code( class="[^"]*")?>(.*?)</code></pre>"#
        ).unwrap();
    }

    CODE_BLOCK_REGEX.replace_all(html, |caps: &Captures| {
        let class = caps.get(1).map_or("", |m| m.as_str());
        let body = caps.get(2).map_or("", |m| m.as_str());

        let mut buf = String::with_capacity(body.len() * 2);
        let _ = write!(&mut buf, "<pre class=\"code-block\"><code{}>", class);
        for (idx, line) in body.lines().enumerate() {
            let _ = writeln!(&mut buf, "<span class=\"line\"><span class=\"line-number\">{}</span>{}</span>", idx + 1, line);
        }
        buf.push_str("</code></pre>");
        buf
    }).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block() {
        let html = "<pre><code class=\"language-rust\">fn main() {\n}\n</code></pre>\n";
        assert_eq!(number_code_lines(html), concat!(
            "<pre class=\"code-block\"><code class=\"language-rust\">",
            "<span class=\"line\"><span class=\"line-number\">1</span>fn main() {</span>\n",
            "<span class=\"line\"><span class=\"line-number\">2</span>}</span>\n",
            "</code></pre>\n",
        ));
    }

    #[test]
    fn test_block_without_language() {
        let html = "<p>before</p>\n<pre><code>x\n</code></pre>";
        assert_eq!(
            number_code_lines(html),
            "<p>before</p>\n<pre class=\"code-block\"><code><span class=\"line\"><span class=\"line-number\">1</span>x</span>\n</code></pre>"
        );
    }

    #[test]
    fn test_inline_code_untouched() {
        let html = "<p>use <code>cargo</code></p>";
        assert_eq!(number_code_lines(html), html);
    }
}
