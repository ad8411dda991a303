use std::fmt::Write;

use crate::content::heading_ids::{DocumentHeadings, HeadingAnchor};
use crate::text_utils::escape_html;

struct TocItem<'a> {
    anchor: &'a HeadingAnchor,
    children: Vec<TocItem<'a>>,
}

/// Nested `<ul>` of links to every markdown heading, or an empty string
/// when there are none.
pub fn render_toc(headings: &DocumentHeadings) -> String {
    let mut items = vec![];
    for anchor in headings.anchors() {
        insert_item(&mut items, TocItem { anchor, children: vec![] });
    }

    if items.is_empty() {
        return String::new();
    }

    let mut buf = String::new();
    write_list(&items, &mut buf);
    buf
}

// A heading nests under the closest preceding heading with a smaller depth
fn insert_item<'a>(items: &mut Vec<TocItem<'a>>, item: TocItem<'a>) {
    match items.last_mut() {
        Some(last) if last.anchor.depth < item.anchor.depth => insert_item(&mut last.children, item),
        _ => items.push(item),
    }
}

fn write_list(items: &[TocItem<'_>], buf: &mut String) {
    buf.push_str("<ul>\n");
    for item in items {
        buf.push_str("<li>\n");
        let _ = write!(buf, "<a href=\"#{}\">{}</a>", item.anchor.id, escape_html(&item.anchor.title));
        if !item.children.is_empty() {
            write_list(&item.children, buf);
        }
        buf.push_str("</li>\n");
    }
    buf.push_str("</ul>\n");
}
