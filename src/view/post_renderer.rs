use ramhorns::Template;

use crate::error::RenderError;
use crate::storage::PostWithTags;
use crate::text_utils::format_date_time;
use crate::view::{parse_template, view_tags, PageContext, ViewTag};

#[derive(ramhorns::Content)]
struct ViewItem<'a> {
    blog_name: &'a str,
    blog_title: &'a str,
    authenticated: bool,
    slug: &'a str,
    tags: Vec<ViewTag<'a>>,
    date: &'a str,
    time: &'a str,
    read_time: u32,
    description: &'a str,
    has_toc: bool,
    toc: &'a str,
    post_title: &'a str,
    post_content: &'a str,
}

pub struct PostRenderer<'a> {
    template: Template<'a>,
}

impl<'a> PostRenderer<'a> {
    pub fn new(view_tpl_src: &'a str) -> Result<Self, RenderError> {
        Ok(PostRenderer {
            template: parse_template("view", view_tpl_src)?,
        })
    }

    pub fn render(&self, ctx: &PageContext, content: &PostWithTags) -> String {
        let post = &content.post;
        let (date, time) = format_date_time(&post.created_at);
        self.template.render(&ViewItem {
            blog_name: ctx.blog_name,
            blog_title: ctx.blog_title,
            authenticated: ctx.authenticated,
            slug: &post.slug,
            tags: view_tags(&content.tags),
            date: &date,
            time: &time,
            read_time: post.read_time_minutes,
            description: &post.description,
            has_toc: !post.toc.is_empty(),
            toc: &post.toc,
            post_title: &post.title,
            post_content: &post.parsed_content,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::storage::{Post, Tag};
    use crate::test_data::utc_minus_3;

    fn content() -> PostWithTags {
        let date = utc_minus_3().with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        PostWithTags {
            post: Post {
                id: 7,
                title: "<post-title>".to_string(),
                slug: "post-slug".to_string(),
                content: "# Hi".to_string(),
                parsed_content: "<post-content>".to_string(),
                toc: "<ul>toc</ul>".to_string(),
                description: "desc".to_string(),
                read_time_minutes: 2,
                created_at: date,
                modified_at: date,
            },
            tags: vec![
                Tag { id: 1, name: "<rust>".to_string(), created_at: date, modified_at: date },
                Tag { id: 2, name: "programming".to_string(), created_at: date, modified_at: date },
            ],
        }
    }

    #[test]
    fn render_view() {
        let template_src = r##"
TITLE=[{{post_title}}]
DATE=[{{date}}]
TIME=[{{time}}]
READ=[{{read_time}}]
TAGS=[{{#tags}}({{name}}){{/tags}}]
TOC=[{{#has_toc}}{{{toc}}}{{/has_toc}}]
EDIT=[{{#authenticated}}/editor/{{slug}}{{/authenticated}}]
POST_CONTENT=[{{{post_content}}}]"##;
        let post_renderer = PostRenderer::new(template_src).unwrap();
        let ctx = PageContext { blog_name: "Blog", blog_title: "My Blog", authenticated: true };
        let res = post_renderer.render(&ctx, &content());
        assert_eq!(res, r##"
TITLE=[&lt;post-title&gt;]
DATE=[2024-01-02]
TIME=[03:04:05]
READ=[2]
TAGS=[(&lt;rust&gt;)(programming)]
TOC=[<ul>toc</ul>]
EDIT=[/editor/post-slug]
POST_CONTENT=[<post-content>]"##);
    }

    #[test]
    fn render_anonymous_without_controls() {
        let views = crate::view::Views::load().unwrap();
        let ctx = PageContext { blog_name: "Blog", blog_title: "My Blog", authenticated: false };
        let res = views.post.render(&ctx, &content());
        assert!(res.contains("<post-content>"));
        assert!(res.contains("<nav class=\"toc\"><ul>toc</ul></nav>"));
        assert!(!res.contains("/editor/post-slug"));
        assert!(res.contains("href=\"/login\""));
    }
}
