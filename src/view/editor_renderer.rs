use ramhorns::Template;

use crate::error::RenderError;
use crate::storage::PostWithTags;
use crate::view::{parse_template, PageContext};

#[derive(ramhorns::Content)]
struct EditorPage<'a> {
    blog_name: &'a str,
    blog_title: &'a str,
    action: String,
    is_edit: bool,
    title: &'a str,
    slug: &'a str,
    description: &'a str,
    tags: String,
    content: &'a str,
}

pub struct EditorRenderer<'a> {
    template: Template<'a>,
}

impl<'a> EditorRenderer<'a> {
    pub fn new(editor_tpl_src: &'a str) -> Result<Self, RenderError> {
        Ok(EditorRenderer {
            template: parse_template("editor", editor_tpl_src)?,
        })
    }

    /// Empty form for a new post, or one filled with `existing` for editing.
    pub fn render(&self, ctx: &PageContext, existing: Option<&PostWithTags>) -> String {
        let page = match existing {
            None => EditorPage {
                blog_name: ctx.blog_name,
                blog_title: ctx.blog_title,
                action: "/post/new".to_string(),
                is_edit: false,
                title: "",
                slug: "",
                description: "",
                tags: String::new(),
                content: "",
            },
            Some(PostWithTags { post, tags }) => EditorPage {
                blog_name: ctx.blog_name,
                blog_title: ctx.blog_title,
                action: format!("/post/edit/{}", post.slug),
                is_edit: true,
                title: &post.title,
                slug: &post.slug,
                description: &post.description,
                tags: tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>().join(", "),
                content: &post.content,
            },
        };

        self.template.render(&page)
    }
}
