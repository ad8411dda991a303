use ramhorns::Template;

use crate::error::RenderError;
use crate::query_string::list_link;
use crate::storage::Tag;

pub mod editor_renderer;
pub mod list_renderer;
pub mod login_renderer;
pub mod post_renderer;

const LIST_TPL: &str = include_str!("../../res/template/list.tpl");
const VIEW_TPL: &str = include_str!("../../res/template/view.tpl");
const EDITOR_TPL: &str = include_str!("../../res/template/editor.tpl");
const LOGIN_TPL: &str = include_str!("../../res/template/login.tpl");

/// What every page shows around its content.
pub struct PageContext<'a> {
    pub blog_name: &'a str,
    pub blog_title: &'a str,
    pub authenticated: bool,
}

#[derive(ramhorns::Content)]
struct ViewTag<'a> {
    name: &'a str,
    link: String,
}

fn view_tags(tags: &[Tag]) -> Vec<ViewTag<'_>> {
    tags.iter()
        .map(|t| ViewTag { name: t.name.as_str(), link: list_link(Some(&t.name), 1) })
        .collect()
}

pub(crate) fn parse_template<'a>(name: &'static str, src: &'a str) -> Result<Template<'a>, RenderError> {
    Template::new(src).map_err(|e| RenderError::Template { name, reason: e.to_string() })
}

/// All page renderers, parsed once at startup from the bundled templates.
pub struct Views {
    pub list: list_renderer::ListRenderer<'static>,
    pub post: post_renderer::PostRenderer<'static>,
    pub editor: editor_renderer::EditorRenderer<'static>,
    pub login: login_renderer::LoginRenderer<'static>,
}

impl Views {
    pub fn load() -> Result<Self, RenderError> {
        Ok(Views {
            list: list_renderer::ListRenderer::new(LIST_TPL)?,
            post: post_renderer::PostRenderer::new(VIEW_TPL)?,
            editor: editor_renderer::EditorRenderer::new(EDITOR_TPL)?,
            login: login_renderer::LoginRenderer::new(LOGIN_TPL)?,
        })
    }
}
