use ramhorns::Template;

use crate::error::RenderError;
use crate::view::{parse_template, PageContext};

#[derive(ramhorns::Content)]
struct LoginPage<'a> {
    blog_name: &'a str,
    blog_title: &'a str,
    failed: bool,
}

pub struct LoginRenderer<'a> {
    template: Template<'a>,
}

impl<'a> LoginRenderer<'a> {
    pub fn new(login_tpl_src: &'a str) -> Result<Self, RenderError> {
        Ok(LoginRenderer {
            template: parse_template("login", login_tpl_src)?,
        })
    }

    pub fn render(&self, ctx: &PageContext, failed: bool) -> String {
        self.template.render(&LoginPage {
            blog_name: ctx.blog_name,
            blog_title: ctx.blog_title,
            failed,
        })
    }
}
