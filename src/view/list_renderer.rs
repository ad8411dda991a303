use ramhorns::Template;

use crate::error::RenderError;
use crate::query_string::list_link;
use crate::storage::{PostWithTags, Tag};
use crate::text_utils::format_date_time;
use crate::view::{parse_template, view_tags, PageContext, ViewTag};

#[derive(ramhorns::Content)]
struct ListPage<'a> {
    blog_name: &'a str,
    blog_title: &'a str,
    authenticated: bool,
    filtered: bool,
    tag_filter: &'a str,
    post_list: Vec<PostItem<'a>>,
    tags: Vec<ViewTag<'a>>,
    page_list: Vec<ViewPagination>,
    show_pagination: bool,
}

#[derive(ramhorns::Content)]
struct PostItem<'a> {
    date: String,
    time: String,
    link: String,
    slug: &'a str,
    title: &'a str,
    description: &'a str,
    read_time: u32,
    tags: Vec<ViewTag<'a>>,
    can_edit: bool,
}

#[derive(ramhorns::Content)]
struct ViewPagination {
    current: bool,
    number: u32,
    link: String,
}

/// One page of the post list.
pub struct ListPosts<'a> {
    pub posts: &'a [PostWithTags],
    pub cur_page: u32,
    pub page_count: u32,
    pub tag_filter: Option<&'a str>,
    /// Every known tag, for navigation.
    pub all_tags: &'a [Tag],
}

pub struct ListRenderer<'a> {
    template: Template<'a>,
}

impl<'a> ListRenderer<'a> {
    pub fn new(list_tpl_src: &'a str) -> Result<Self, RenderError> {
        Ok(ListRenderer {
            template: parse_template("list", list_tpl_src)?,
        })
    }

    pub fn render(&self, ctx: &PageContext, list: &ListPosts) -> String {
        let post_list = list.posts.iter()
            .map(|p| {
                let (date, time) = format_date_time(&p.post.created_at);
                PostItem {
                    date,
                    time,
                    link: format!("/post/{}", p.post.slug),
                    slug: &p.post.slug,
                    title: &p.post.title,
                    description: &p.post.description,
                    read_time: p.post.read_time_minutes,
                    tags: view_tags(&p.tags),
                    can_edit: ctx.authenticated,
                }
            })
            .collect();

        let page_list = (1..=list.page_count)
            .map(|number| ViewPagination {
                current: number == list.cur_page,
                number,
                link: list_link(list.tag_filter, number),
            })
            .collect();

        self.template.render(&ListPage {
            blog_name: ctx.blog_name,
            blog_title: ctx.blog_title,
            authenticated: ctx.authenticated,
            filtered: list.tag_filter.is_some(),
            tag_filter: list.tag_filter.unwrap_or_default(),
            post_list,
            tags: view_tags(list.all_tags),
            page_list,
            show_pagination: list.page_count > 1,
        })
    }
}
