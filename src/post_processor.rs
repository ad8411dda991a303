use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use spdlog::{debug, error, info};

use crate::content::{normalize_tags, validate_post, ContentPipeline, ProcessedContent};
use crate::error::BlogError;
use crate::storage::{NewPost, Post, PostRepository, PostUpdate, PostWithTags, TagRepository};

/// Fields submitted by the editor. Missing fields arrive empty and fail validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    /// Comma separated
    pub tags: String,
}

/// Multi-step post writes over the repositories.
///
/// Steps are not transactional. The first failing step aborts the rest and
/// its error is returned, so a post can be left with only part of its tags.
#[derive(Clone)]
pub struct PostProcessor {
    posts: Arc<dyn PostRepository>,
    tags: Arc<dyn TagRepository>,
    pipeline: ContentPipeline,
    offset: FixedOffset,
}

impl PostProcessor {
    pub fn new(posts: Arc<dyn PostRepository>, tags: Arc<dyn TagRepository>, offset: FixedOffset) -> Self {
        PostProcessor {
            posts,
            tags,
            pipeline: ContentPipeline::new(),
            offset,
        }
    }

    pub fn pipeline(&self) -> &ContentPipeline {
        &self.pipeline
    }

    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    fn process(&self, slug: &str, content: &str) -> Result<ProcessedContent, BlogError> {
        self.pipeline.process(content).map_err(|e| {
            error!("Error rendering post {}: {}", slug, e);
            e.into()
        })
    }

    pub async fn create_post(&self, form: PostForm) -> Result<PostWithTags, BlogError> {
        validate_post(&form.title, &form.content, &form.slug)?;
        let processed = self.process(&form.slug, &form.content)?;

        let now = self.now();
        let post = self.posts.create_post(NewPost {
            title: form.title,
            slug: form.slug,
            content: form.content,
            parsed_content: processed.html,
            toc: processed.toc,
            description: form.description,
            read_time_minutes: processed.read_time_minutes,
            created_at: now,
            modified_at: now,
        }).await?;
        info!("Created post {} (#{})", post.slug, post.id);

        self.link_tags(post, &form.tags).await
    }

    /// The slug comes from the path and never changes.
    pub async fn edit_post(&self, slug: &str, form: PostForm) -> Result<PostWithTags, BlogError> {
        validate_post(&form.title, &form.content, slug)?;
        self.posts.get_post_by_slug(slug).await?;
        let processed = self.process(slug, &form.content)?;

        let post = self.posts.update_post_by_slug(slug, PostUpdate {
            title: form.title,
            content: form.content,
            parsed_content: processed.html,
            toc: processed.toc,
            description: form.description,
            read_time_minutes: processed.read_time_minutes,
            modified_at: self.now(),
        }).await?;
        info!("Updated post {}", slug);

        self.tags.clear_tags_for_post(slug).await?;
        debug!("Cleared tags of post {}", slug);
        self.link_tags(post, &form.tags).await
    }

    pub async fn delete_post(&self, slug: &str) -> Result<(), BlogError> {
        self.tags.clear_tags_for_post(slug).await?;
        self.posts.delete_post_by_slug(slug).await?;
        info!("Deleted post {}", slug);
        Ok(())
    }

    async fn link_tags(&self, post: Post, raw_tags: &str) -> Result<PostWithTags, BlogError> {
        let mut tags = vec![];
        for name in normalize_tags(raw_tags) {
            let tag = self.tags.create_tag_if_not_exists(&name).await?;
            self.tags.add_tag_to_post(post.id, tag.id).await?;
            debug!("Tagged post {} with {}", post.slug, tag.name);
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        Ok(PostWithTags { post, tags })
    }

    pub async fn get_post(&self, slug: &str) -> Result<PostWithTags, BlogError> {
        let post = self.posts.get_post_by_slug(slug).await?;
        let tags = self.tags.get_tags_for_post(slug).await?;
        Ok(PostWithTags { post, tags })
    }

    /// Newest first.
    pub async fn list_posts(&self, tag: Option<&str>) -> Result<Vec<PostWithTags>, BlogError> {
        let posts = self.posts.list_posts(tag).await?;
        let mut res = Vec::with_capacity(posts.len());
        for post in posts {
            let tags = self.tags.get_tags_for_post(&post.slug).await?;
            res.push(PostWithTags { post, tags });
        }
        Ok(res)
    }
}
