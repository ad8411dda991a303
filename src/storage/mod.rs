use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

pub mod memory_store;

/// A stored post. `parsed_content`, `toc` and `read_time_minutes` are derived
/// from `content` whenever it is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub parsed_content: String,
    pub toc: String,
    pub description: String,
    pub read_time_minutes: u32,
    pub created_at: DateTime<FixedOffset>,
    pub modified_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<FixedOffset>,
    pub modified_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub parsed_content: String,
    pub toc: String,
    pub description: String,
    pub read_time_minutes: u32,
    pub created_at: DateTime<FixedOffset>,
    pub modified_at: DateTime<FixedOffset>,
}

/// Replacement values for an existing post. The slug never changes.
#[derive(Debug, Clone)]
pub struct PostUpdate {
    pub title: String,
    pub content: String,
    pub parsed_content: String,
    pub toc: String,
    pub description: String,
    pub read_time_minutes: u32,
    pub modified_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostWithTags {
    pub post: Post,
    pub tags: Vec<Tag>,
}

/// Post persistence. Every call is atomic on its own; nothing spans calls.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, post: NewPost) -> Result<Post, StorageError>;
    async fn get_post_by_slug(&self, slug: &str) -> Result<Post, StorageError>;
    async fn update_post_by_slug(&self, slug: &str, update: PostUpdate) -> Result<Post, StorageError>;
    async fn delete_post_by_slug(&self, slug: &str) -> Result<(), StorageError>;
    /// Newest first, optionally only posts carrying `tag`.
    async fn list_posts(&self, tag: Option<&str>) -> Result<Vec<Post>, StorageError>;
}

#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn create_tag_if_not_exists(&self, name: &str) -> Result<Tag, StorageError>;
    async fn get_tags_for_post(&self, slug: &str) -> Result<Vec<Tag>, StorageError>;
    async fn add_tag_to_post(&self, post_id: i64, tag_id: i64) -> Result<(), StorageError>;
    async fn clear_tags_for_post(&self, slug: &str) -> Result<(), StorageError>;
    async fn search_tags(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
    async fn list_tags(&self) -> Result<Vec<Tag>, StorageError>;
}
