use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use ntex::web;
use ntex::web::error::BlockingError;
use serde::{Deserialize, Serialize};
use spdlog::{debug, info};

use crate::error::StorageError;
use crate::storage::{NewPost, Post, PostRepository, PostUpdate, Tag, TagRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct PostTag {
    post_id: i64,
    tag_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    posts: Vec<Post>,
    tags: Vec<Tag>,
    post_tags: Vec<PostTag>,
    last_post_id: i64,
    last_tag_id: i64,
}

impl StoreData {
    fn post_by_slug(&self, slug: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.slug == slug)
    }

    fn tags_of(&self, post_id: i64) -> Vec<Tag> {
        self.post_tags.iter()
            .filter(|pt| pt.post_id == post_id)
            .filter_map(|pt| self.tags.iter().find(|t| t.id == pt.tag_id))
            .cloned()
            .collect()
    }
}

/// Result of a write: whether the data moved, so untouched data is not saved again.
enum Outcome<T> {
    Changed(T),
    Unchanged(T),
}

struct Shared {
    data: RwLock<StoreData>,
    snapshot: Option<PathBuf>,
}

impl Shared {
    // The change runs on a copy; the copy replaces the data only once it is saved
    fn apply<T>(&self, change: impl FnOnce(&mut StoreData) -> Result<Outcome<T>, StorageError>) -> Result<T, StorageError> {
        let mut data = self.data.write().map_err(|_| StorageError::Poisoned)?;
        let mut next = data.clone();
        match change(&mut next)? {
            Outcome::Unchanged(res) => Ok(res),
            Outcome::Changed(res) => {
                if let Some(ref path) = self.snapshot {
                    persist(path, &next)?;
                }
                *data = next;
                Ok(res)
            }
        }
    }
}

/// Posts and tags kept in memory behind a lock, optionally mirrored to a
/// JSON snapshot file after every write.
pub struct MemoryStore {
    shared: Arc<Shared>,
    offset: FixedOffset,
}

impl MemoryStore {
    pub fn new(offset: FixedOffset) -> Self {
        MemoryStore {
            shared: Arc::new(Shared {
                data: RwLock::new(StoreData::default()),
                snapshot: None,
            }),
            offset,
        }
    }

    /// Loads `path` if it exists; every later write rewrites it.
    pub fn open(path: &Path, offset: FixedOffset) -> Result<Self, StorageError> {
        let data = if path.exists() {
            let raw = fs::read_to_string(path)?;
            let data: StoreData = serde_json::from_str(&raw)?;
            info!("Loaded {} posts and {} tags from {}", data.posts.len(), data.tags.len(), path.display());
            data
        } else {
            info!("No data file at {}, starting empty", path.display());
            StoreData::default()
        };

        Ok(MemoryStore {
            shared: Arc::new(Shared {
                data: RwLock::new(data),
                snapshot: Some(path.to_path_buf()),
            }),
            offset,
        })
    }

    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreData>, StorageError> {
        self.shared.data.read().map_err(|_| StorageError::Poisoned)
    }

    /// Writes touching the snapshot file run on the blocking pool.
    async fn write_with<T, F>(&self, change: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut StoreData) -> Result<Outcome<T>, StorageError> + Send + Sync + 'static,
        T: Send + 'static,
    {
        if self.shared.snapshot.is_none() {
            return self.shared.apply(change);
        }

        let shared = self.shared.clone();
        web::block(move || shared.apply(change)).await.map_err(|err| match err {
            BlockingError::Error(err) => err,
            BlockingError::Canceled => StorageError::Canceled,
        })
    }
}

fn persist(path: &Path, data: &StoreData) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, serde_json::to_string_pretty(data)?)?;
    fs::rename(&tmp_path, path)?;
    debug!("Store snapshot written to {}", path.display());
    Ok(())
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create_post(&self, post: NewPost) -> Result<Post, StorageError> {
        self.write_with(move |data| {
            if data.post_by_slug(&post.slug).is_some() {
                return Err(StorageError::DuplicateSlug(post.slug));
            }

            data.last_post_id += 1;
            let created = Post {
                id: data.last_post_id,
                title: post.title,
                slug: post.slug,
                content: post.content,
                parsed_content: post.parsed_content,
                toc: post.toc,
                description: post.description,
                read_time_minutes: post.read_time_minutes,
                created_at: post.created_at,
                modified_at: post.modified_at,
            };
            data.posts.push(created.clone());
            Ok(Outcome::Changed(created))
        }).await
    }

    async fn get_post_by_slug(&self, slug: &str) -> Result<Post, StorageError> {
        self.read()?
            .post_by_slug(slug)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("post {}", slug)))
    }

    async fn update_post_by_slug(&self, slug: &str, update: PostUpdate) -> Result<Post, StorageError> {
        let slug = slug.to_string();
        self.write_with(move |data| {
            let Some(post) = data.posts.iter_mut().find(|p| p.slug == slug) else {
                return Err(StorageError::NotFound(format!("post {}", slug)));
            };

            post.title = update.title;
            post.content = update.content;
            post.parsed_content = update.parsed_content;
            post.toc = update.toc;
            post.description = update.description;
            post.read_time_minutes = update.read_time_minutes;
            post.modified_at = update.modified_at;
            Ok(Outcome::Changed(post.clone()))
        }).await
    }

    async fn delete_post_by_slug(&self, slug: &str) -> Result<(), StorageError> {
        let slug = slug.to_string();
        self.write_with(move |data| {
            let Some(idx) = data.posts.iter().position(|p| p.slug == slug) else {
                return Err(StorageError::NotFound(format!("post {}", slug)));
            };

            let removed = data.posts.remove(idx);
            data.post_tags.retain(|pt| pt.post_id != removed.id);
            Ok(Outcome::Changed(()))
        }).await
    }

    async fn list_posts(&self, tag: Option<&str>) -> Result<Vec<Post>, StorageError> {
        let data = self.read()?;
        let mut posts: Vec<Post> = match tag {
            None => data.posts.clone(),
            Some(tag) => data.posts.iter()
                .filter(|p| data.tags_of(p.id).iter().any(|t| t.name == tag))
                .cloned()
                .collect(),
        };

        posts.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
        });
        Ok(posts)
    }
}

#[async_trait]
impl TagRepository for MemoryStore {
    async fn create_tag_if_not_exists(&self, name: &str) -> Result<Tag, StorageError> {
        let existing = self.read()?.tags.iter().find(|t| t.name == name).cloned();
        if let Some(tag) = existing {
            return Ok(tag);
        }

        let name = name.to_string();
        let now = self.now();
        self.write_with(move |data| {
            if let Some(tag) = data.tags.iter().find(|t| t.name == name) {
                return Ok(Outcome::Unchanged(tag.clone()));
            }

            data.last_tag_id += 1;
            let tag = Tag {
                id: data.last_tag_id,
                name,
                created_at: now,
                modified_at: now,
            };
            data.tags.push(tag.clone());
            Ok(Outcome::Changed(tag))
        }).await
    }

    async fn get_tags_for_post(&self, slug: &str) -> Result<Vec<Tag>, StorageError> {
        let data = self.read()?;
        Ok(match data.post_by_slug(slug) {
            Some(post) => data.tags_of(post.id),
            None => vec![],
        })
    }

    async fn add_tag_to_post(&self, post_id: i64, tag_id: i64) -> Result<(), StorageError> {
        self.write_with(move |data| {
            if !data.posts.iter().any(|p| p.id == post_id) {
                return Err(StorageError::NotFound(format!("post #{}", post_id)));
            }
            if !data.tags.iter().any(|t| t.id == tag_id) {
                return Err(StorageError::NotFound(format!("tag #{}", tag_id)));
            }

            let link = PostTag { post_id, tag_id };
            if data.post_tags.contains(&link) {
                return Ok(Outcome::Unchanged(()));
            }
            data.post_tags.push(link);
            Ok(Outcome::Changed(()))
        }).await
    }

    async fn clear_tags_for_post(&self, slug: &str) -> Result<(), StorageError> {
        let slug = slug.to_string();
        self.write_with(move |data| {
            let Some(post_id) = data.post_by_slug(&slug).map(|p| p.id) else {
                return Ok(Outcome::Unchanged(()));
            };

            let before = data.post_tags.len();
            data.post_tags.retain(|pt| pt.post_id != post_id);
            if data.post_tags.len() == before {
                return Ok(Outcome::Unchanged(()));
            }
            Ok(Outcome::Changed(()))
        }).await
    }

    async fn search_tags(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let data = self.read()?;
        let mut names: Vec<String> = data.tags.iter()
            .filter(|t| t.name.starts_with(prefix))
            .map(|t| t.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, StorageError> {
        let mut tags = self.read()?.tags.clone();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use chrono::Duration;

    use super::*;
    use crate::test_data::{new_post, utc_minus_3};

    #[ntex::test]
    async fn test_create_and_get() {
        let store = MemoryStore::new(utc_minus_3());
        let created = store.create_post(new_post("first-post", 0)).await.unwrap();
        assert_eq!(created.id, 1);

        let fetched = store.get_post_by_slug("first-post").await.unwrap();
        assert_eq!(fetched, created);

        let second = store.create_post(new_post("second-post", 1)).await.unwrap();
        assert_eq!(second.id, 2);
    }

    #[ntex::test]
    async fn test_duplicate_slug() {
        let store = MemoryStore::new(utc_minus_3());
        store.create_post(new_post("same-slug", 0)).await.unwrap();
        let err = store.create_post(new_post("same-slug", 1)).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateSlug(ref s) if s == "same-slug"));
        assert_eq!(store.list_posts(None).await.unwrap().len(), 1);
    }

    #[ntex::test]
    async fn test_missing_post() {
        let store = MemoryStore::new(utc_minus_3());
        assert!(matches!(store.get_post_by_slug("nope-nope").await, Err(StorageError::NotFound(_))));
        assert!(matches!(store.delete_post_by_slug("nope-nope").await, Err(StorageError::NotFound(_))));

        let update = PostUpdate {
            title: "t".to_string(),
            content: "c".to_string(),
            parsed_content: "c".to_string(),
            toc: String::new(),
            description: String::new(),
            read_time_minutes: 1,
            modified_at: Utc::now().with_timezone(&utc_minus_3()),
        };
        assert!(matches!(store.update_post_by_slug("nope-nope", update).await, Err(StorageError::NotFound(_))));
    }

    #[ntex::test]
    async fn test_update_keeps_identity() {
        let store = MemoryStore::new(utc_minus_3());
        let created = store.create_post(new_post("edit-me", 0)).await.unwrap();
        let modified_at = created.modified_at + Duration::minutes(5);
        let updated = store.update_post_by_slug("edit-me", PostUpdate {
            title: "New title".to_string(),
            content: "new".to_string(),
            parsed_content: "<p>new</p>".to_string(),
            toc: String::new(),
            description: "changed".to_string(),
            read_time_minutes: 1,
            modified_at,
        }).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.slug, "edit-me");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.modified_at, modified_at);
        assert_eq!(updated.title, "New title");
        assert_eq!(store.get_post_by_slug("edit-me").await.unwrap(), updated);
    }

    #[ntex::test]
    async fn test_list_newest_first_and_by_tag() {
        let store = MemoryStore::new(utc_minus_3());
        let old = store.create_post(new_post("older-post", 0)).await.unwrap();
        let new = store.create_post(new_post("newer-post", 60)).await.unwrap();

        let slugs: Vec<String> = store.list_posts(None).await.unwrap().into_iter().map(|p| p.slug).collect();
        assert_eq!(slugs, ["newer-post", "older-post"]);

        let rust = store.create_tag_if_not_exists("rust").await.unwrap();
        store.add_tag_to_post(old.id, rust.id).await.unwrap();
        let web = store.create_tag_if_not_exists("web").await.unwrap();
        store.add_tag_to_post(new.id, web.id).await.unwrap();

        let tagged = store.list_posts(Some("rust")).await.unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].slug, "older-post");
        assert!(store.list_posts(Some("Rust")).await.unwrap().is_empty());
    }

    #[ntex::test]
    async fn test_tags_created_once() {
        let store = MemoryStore::new(utc_minus_3());
        let first = store.create_tag_if_not_exists("rust").await.unwrap();
        let again = store.create_tag_if_not_exists("rust").await.unwrap();
        let other_case = store.create_tag_if_not_exists("Rust").await.unwrap();
        assert_eq!(first, again);
        assert_ne!(first.id, other_case.id);
        assert_eq!(store.list_tags().await.unwrap().len(), 2);
    }

    #[ntex::test]
    async fn test_post_tag_links() {
        let store = MemoryStore::new(utc_minus_3());
        let post = store.create_post(new_post("tagged-post", 0)).await.unwrap();
        let go = store.create_tag_if_not_exists("go").await.unwrap();
        let web = store.create_tag_if_not_exists("web").await.unwrap();

        store.add_tag_to_post(post.id, go.id).await.unwrap();
        store.add_tag_to_post(post.id, web.id).await.unwrap();
        store.add_tag_to_post(post.id, go.id).await.unwrap();

        let names: Vec<String> = store.get_tags_for_post("tagged-post").await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, ["go", "web"]);

        assert!(matches!(store.add_tag_to_post(99, go.id).await, Err(StorageError::NotFound(_))));
        assert!(matches!(store.add_tag_to_post(post.id, 99).await, Err(StorageError::NotFound(_))));

        store.clear_tags_for_post("tagged-post").await.unwrap();
        assert!(store.get_tags_for_post("tagged-post").await.unwrap().is_empty());
        // Tags themselves survive
        assert_eq!(store.list_tags().await.unwrap().len(), 2);

        assert!(store.get_tags_for_post("unknown-post").await.unwrap().is_empty());
        store.clear_tags_for_post("unknown-post").await.unwrap();
    }

    #[ntex::test]
    async fn test_delete_drops_links() {
        let store = MemoryStore::new(utc_minus_3());
        let post = store.create_post(new_post("doomed-post", 0)).await.unwrap();
        let tag = store.create_tag_if_not_exists("rust").await.unwrap();
        store.add_tag_to_post(post.id, tag.id).await.unwrap();

        store.delete_post_by_slug("doomed-post").await.unwrap();
        assert!(matches!(store.get_post_by_slug("doomed-post").await, Err(StorageError::NotFound(_))));
        assert!(store.list_posts(Some("rust")).await.unwrap().is_empty());
    }

    #[ntex::test]
    async fn test_search_tags() {
        let store = MemoryStore::new(utc_minus_3());
        for name in ["rust", "ruby", "go", "Rust"] {
            store.create_tag_if_not_exists(name).await.unwrap();
        }
        assert_eq!(store.search_tags("ru").await.unwrap(), ["ruby", "rust"]);
        assert_eq!(store.search_tags("R").await.unwrap(), ["Rust"]);
        assert!(store.search_tags("python").await.unwrap().is_empty());
    }

    #[ntex::test]
    async fn test_snapshot_round_trip() {
        let dir = env::temp_dir().join(format!("blogo-store-{}", std::process::id()));
        let path = dir.join("data.json");
        let _ = fs::remove_file(&path);

        {
            let store = MemoryStore::open(&path, utc_minus_3()).unwrap();
            let post = store.create_post(new_post("saved-post", 0)).await.unwrap();
            let tag = store.create_tag_if_not_exists("rust").await.unwrap();
            store.add_tag_to_post(post.id, tag.id).await.unwrap();
        }

        let reopened = MemoryStore::open(&path, utc_minus_3()).unwrap();
        let post = reopened.get_post_by_slug("saved-post").await.unwrap();
        assert_eq!(post.id, 1);
        assert_eq!(reopened.get_tags_for_post("saved-post").await.unwrap()[0].name, "rust");

        let next = reopened.create_post(new_post("another-post", 1)).await.unwrap();
        assert_eq!(next.id, 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[ntex::test]
    async fn test_failed_save_leaves_no_trace() {
        let dir = env::temp_dir().join(format!("blogo-store-fail-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        // A regular file where the data directory should be
        let blocker = dir.join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let store = MemoryStore::open(&blocker.join("data.json"), utc_minus_3()).unwrap();
        let err = store.create_post(new_post("slug-one", 0)).await.unwrap_err();
        assert!(matches!(err, StorageError::Io(_)), "{:?}", err);

        assert!(matches!(store.get_post_by_slug("slug-one").await, Err(StorageError::NotFound(_))));
        assert!(store.list_posts(None).await.unwrap().is_empty());
        assert!(matches!(store.create_post(new_post("slug-one", 0)).await, Err(StorageError::Io(_))));

        assert!(store.create_tag_if_not_exists("rust").await.is_err());
        assert!(store.list_tags().await.unwrap().is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[ntex::test]
    async fn test_unchanged_writes_skip_save() {
        let dir = env::temp_dir().join(format!("blogo-store-skip-{}", std::process::id()));
        let path = dir.join("data.json");
        let _ = fs::remove_dir_all(&dir);

        let store = MemoryStore::open(&path, utc_minus_3()).unwrap();
        let post = store.create_post(new_post("saved-post", 0)).await.unwrap();
        let tag = store.create_tag_if_not_exists("rust").await.unwrap();
        store.add_tag_to_post(post.id, tag.id).await.unwrap();
        fs::remove_file(&path).unwrap();

        store.create_tag_if_not_exists("rust").await.unwrap();
        store.add_tag_to_post(post.id, tag.id).await.unwrap();
        store.clear_tags_for_post("unknown-post").await.unwrap();
        assert!(!path.exists());

        store.clear_tags_for_post("saved-post").await.unwrap();
        assert!(path.exists());

        let _ = fs::remove_dir_all(&dir);
    }
}
