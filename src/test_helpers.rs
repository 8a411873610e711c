//! Shared test utilities.
//!
//! - [`PostBuilder`]: terse post construction with visible defaults
//!   (status `Public`, type `Post`, id `id-<slug>`, no date).
//! - [`MemorySource`]: an in-memory [`ContentSource`] that records what was
//!   asked of it.
//! - [`setup_fixtures`]: an isolated copy of `fixtures/content/`.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = MemorySource::new(vec![PostBuilder::new("hello").build()])
//!     .with_body("id-hello", serde_json::json!({}));
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use tempfile::TempDir;

use crate::source::{ContentSource, SourceError};
use crate::types::{Post, PostDate, PostStatus, PostType, RecordMap};

// =========================================================================
// Post construction
// =========================================================================

pub struct PostBuilder {
    post: Post,
}

impl PostBuilder {
    pub fn new(slug: &str) -> Self {
        Self {
            post: Post {
                id: format!("id-{slug}"),
                slug: slug.to_string(),
                title: slug.to_string(),
                description: None,
                summary: None,
                thumbnail: None,
                date: None,
                created_time: String::new(),
                status: vec![PostStatus::Public],
                kind: vec![PostType::Post],
                categories: Vec::new(),
                tags: Vec::new(),
            },
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.post.id = id.to_string();
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.post.title = title.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.post.description = Some(description.to_string());
        self
    }

    pub fn thumbnail(mut self, thumbnail: &str) -> Self {
        self.post.thumbnail = Some(thumbnail.to_string());
        self
    }

    pub fn date(mut self, start_date: &str) -> Self {
        self.post.date = Some(PostDate {
            start_date: start_date.to_string(),
        });
        self
    }

    pub fn created(mut self, created_time: &str) -> Self {
        self.post.created_time = created_time.to_string();
        self
    }

    pub fn status(mut self, status: &[PostStatus]) -> Self {
        self.post.status = status.to_vec();
        self
    }

    pub fn kind(mut self, kind: &[PostType]) -> Self {
        self.post.kind = kind.to_vec();
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.post.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn categories(mut self, categories: &[&str]) -> Self {
        self.post.categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn build(self) -> Post {
        self.post
    }
}

/// Slugs in order.
pub fn slugs(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|p| p.slug.as_str()).collect()
}

// =========================================================================
// In-memory source
// =========================================================================

pub struct MemorySource {
    posts: Option<Vec<Post>>,
    bodies: HashMap<String, serde_json::Value>,
    list_requests: Cell<usize>,
    body_requests: RefCell<Vec<String>>,
}

impl MemorySource {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts: Some(posts),
            bodies: HashMap::new(),
            list_requests: Cell::new(0),
            body_requests: RefCell::new(Vec::new()),
        }
    }

    /// A source whose every call fails with `Unavailable`.
    pub fn unavailable() -> Self {
        Self {
            posts: None,
            ..Self::new(Vec::new())
        }
    }

    pub fn with_body(mut self, id: &str, body: serde_json::Value) -> Self {
        self.bodies.insert(id.to_string(), body);
        self
    }

    pub fn list_requests(&self) -> usize {
        self.list_requests.get()
    }

    /// Ids passed to `fetch_body`, in call order.
    pub fn body_requests(&self) -> Vec<String> {
        self.body_requests.borrow().clone()
    }
}

impl ContentSource for MemorySource {
    fn fetch_all_entries(&self) -> Result<Vec<Post>, SourceError> {
        self.list_requests.set(self.list_requests.get() + 1);
        self.posts
            .clone()
            .ok_or_else(|| SourceError::Unavailable("memory source offline".into()))
    }

    fn fetch_body(&self, id: &str) -> Result<RecordMap, SourceError> {
        self.body_requests.borrow_mut().push(id.to_string());
        if self.posts.is_none() {
            return Err(SourceError::Unavailable("memory source offline".into()));
        }
        self.bodies
            .get(id)
            .cloned()
            .map(RecordMap::new)
            .ok_or_else(|| SourceError::NotFound(id.to_string()))
    }
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}
