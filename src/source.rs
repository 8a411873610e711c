//! Content source adapter.
//!
//! The workspace itself is reached through [`ContentSource`], which has two
//! operations: list every entry's metadata, and fetch one entry's body. It
//! carries no visibility rules; those live in [`crate::filter`] so they can
//! be tested without a live source.
//!
//! ## Snapshot layout
//!
//! [`ExportSource`] reads a workspace snapshot produced by an external export
//! tool:
//!
//! ```text
//! content/
//! ├── posts.json           # array of post metadata objects
//! └── records/
//!     ├── <id>.json        # record map for the post with that id
//!     └── ...
//! ```
//!
//! Nothing is retried here. A failed read surfaces as
//! [`SourceError::Unavailable`] and the caller's schedule decides when to try
//! again.

use crate::types::{Post, RecordMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the metadata list inside a snapshot directory.
pub const POSTS_FILENAME: &str = "posts.json";

/// Directory holding one record map per post id.
pub const RECORDS_DIR: &str = "records";

#[derive(Error, Debug)]
pub enum SourceError {
    /// The upstream call could not complete (transport, auth, malformed data).
    #[error("content source unavailable: {0}")]
    Unavailable(String),
    /// The requested id does not exist upstream.
    #[error("no record found for id: {0}")]
    NotFound(String),
}

/// Read access to the content workspace.
pub trait ContentSource {
    /// Metadata for every entry, in source order. Bodies are never included.
    fn fetch_all_entries(&self) -> Result<Vec<Post>, SourceError>;

    /// The body of the entry with the given id.
    fn fetch_body(&self, id: &str) -> Result<RecordMap, SourceError>;
}

impl<S: ContentSource + ?Sized> ContentSource for &S {
    fn fetch_all_entries(&self) -> Result<Vec<Post>, SourceError> {
        (**self).fetch_all_entries()
    }

    fn fetch_body(&self, id: &str) -> Result<RecordMap, SourceError> {
        (**self).fetch_body(id)
    }
}

/// A workspace snapshot on the local filesystem.
#[derive(Debug, Clone)]
pub struct ExportSource {
    root: PathBuf,
}

impl ExportSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &str) -> Option<PathBuf> {
        let safe = !id.is_empty()
            && !id.contains(['/', '\\'])
            && id != "."
            && id != "..";
        safe.then(|| self.root.join(RECORDS_DIR).join(format!("{id}.json")))
    }
}

impl ContentSource for ExportSource {
    fn fetch_all_entries(&self) -> Result<Vec<Post>, SourceError> {
        let path = self.root.join(POSTS_FILENAME);
        tracing::debug!(path = %path.display(), "reading post list");
        let content = fs::read_to_string(&path)
            .map_err(|e| SourceError::Unavailable(format!("{}: {e}", path.display())))?;
        let posts: Vec<Post> = serde_json::from_str(&content)
            .map_err(|e| SourceError::Unavailable(format!("{}: {e}", path.display())))?;
        tracing::debug!(count = posts.len(), "post list loaded");
        Ok(posts)
    }

    fn fetch_body(&self, id: &str) -> Result<RecordMap, SourceError> {
        let path = self
            .record_path(id)
            .ok_or_else(|| SourceError::NotFound(id.to_string()))?;
        tracing::debug!(id, path = %path.display(), "reading record map");
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound(id.to_string()));
            }
            Err(e) => {
                return Err(SourceError::Unavailable(format!("{}: {e}", path.display())));
            }
        };
        serde_json::from_str(&content)
            .map(RecordMap::new)
            .map_err(|e| SourceError::Unavailable(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snapshot(posts: &str) -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(POSTS_FILENAME), posts).unwrap();
        fs::create_dir_all(tmp.path().join(RECORDS_DIR)).unwrap();
        tmp
    }

    #[test]
    fn reads_posts_in_source_order() {
        let tmp = snapshot(
            r#"[
                { "id": "b", "slug": "second", "title": "Second" },
                { "id": "a", "slug": "first", "title": "First" }
            ]"#,
        );
        let posts = ExportSource::new(tmp.path()).fetch_all_entries().unwrap();
        let slugs: Vec<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["second", "first"]);
    }

    #[test]
    fn missing_post_list_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let err = ExportSource::new(tmp.path()).fetch_all_entries().unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
    }

    #[test]
    fn malformed_post_list_is_unavailable() {
        let tmp = snapshot(r#"{ "not": "a list" }"#);
        let err = ExportSource::new(tmp.path()).fetch_all_entries().unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
    }

    #[test]
    fn reads_record_map() {
        let tmp = snapshot("[]");
        fs::write(
            tmp.path().join(RECORDS_DIR).join("abc.json"),
            r#"{ "block": { "abc": { "value": { "type": "page" } } } }"#,
        )
        .unwrap();
        let body = ExportSource::new(tmp.path()).fetch_body("abc").unwrap();
        assert_eq!(body.as_value()["block"]["abc"]["value"]["type"], "page");
    }

    #[test]
    fn missing_record_is_not_found() {
        let tmp = snapshot("[]");
        let err = ExportSource::new(tmp.path()).fetch_body("nope").unwrap_err();
        assert!(matches!(err, SourceError::NotFound(id) if id == "nope"));
    }

    #[test]
    fn malformed_record_is_unavailable() {
        let tmp = snapshot("[]");
        fs::write(tmp.path().join(RECORDS_DIR).join("bad.json"), "{ nope").unwrap();
        let err = ExportSource::new(tmp.path()).fetch_body("bad").unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
    }

    #[test]
    fn ids_cannot_escape_the_snapshot() {
        let tmp = snapshot("[]");
        fs::write(tmp.path().join("secret.json"), "{}").unwrap();
        let source = ExportSource::new(tmp.path());
        for id in ["../secret", "..", "", "a/b", "a\\b"] {
            let err = source.fetch_body(id).unwrap_err();
            assert!(matches!(err, SourceError::NotFound(_)), "id {id:?} was not rejected");
        }
    }

    #[test]
    fn reads_fixture_snapshot() {
        let tmp = crate::test_helpers::setup_fixtures();
        let source = ExportSource::new(tmp.path());
        let posts = source.fetch_all_entries().unwrap();
        assert_eq!(posts.len(), 6);
        assert!(posts.iter().all(|p| !p.id.is_empty()));
        let body = source.fetch_body(&posts[0].id).unwrap();
        assert!(body.as_value()["block"].is_object());
        assert!(matches!(source.fetch_body("e5"), Err(SourceError::NotFound(_))));
    }
}
