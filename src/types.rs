//! Shared content types.
//!
//! [`Post`] mirrors one row of the workspace's post database as exported in
//! `posts.json`. Field names on the wire are the workspace's camelCase names
//! (`createdTime`, `date.start_date`, `type`, ...).
//!
//! A post read from the list export never carries a body. The body only exists
//! on [`PostDetail`], which cannot be built without a [`RecordMap`], so "list
//! entry" and "detail entry" are distinct types rather than one struct with an
//! optional field.
//!
//! ## Tolerated gaps
//!
//! Only `id` and `slug` are required. Everything else falls back to an empty
//! value, and `null` is treated the same as a missing key:
//!
//! | Field | Missing / null |
//! |-------|----------------|
//! | `title`, `createdTime` | `""` |
//! | `status`, `type`, `tags`, `categories` | `[]` |
//! | `description`, `summary`, `thumbnail`, `date` | `None` |

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Publication status of a post.
///
/// Labels the workspace does not know about yet are kept as [`Other`](Self::Other)
/// instead of failing the whole export.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PostStatus {
    Private,
    Public,
    /// Reachable by direct URL, hidden from listings.
    PublicOnDetail,
    Other(String),
}

impl PostStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Private => "Private",
            Self::Public => "Public",
            Self::PublicOnDetail => "PublicOnDetail",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for PostStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Private" => Self::Private,
            "Public" => Self::Public,
            "PublicOnDetail" => Self::PublicOnDetail,
            _ => Self::Other(label),
        }
    }
}

impl From<PostStatus> for String {
    fn from(status: PostStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of content a post represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PostType {
    Post,
    Paper,
    Page,
    Other(String),
}

impl PostType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Post => "Post",
            Self::Paper => "Paper",
            Self::Page => "Page",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for PostType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Post" => Self::Post,
            "Paper" => Self::Paper,
            "Page" => Self::Page,
            _ => Self::Other(label),
        }
    }
}

impl From<PostType> for String {
    fn from(kind: PostType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The workspace's date property. Only the start is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_date: String,
}

/// Post metadata as returned by the list export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Source-assigned opaque id, used to fetch the body.
    pub id: String,
    /// URL key.
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<PostDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: Vec<PostStatus>,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: Vec<PostType>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

impl Post {
    /// The date shown for this post: `date.start_date`, else `createdTime`.
    pub fn display_date(&self) -> &str {
        self.date
            .as_ref()
            .map(|d| d.start_date.trim())
            .filter(|d| !d.is_empty())
            .unwrap_or(self.created_time.as_str())
    }

    /// [`display_date`](Self::display_date) as a calendar date.
    ///
    /// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and Unix milliseconds.
    pub fn published_on(&self) -> Option<NaiveDate> {
        parse_date(self.display_date())
    }

    /// Short text for cards: first non-empty of description, summary.
    pub fn excerpt(&self) -> Option<&str> {
        [self.description.as_deref(), self.summary.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    pub fn has_status(&self, status: &PostStatus) -> bool {
        self.status.contains(status)
    }

    pub fn has_type(&self, kind: &PostType) -> bool {
        self.kind.contains(kind)
    }
}

/// Opaque post body handed to the client-side renderer untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordMap(serde_json::Value);

impl RecordMap {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Compact JSON encoding of the body.
    pub fn to_json(&self) -> String {
        self.0.to_string()
    }
}

/// A post together with its body. Only produced by
/// [`Pipeline::build_detail`](crate::pipeline::Pipeline::build_detail).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub record_map: RecordMap,
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|ts| ts.date_naive())
}

/// Deserialize `null` the same way as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::PostBuilder;

    #[test]
    fn parse_full_entry() {
        let json = r#"{
            "id": "p1",
            "slug": "hello",
            "title": "Hello",
            "description": "First post",
            "date": { "start_date": "2024-03-02" },
            "createdTime": "2024-03-01T10:00:00.000Z",
            "status": ["Public"],
            "type": ["Post"],
            "tags": ["AI", "Design"],
            "categories": ["Notes"]
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.slug, "hello");
        assert_eq!(post.status, vec![PostStatus::Public]);
        assert_eq!(post.kind, vec![PostType::Post]);
        assert_eq!(post.tags, vec!["AI", "Design"]);
        assert_eq!(post.display_date(), "2024-03-02");
    }

    #[test]
    fn missing_and_null_fields_default() {
        let json = r#"{ "id": "p2", "slug": "bare", "title": null, "tags": null }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.title, "");
        assert!(post.tags.is_empty());
        assert!(post.categories.is_empty());
        assert!(post.status.is_empty());
        assert!(post.kind.is_empty());
        assert!(post.date.is_none());
        assert_eq!(post.created_time, "");
    }

    #[test]
    fn missing_slug_is_rejected() {
        let json = r#"{ "id": "p3", "title": "No slug" }"#;
        assert!(serde_json::from_str::<Post>(json).is_err());
    }

    #[test]
    fn unknown_labels_are_preserved() {
        let json = r#"{ "id": "p4", "slug": "s", "status": ["Draft"], "type": ["Note"] }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.status, vec![PostStatus::Other("Draft".into())]);
        assert_eq!(post.kind, vec![PostType::Other("Note".into())]);

        let back = serde_json::to_value(&post).unwrap();
        assert_eq!(back["status"][0], "Draft");
        assert_eq!(back["type"][0], "Note");
    }

    #[test]
    fn display_date_falls_back_to_created_time() {
        let post = PostBuilder::new("a").created("2023-01-05").build();
        assert_eq!(post.display_date(), "2023-01-05");

        let blank = PostBuilder::new("b").date("  ").created("2023-01-06").build();
        assert_eq!(blank.display_date(), "2023-01-06");
    }

    #[test]
    fn published_on_accepts_supported_formats() {
        let ymd = PostBuilder::new("a").date("2024-02-29").build();
        assert_eq!(ymd.published_on(), NaiveDate::from_ymd_opt(2024, 2, 29));

        let rfc = PostBuilder::new("b").created("2024-05-01T23:00:00+00:00").build();
        assert_eq!(rfc.published_on(), NaiveDate::from_ymd_opt(2024, 5, 1));

        let millis = PostBuilder::new("c").created("1700000000000").build();
        assert_eq!(millis.published_on(), NaiveDate::from_ymd_opt(2023, 11, 14));

        let junk = PostBuilder::new("d").created("last tuesday").build();
        assert_eq!(junk.published_on(), None);
    }

    #[test]
    fn excerpt_prefers_description() {
        let mut post = PostBuilder::new("a").build();
        assert_eq!(post.excerpt(), None);

        post.summary = Some("summary".into());
        assert_eq!(post.excerpt(), Some("summary"));

        post.description = Some("   ".into());
        assert_eq!(post.excerpt(), Some("summary"));

        post.description = Some("description".into());
        assert_eq!(post.excerpt(), Some("description"));
    }

    #[test]
    fn detail_serializes_flat() {
        let post = PostBuilder::new("a").build();
        let detail = PostDetail {
            post,
            record_map: RecordMap::new(serde_json::json!({ "block": {} })),
        };
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["slug"], "a");
        assert!(value["recordMap"]["block"].is_object());
    }
}
