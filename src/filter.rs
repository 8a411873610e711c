//! Visibility rules: which workspace entries become posts, and which post a
//! slug refers to.
//!
//! A [`FilterPolicy`] names the statuses and types that count as visible. A
//! post passes when at least one of its statuses is accepted and (unless the
//! policy leaves types unrestricted) at least one of its types is accepted.
//!
//! There is one named policy per use case:
//!
//! | Policy | Status | Type |
//! |--------|--------|------|
//! | [`FilterPolicy::list`] (also `Default`) | Public | any |
//! | [`FilterPolicy::detail`] | Public, PublicOnDetail | Paper, Post, Page |
//!
//! so a `PublicOnDetail` post gets a page of its own but never shows up in
//! listings. Both can be overridden in `config.toml`.
//!
//! Filtering is stable: the output keeps input order. Sorting is a separate,
//! explicit step ([`sort_by_date`]).

use crate::types::{Post, PostStatus, PostType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    #[error("no post found for slug: {0}")]
    PostNotFound(String),
}

/// Accepted statuses and types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterPolicy {
    pub accept_status: BTreeSet<PostStatus>,
    /// `None` accepts every type, including posts with no type at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_type: Option<BTreeSet<PostType>>,
}

impl FilterPolicy {
    /// Index and listing pages: public posts of any type.
    pub fn list() -> Self {
        Self {
            accept_status: BTreeSet::from([PostStatus::Public]),
            accept_type: None,
        }
    }

    /// Detail pages: public and detail-only posts of the known types.
    pub fn detail() -> Self {
        Self {
            accept_status: BTreeSet::from([PostStatus::Public, PostStatus::PublicOnDetail]),
            accept_type: Some(BTreeSet::from([PostType::Paper, PostType::Post, PostType::Page])),
        }
    }

    pub fn accepts(&self, post: &Post) -> bool {
        let status_ok = post.status.iter().any(|s| self.accept_status.contains(s));
        let type_ok = match &self.accept_type {
            None => true,
            Some(types) => post.kind.iter().any(|t| types.contains(t)),
        };
        status_ok && type_ok
    }

    /// True when everything this policy accepts, `other` accepts too.
    pub fn is_narrower_than(&self, other: &FilterPolicy) -> bool {
        let types_ok = match (&self.accept_type, &other.accept_type) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(mine), Some(theirs)) => mine.is_subset(theirs),
        };
        self.accept_status.is_subset(&other.accept_status) && types_ok
    }
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self::list()
    }
}

/// Posts accepted by `policy`, in input order.
pub fn filter_posts(posts: &[Post], policy: &FilterPolicy) -> Vec<Post> {
    posts.iter().filter(|p| policy.accepts(p)).cloned().collect()
}

/// The first post accepted by `policy` whose slug is `slug`.
///
/// Callers resolving a detail page pass [`FilterPolicy::detail`] (or the
/// configured equivalent). When several visible posts share the slug the
/// first one in input order wins and a warning names the rest.
pub fn select_by_slug<'a>(
    posts: &'a [Post],
    slug: &str,
    policy: &FilterPolicy,
) -> Result<&'a Post, SelectError> {
    let mut matches = posts
        .iter()
        .filter(|p| policy.accepts(p))
        .filter(|p| p.slug == slug);

    let chosen = matches
        .next()
        .ok_or_else(|| SelectError::PostNotFound(slug.to_string()))?;

    let ignored: Vec<&str> = matches.map(|p| p.id.as_str()).collect();
    if !ignored.is_empty() {
        tracing::warn!(
            slug,
            chosen = %chosen.id,
            ignored = ?ignored,
            "duplicate slug among visible posts; using the first"
        );
    }
    Ok(chosen)
}

/// A slug shared by more than one visible post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSlug {
    pub slug: String,
    /// Ids of the posts sharing the slug, in input order.
    pub ids: Vec<String>,
}

/// Every slug that more than one post accepted by `policy` uses.
pub fn duplicate_slugs(posts: &[Post], policy: &FilterPolicy) -> Vec<DuplicateSlug> {
    let mut by_slug: IndexMap<&str, Vec<&str>> = IndexMap::new();
    for post in posts.iter().filter(|p| policy.accepts(p)) {
        by_slug.entry(post.slug.as_str()).or_default().push(post.id.as_str());
    }
    by_slug
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(slug, ids)| DuplicateSlug {
            slug: slug.to_string(),
            ids: ids.into_iter().map(str::to_string).collect(),
        })
        .collect()
}

/// Newest first. Posts without a parseable date go last; ties keep input order.
pub fn sort_by_date(posts: &mut [Post]) {
    posts.sort_by_key(|p| Reverse(p.published_on()));
}
