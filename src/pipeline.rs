//! One invocation of the content pipeline.
//!
//! A [`Pipeline`] is created by whoever triggers a build (the CLI), borrows a
//! [`ContentSource`], and holds the raw entry list for as long as it lives.
//! Every listing and every detail page within that invocation reads the same
//! snapshot, and nothing outlives it: the next invocation starts from a fresh
//! fetch.
//!
//! ```text
//! list mode:    fetch_all_entries → filter (list policy) → sort_by_date
//! detail mode:  fetch_all_entries → select_by_slug (detail policy) → fetch_body(id)
//! ```
//!
//! [`Pipeline::build_detail`] is the only place a body is fetched, so no id
//! reaches the source without passing the detail policy first.

use crate::filter::{self, DuplicateSlug, FilterPolicy, SelectError};
use crate::source::{ContentSource, SourceError};
use crate::types::{Post, PostDetail};
use indexmap::IndexSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("no post found for slug: {0}")]
    PostNotFound(String),
}

impl PipelineError {
    /// A missing post (render a 404) as opposed to a source failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PostNotFound(_))
    }
}

impl From<SelectError> for PipelineError {
    fn from(err: SelectError) -> Self {
        match err {
            SelectError::PostNotFound(slug) => Self::PostNotFound(slug),
        }
    }
}

/// List and detail policies used by a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policies {
    pub list: FilterPolicy,
    pub detail: FilterPolicy,
}

impl Policies {
    pub fn new(list: FilterPolicy, detail: FilterPolicy) -> Self {
        Self { list, detail }
    }

    /// [`FilterPolicy::list`] and [`FilterPolicy::detail`].
    pub fn standard() -> Self {
        Self::new(FilterPolicy::list(), FilterPolicy::detail())
    }
}

/// Problems found in the entry list by [`Pipeline::check`].
#[derive(Debug, Default)]
pub struct CheckReport {
    /// Number of raw entries in the snapshot.
    pub entries: usize,
    /// Posts under the list policy.
    pub listed: usize,
    /// Posts under the detail policy.
    pub reachable: usize,
    /// Slugs shared by more than one reachable post. Only the first gets a page.
    pub duplicates: Vec<DuplicateSlug>,
    /// Slugs of reachable posts with an empty title.
    pub untitled: Vec<String>,
    /// Slugs of reachable posts with no parseable date.
    pub undated: Vec<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.duplicates.is_empty()
    }
}

pub struct Pipeline<S> {
    source: S,
    policies: Policies,
    entries: Option<Vec<Post>>,
}

impl<S: ContentSource> Pipeline<S> {
    pub fn new(source: S, policies: Policies) -> Self {
        Self {
            source,
            policies,
            entries: None,
        }
    }

    pub fn policies(&self) -> &Policies {
        &self.policies
    }

    /// Raw entry list, fetched on first use.
    pub fn entries(&mut self) -> Result<&[Post], SourceError> {
        if self.entries.is_none() {
            let posts = self.source.fetch_all_entries()?;
            tracing::debug!(count = posts.len(), "entry list cached");
            self.entries = Some(posts);
        }
        Ok(self.entries.as_deref().unwrap_or_default())
    }

    /// Drop the cached entry list; the next call refetches.
    pub fn invalidate(&mut self) {
        self.entries = None;
    }

    /// Posts for index pages: list policy, newest first.
    pub fn list_posts(&mut self) -> Result<Vec<Post>, PipelineError> {
        let policy = self.policies.list.clone();
        let mut posts = filter::filter_posts(self.entries()?, &policy);
        filter::sort_by_date(&mut posts);
        Ok(posts)
    }

    /// Everything reachable by URL: detail policy, newest first.
    pub fn detail_posts(&mut self) -> Result<Vec<Post>, PipelineError> {
        let policy = self.policies.detail.clone();
        let mut posts = filter::filter_posts(self.entries()?, &policy);
        filter::sort_by_date(&mut posts);
        Ok(posts)
    }

    /// Slugs that resolve to a detail page, once each, in source order.
    pub fn detail_slugs(&mut self) -> Result<Vec<String>, PipelineError> {
        let policy = self.policies.detail.clone();
        let slugs: IndexSet<String> = self
            .entries()?
            .iter()
            .filter(|p| policy.accepts(p))
            .map(|p| p.slug.clone())
            .collect();
        Ok(slugs.into_iter().collect())
    }

    /// The post for `slug` with its body.
    pub fn build_detail(&mut self, slug: &str) -> Result<PostDetail, PipelineError> {
        let policy = self.policies.detail.clone();
        let post = filter::select_by_slug(self.entries()?, slug, &policy)?.clone();
        tracing::debug!(slug, id = %post.id, "fetching body");
        let record_map = self.source.fetch_body(&post.id)?;
        Ok(PostDetail { post, record_map })
    }

    /// Validate the entry list without fetching any body.
    pub fn check(&mut self) -> Result<CheckReport, PipelineError> {
        let policies = self.policies.clone();
        let entries = self.entries()?;
        let reachable = filter::filter_posts(entries, &policies.detail);
        Ok(CheckReport {
            entries: entries.len(),
            listed: filter::filter_posts(entries, &policies.list).len(),
            duplicates: filter::duplicate_slugs(entries, &policies.detail),
            untitled: reachable
                .iter()
                .filter(|p| p.title.trim().is_empty())
                .map(|p| p.slug.clone())
                .collect(),
            undated: reachable
                .iter()
                .filter(|p| p.published_on().is_none())
                .map(|p| p.slug.clone())
                .collect(),
            reachable: reachable.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MemorySource, PostBuilder, slugs};
    use crate::types::{PostStatus, PostType};

    fn source() -> MemorySource {
        MemorySource::new(vec![
            PostBuilder::new("old").id("1").date("2022-01-01").build(),
            PostBuilder::new("hidden")
                .id("2")
                .status(&[PostStatus::PublicOnDetail])
                .build(),
            PostBuilder::new("new").id("3").date("2024-01-01").build(),
            PostBuilder::new("secret")
                .id("4")
                .status(&[PostStatus::Private])
                .build(),
            PostBuilder::new("note")
                .id("5")
                .kind(&[PostType::Other("Note".into())])
                .build(),
        ])
        .with_body("1", serde_json::json!({ "block": { "1": {} } }))
        .with_body("2", serde_json::json!({ "block": { "2": {} } }))
        .with_body("4", serde_json::json!({ "block": { "4": {} } }))
    }

    #[test]
    fn list_posts_filters_and_sorts() {
        let source = source();
        let mut pipeline = Pipeline::new(&source, Policies::standard());
        let posts = pipeline.list_posts().unwrap();
        assert_eq!(slugs(&posts), vec!["new", "old", "note"]);
    }

    #[test]
    fn detail_posts_use_detail_policy_and_sort() {
        let source = source();
        let mut pipeline = Pipeline::new(&source, Policies::standard());
        let posts = pipeline.detail_posts().unwrap();
        assert_eq!(slugs(&posts), vec!["new", "old", "hidden"]);
        pipeline.list_posts().unwrap();
        assert_eq!(source.list_requests(), 1);
        assert!(source.body_requests().is_empty());
    }

    #[test]
    fn detail_slugs_use_detail_policy() {
        let source = source();
        let mut pipeline = Pipeline::new(&source, Policies::standard());
        assert_eq!(pipeline.detail_slugs().unwrap(), vec!["old", "hidden", "new"]);
    }

    #[test]
    fn build_detail_attaches_body() {
        let source = source();
        let mut pipeline = Pipeline::new(&source, Policies::standard());
        let detail = pipeline.build_detail("hidden").unwrap();
        assert_eq!(detail.post.id, "2");
        assert!(detail.record_map.as_value()["block"]["2"].is_object());
    }

    #[test]
    fn build_detail_never_fetches_hidden_body() {
        let source = source();
        let mut pipeline = Pipeline::new(&source, Policies::standard());
        let err = pipeline.build_detail("secret").unwrap_err();
        assert!(err.is_not_found());
        assert!(source.body_requests().is_empty());
    }

    #[test]
    fn missing_body_is_a_source_error() {
        let source = source();
        let mut pipeline = Pipeline::new(&source, Policies::standard());
        let err = pipeline.build_detail("new").unwrap_err();
        assert!(!err.is_not_found());
        assert!(matches!(err, PipelineError::Source(SourceError::NotFound(id)) if id == "3"));
    }

    #[test]
    fn source_failure_propagates_unchanged() {
        let source = MemorySource::unavailable();
        let mut pipeline = Pipeline::new(&source, Policies::standard());
        let err = pipeline.list_posts().unwrap_err();
        assert!(matches!(err, PipelineError::Source(SourceError::Unavailable(_))));
        let err = pipeline.build_detail("anything").unwrap_err();
        assert!(!err.is_not_found());
    }

    #[test]
    fn entries_fetched_once_until_invalidated() {
        let source = source();
        let mut pipeline = Pipeline::new(&source, Policies::standard());
        pipeline.list_posts().unwrap();
        pipeline.detail_slugs().unwrap();
        pipeline.build_detail("old").unwrap();
        assert_eq!(source.list_requests(), 1);

        pipeline.invalidate();
        pipeline.list_posts().unwrap();
        assert_eq!(source.list_requests(), 2);
    }

    #[test]
    fn check_reports_problems() {
        let source = MemorySource::new(vec![
            PostBuilder::new("dup").id("a").date("2024-01-01").build(),
            PostBuilder::new("dup").id("b").date("2024-01-02").build(),
            PostBuilder::new("blank").title("").date("2024-01-03").build(),
            PostBuilder::new("undated").build(),
            PostBuilder::new("dup").id("c").status(&[PostStatus::Private]).build(),
        ]);
        let mut pipeline = Pipeline::new(&source, Policies::standard());
        let report = pipeline.check().unwrap();
        assert_eq!(report.entries, 5);
        assert_eq!(report.reachable, 4);
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.duplicates[0].ids, vec!["a", "b"]);
        assert_eq!(report.untitled, vec!["blank"]);
        assert_eq!(report.undated, vec!["undated"]);
        assert!(!report.is_ok());
        assert!(source.body_requests().is_empty());
    }

    #[test]
    fn configured_policies_are_used() {
        let source = source();
        let mut list = FilterPolicy::list();
        list.accept_status.insert(PostStatus::Private);
        let mut pipeline = Pipeline::new(&source, Policies::new(list, FilterPolicy::detail()));
        let posts = pipeline.list_posts().unwrap();
        assert!(posts.iter().any(|p| p.slug == "secret"));
    }
}
