//! Tag and category counts, and the title/category search used by the blog
//! page.
//!
//! Counts are kept in first-occurrence order ([`ItemCounts`]). Ranking by
//! count is a separate step ([`ranked`]) so callers choose whether they want
//! source order or popularity order.

use crate::types::Post;
use indexmap::IndexMap;

/// Label → number of posts carrying it, in first-occurrence order.
pub type ItemCounts = IndexMap<String, usize>;

/// List-valued post field to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectKey {
    Tags,
    Categories,
}

impl SelectKey {
    fn values(self, post: &Post) -> &[String] {
        match self {
            Self::Tags => &post.tags,
            Self::Categories => &post.categories,
        }
    }
}

/// Count each label of `key` across `posts`.
///
/// A post contributes once per listed value; posts without the field
/// contribute nothing. Empty labels are skipped.
pub fn select_items(key: SelectKey, posts: &[Post]) -> ItemCounts {
    let mut counts = ItemCounts::new();
    for label in posts.iter().flat_map(|p| key.values(p)) {
        if label.is_empty() {
            continue;
        }
        *counts.entry(label.clone()).or_insert(0) += 1;
    }
    counts
}

/// Highest count first; ties keep first-occurrence order.
pub fn ranked(counts: &ItemCounts, limit: Option<usize>) -> Vec<(String, usize)> {
    let mut items: Vec<(String, usize)> =
        counts.iter().map(|(label, n)| (label.clone(), *n)).collect();
    items.sort_by(|a, b| b.1.cmp(&a.1));
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}

/// Category counts for the category bar, led by an `all_label` entry that
/// counts every post.
///
/// A real category named like `all_label` is folded into that first entry.
pub fn category_counts(posts: &[Post], all_label: &str) -> ItemCounts {
    let mut counts = ItemCounts::new();
    counts.insert(all_label.to_string(), posts.len());
    for (label, n) in select_items(SelectKey::Categories, posts) {
        if label != all_label {
            counts.insert(label, n);
        }
    }
    counts
}

/// Posts whose title contains `query` (case-insensitive) and, when given,
/// whose categories include `category`. Input order is kept.
pub fn search_posts<'a>(posts: &'a [Post], query: &str, category: Option<&str>) -> Vec<&'a Post> {
    let needle = query.trim().to_lowercase();
    posts
        .iter()
        .filter(|p| needle.is_empty() || p.title.to_lowercase().contains(&needle))
        .filter(|p| match category {
            Some(c) => p.categories.iter().any(|pc| pc == c),
            None => true,
        })
        .collect()
}
