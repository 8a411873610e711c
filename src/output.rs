//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Every post is shown by its position and title first, with the slug and
//! other metadata as indented context lines. The output reads as a content
//! inventory while still letting users find the slug to pass to `show`.
//!
//! # Output Format
//!
//! ## List
//!
//! ```text
//! 001 Hello World
//!     Slug: hello-world
//!     Date: 2024-03-02
//!     Categories: Notes
//!     Tags: AI, Rust
//!
//! 2 posts
//! ```
//!
//! ## Counts
//!
//! ```text
//! Tags
//! 001 AI (3)
//! 002 Rust (1)
//! ```
//!
//! ## Build
//!
//! ```text
//! Home → index.html
//! Blog → blog/index.html (2 posts)
//! 001 Hello World → hello-world/index.html
//! 002 Link Only → link-only/index.html (unlisted)
//!
//! Generated 2 post pages, copied 1 asset
//! Pages: 3 unchanged, 4 written (7 total)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::generate::GenerateResult;
use crate::pipeline::CheckReport;
use crate::types::{Post, PostDetail};

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Title for display; untitled posts show their slug in parens.
fn display_title(post: &Post) -> String {
    if post.title.trim().is_empty() {
        format!("({})", post.slug)
    } else {
        post.title.clone()
    }
}

/// "1 post", "2 posts".
fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Context lines shared by `list` and `show`.
fn post_context(post: &Post, depth: usize) -> Vec<String> {
    let pad = indent(depth);
    let mut lines = vec![format!("{pad}Slug: {}", post.slug)];
    let date = post.display_date();
    if !date.is_empty() {
        lines.push(format!("{pad}Date: {date}"));
    }
    if !post.categories.is_empty() {
        lines.push(format!("{pad}Categories: {}", post.categories.join(", ")));
    }
    if !post.tags.is_empty() {
        lines.push(format!("{pad}Tags: {}", post.tags.join(", ")));
    }
    lines
}

// ============================================================================
// Commands
// ============================================================================

pub fn format_post_list(posts: &[&Post]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, post) in posts.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), display_title(post)));
        lines.extend(post_context(post, 1));
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(plural(posts.len(), "post"));
    lines
}

pub fn print_post_list(posts: &[&Post]) {
    for line in format_post_list(posts) {
        println!("{}", line);
    }
}

pub fn format_post_detail(detail: &PostDetail) -> Vec<String> {
    let post = &detail.post;
    let mut lines = vec![display_title(post)];
    lines.extend(post_context(post, 1));
    lines.push(format!("{}Id: {}", indent(1), post.id));
    let status: Vec<&str> = post.status.iter().map(|s| s.as_str()).collect();
    lines.push(format!("{}Status: {}", indent(1), status.join(", ")));
    let kind: Vec<&str> = post.kind.iter().map(|k| k.as_str()).collect();
    lines.push(format!("{}Type: {}", indent(1), kind.join(", ")));
    if let Some(excerpt) = post.excerpt() {
        lines.push(format!("{}Excerpt: {}", indent(1), truncate(excerpt, 80)));
    }
    lines.push(format!(
        "{}Body: {} bytes",
        indent(1),
        detail.record_map.to_json().len()
    ));
    lines
}

pub fn print_post_detail(detail: &PostDetail) {
    for line in format_post_detail(detail) {
        println!("{}", line);
    }
}

/// Ranked label counts under a heading.
pub fn format_counts(heading: &str, counts: &[(String, usize)]) -> Vec<String> {
    let mut lines = vec![heading.to_string()];
    if counts.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, (label, count)) in counts.iter().enumerate() {
        lines.push(format!("{} {} ({})", format_index(i + 1), label, count));
    }
    lines
}

pub fn print_counts(heading: &str, counts: &[(String, usize)]) {
    for line in format_counts(heading, counts) {
        println!("{}", line);
    }
}

pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{} entries, {} listed, {} with pages",
        report.entries, report.listed, report.reachable
    )];

    if !report.duplicates.is_empty() {
        lines.push(String::new());
        lines.push("Duplicate slugs".to_string());
        for dup in &report.duplicates {
            lines.push(format!("{}{} (ids: {})", indent(1), dup.slug, dup.ids.join(", ")));
        }
    }
    if !report.untitled.is_empty() {
        lines.push(String::new());
        lines.push("Untitled".to_string());
        lines.extend(report.untitled.iter().map(|s| format!("{}{s}", indent(1))));
    }
    if !report.undated.is_empty() {
        lines.push(String::new());
        lines.push("Undated".to_string());
        lines.extend(report.undated.iter().map(|s| format!("{}{s}", indent(1))));
    }
    lines
}

pub fn print_check_output(report: &CheckReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}

/// Information-first: each page leads with its title, followed by `→` and
/// the output path.
pub fn format_generate_output(result: &GenerateResult) -> Vec<String> {
    let mut lines = vec![
        "Home \u{2192} index.html".to_string(),
        format!(
            "Blog \u{2192} blog/index.html ({})",
            plural(result.listed.len(), "post")
        ),
    ];

    for (i, page) in result.details.iter().enumerate() {
        let title = if page.title.trim().is_empty() {
            format!("({})", page.slug)
        } else {
            page.title.clone()
        };
        let mut line = format!("{} {} \u{2192} {}", format_index(i + 1), title, page.path);
        if !page.listed {
            line.push_str(" (unlisted)");
        }
        lines.push(line);
    }

    if !result.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for (slug, reason) in &result.skipped {
            lines.push(format!("{}{}: {}", indent(1), slug, reason));
        }
    }

    if !result.skipped_assets.is_empty() {
        lines.push(String::new());
        lines.push("Skipped assets".to_string());
        for path in &result.skipped_assets {
            lines.push(format!("{}{}: generated file at this path", indent(1), path));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {}, copied {}",
        plural(result.details.len(), "post page"),
        plural(result.assets, "asset")
    ));
    lines.push(format!("Pages: {}", result.cache_stats));
    lines
}

pub fn print_generate_output(result: &GenerateResult) {
    for line in format_generate_output(result) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
