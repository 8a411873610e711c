//! HTML site generation.
//!
//! Renders the static site from one [`Pipeline`] invocation.
//!
//! ## Generated Pages
//!
//! - **Landing page** (`/index.html`): profile, bio, most recent posts
//! - **Blog index** (`/blog/index.html`): every listed post, category bar, top tags
//! - **Post pages** (`/{slug}/index.html`): metadata plus the embedded record map
//! - **Record maps** (`/{slug}/record-map.json`): the same body as a standalone file
//! - **Not found** (`/404.html`)
//!
//! Files under `content/assets/` are copied to the output root unchanged.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── 404.html
//! ├── blog/
//! │   └── index.html
//! ├── hello-world/
//! │   ├── index.html
//! │   └── record-map.json
//! ├── favicon.ico              # from content/assets/
//! └── .render-cache.json
//! ```
//!
//! ## Post Bodies
//!
//! The record map is never interpreted here. Post pages embed it as
//! `<script type="application/json" id="record-map">` next to an empty
//! `#notion-root` element for a client-side renderer to fill.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping. The profile
//! bio is markdown, rendered with pulldown-cmark.

use crate::aggregate::{self, SelectKey};
use crate::cache::{self, CacheStats, RenderCache};
use crate::config::{self, SiteConfig};
use crate::pipeline::{Pipeline, PipelineError};
use crate::source::ContentSource;
use crate::types::{Post, PostDetail};
use chrono::Datelike;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Asset copy error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Directory under the content root copied verbatim to the output root.
pub const ASSETS_DIR: &str = "assets";

/// Top-level output names a post slug may not take.
const RESERVED_SLUGS: &[&str] = &[
    "blog",
    "assets",
    "404.html",
    "index.html",
    cache::MANIFEST_FILENAME,
];

const CSS_STATIC: &str = include_str!("../static/style.css");

/// What a build produced, for CLI output.
#[derive(Debug, Default)]
pub struct GenerateResult {
    /// Posts on the blog index, in display order.
    pub listed: Vec<Post>,
    /// Post pages written (or confirmed unchanged).
    pub details: Vec<GeneratedPost>,
    /// Slugs that could not get a page, with the reason.
    pub skipped: Vec<(String, String)>,
    /// Number of asset files copied.
    pub assets: usize,
    /// Asset paths not copied because a generated file owns that path.
    pub skipped_assets: Vec<String>,
    pub cache_stats: CacheStats,
}

#[derive(Debug, Clone)]
pub struct GeneratedPost {
    pub slug: String,
    pub title: String,
    /// Output path relative to the output directory.
    pub path: String,
    /// Whether the post also appears in listings.
    pub listed: bool,
}

/// Writes pages through the render cache.
struct PageWriter<'a> {
    output_dir: &'a Path,
    cache: RenderCache,
    stats: CacheStats,
    paths: Vec<String>,
}

impl PageWriter<'_> {
    fn write(&mut self, rel_path: &str, bytes: &[u8]) -> std::io::Result<()> {
        let hash = cache::hash_bytes(bytes);
        if self.cache.is_unchanged(rel_path, &hash, self.output_dir) {
            self.stats.skip();
        } else {
            let path = self.output_dir.join(rel_path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, bytes)?;
            self.stats.write();
            tracing::info!(path = rel_path, "wrote page");
        }
        self.cache.insert(rel_path.to_string(), hash);
        self.paths.push(rel_path.to_string());
        Ok(())
    }
}

pub fn generate<S: ContentSource>(
    pipeline: &mut Pipeline<S>,
    config: &SiteConfig,
    content_dir: &Path,
    output_dir: &Path,
    use_cache: bool,
) -> Result<GenerateResult, GenerateError> {
    let css = format!("{}\n\n{}", config::generate_color_css(&config.colors), CSS_STATIC);

    fs::create_dir_all(output_dir)?;
    let mut writer = PageWriter {
        output_dir,
        cache: if use_cache {
            RenderCache::load(output_dir)
        } else {
            RenderCache::empty()
        },
        stats: CacheStats::default(),
        paths: Vec::new(),
    };
    let mut result = GenerateResult::default();

    let assets_dir = content_dir.join(ASSETS_DIR);
    let asset_names = top_level_assets(&assets_dir)?;
    let posts = pipeline.list_posts()?;

    for slug in pipeline.detail_slugs()? {
        if let Some(reason) = unusable_slug(&slug, &asset_names) {
            tracing::warn!(slug = %slug, reason, "skipping post page");
            result.skipped.push((slug, reason.to_string()));
            continue;
        }
        let detail = match pipeline.build_detail(&slug) {
            Ok(detail) => detail,
            Err(e) if e.is_not_found() => {
                result.skipped.push((slug, e.to_string()));
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let page_path = format!("{slug}/index.html");
        let page = render_post(config, &detail, &css);
        writer.write(&page_path, page.into_string().as_bytes())?;
        writer.write(
            &format!("{slug}/record-map.json"),
            serde_json::to_string(&detail.record_map)?.as_bytes(),
        )?;
        result.details.push(GeneratedPost {
            listed: posts.iter().any(|p| p.slug == slug),
            title: detail.post.title,
            slug,
            path: page_path,
        });
    }

    // Cards only link to posts that got a page.
    let pages: HashSet<&str> = result.details.iter().map(|d| d.slug.as_str()).collect();
    let recent = &posts[..posts.len().min(config.listing.recent_posts)];
    let home = render_home(config, recent, &pages, &css);
    writer.write("index.html", home.into_string().as_bytes())?;
    let blog = render_blog(config, &posts, &pages, &css);
    writer.write("blog/index.html", blog.into_string().as_bytes())?;
    writer.write("404.html", render_not_found(config, &css).into_string().as_bytes())?;

    let (copied, skipped_assets) = copy_assets(&assets_dir, output_dir, &writer.paths)?;
    result.assets = copied;
    result.skipped_assets = skipped_assets;

    let PageWriter {
        mut cache,
        stats,
        paths,
        ..
    } = writer;
    cache.retain_paths(paths.iter().map(String::as_str));
    cache.save(output_dir)?;

    result.listed = posts;
    result.cache_stats = stats;
    Ok(result)
}

/// Files directly under `assets_dir`. A post slug must not take one of their
/// names; asset directories merge with post directories instead.
fn top_level_assets(assets_dir: &Path) -> Result<HashSet<String>, GenerateError> {
    if !assets_dir.is_dir() {
        return Ok(HashSet::new());
    }
    let mut names = HashSet::new();
    for entry in WalkDir::new(assets_dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

/// Why `slug` cannot be used as an output directory, if it can't.
fn unusable_slug(slug: &str, asset_names: &HashSet<String>) -> Option<&'static str> {
    if slug.trim().is_empty() {
        Some("empty slug")
    } else if slug.contains(['/', '\\']) || slug == "." || slug == ".." {
        Some("slug is not a single path segment")
    } else if RESERVED_SLUGS.contains(&slug) {
        Some("slug collides with a generated page")
    } else if asset_names.contains(slug) {
        Some("slug collides with an asset")
    } else {
        None
    }
}

/// Copy `assets_dir` into `output_dir`, keeping relative paths.
///
/// Generated files (`generated`, relative to `output_dir`) and the render
/// cache manifest win over assets: an asset at one of those paths, or a file
/// where a generated directory lives, is skipped with a warning. Returns the
/// number of files copied and the skipped asset paths. A missing directory
/// copies nothing.
fn copy_assets(
    assets_dir: &Path,
    output_dir: &Path,
    generated: &[String],
) -> Result<(usize, Vec<String>), GenerateError> {
    if !assets_dir.is_dir() {
        return Ok((0, Vec::new()));
    }

    let mut owned_files: HashSet<&str> = generated.iter().map(String::as_str).collect();
    owned_files.insert(cache::MANIFEST_FILENAME);
    let mut owned_dirs: HashSet<String> = HashSet::new();
    for path in &owned_files {
        let mut dir = Path::new(path).parent();
        while let Some(d) = dir.filter(|d| !d.as_os_str().is_empty()) {
            owned_dirs.insert(slash_path(d));
            dir = d.parent();
        }
    }

    let mut copied = 0;
    let mut skipped = Vec::new();
    let mut walker = WalkDir::new(assets_dir).min_depth(1).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry?;
        let rel: PathBuf = match entry.path().strip_prefix(assets_dir) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };
        let rel_str = slash_path(&rel);
        let is_dir = entry.file_type().is_dir();
        let collides = owned_files.contains(rel_str.as_str())
            || (!is_dir && owned_dirs.contains(&rel_str));
        if collides {
            tracing::warn!(asset = %rel_str, "asset collides with a generated file; skipping");
            skipped.push(rel_str);
            if is_dir {
                walker.skip_current_dir();
            }
            continue;
        }

        let dst = output_dir.join(&rel);
        if is_dir {
            fs::create_dir_all(&dst)?;
        } else {
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &dst)?;
            copied += 1;
        }
    }
    Ok((copied, skipped))
}

/// `/`-separated form of a relative path, matching generated page paths.
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// HTML Components
// ============================================================================

/// Which top-level section a page belongs to, for nav highlighting.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Home,
    Blog,
    None,
}

/// Renders the base HTML document structure
fn base_document(
    config: &SiteConfig,
    title: &str,
    canonical: Option<&str>,
    css: &str,
    content: Markup,
) -> Markup {
    let page_title = if title == config.site.title {
        title.to_string()
    } else {
        format!("{} · {}", title, config.site.title)
    };
    html! {
        (DOCTYPE)
        html lang=(config.site.lang) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (page_title) }
                @if !config.site.description.is_empty() {
                    meta name="description" content=(config.site.description);
                }
                @if let Some(url) = canonical {
                    link rel="canonical" href=(url);
                }
                style { (PreEscaped(css)) }
            }
            body {
                (content)
                (site_footer(config))
            }
        }
    }
}

/// Renders the site header with the site title and section links
fn site_header(config: &SiteConfig, current: Section) -> Markup {
    html! {
        header.site-header {
            a.site-title href="/" { (config.site.title) }
            nav.site-nav {
                a.current[current == Section::Home] href="/" { "Home" }
                a.current[current == Section::Blog] href="/blog/" { "Blog" }
            }
        }
    }
}

fn site_footer(config: &SiteConfig) -> Markup {
    let year = chrono::Utc::now().year();
    let years = match config.site.since {
        Some(since) if since < year => format!("{since}-{year}"),
        _ => year.to_string(),
    };
    let owner = if config.profile.name.is_empty() {
        &config.site.title
    } else {
        &config.profile.name
    };
    html! {
        footer.site-footer {
            "© " (years) " " (owner)
        }
    }
}

/// "March 2, 2024" when the date parses, the raw value otherwise.
fn format_post_date(post: &Post) -> Option<String> {
    match post.published_on() {
        Some(date) => Some(date.format("%B %-d, %Y").to_string()),
        None => Some(post.display_date().to_string()).filter(|d| !d.is_empty()),
    }
}

fn chips(items: &[String]) -> Markup {
    html! {
        @if !items.is_empty() {
            ul.chips {
                @for item in items {
                    li { (item) }
                }
            }
        }
    }
}

/// Renders one post as a card. The title links to the post page when it has one.
fn post_card(post: &Post, has_page: bool) -> Markup {
    html! {
        article.post-card data-categories=(post.categories.join(",")) {
            @if let Some(date) = format_post_date(post) {
                time.post-date datetime=(post.display_date()) { (date) }
            }
            h2 {
                @if has_page {
                    a href={ "/" (post.slug) "/" } { (post.title) }
                } @else {
                    (post.title)
                }
            }
            @if let Some(excerpt) = post.excerpt() {
                p.post-excerpt { (excerpt) }
            }
            (chips(&post.categories))
        }
    }
}

fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

/// JSON safe to place inside a `<script>` element.
fn script_safe_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders the landing page: profile and most recent posts
fn render_home(
    config: &SiteConfig,
    recent: &[Post],
    pages: &HashSet<&str>,
    css: &str,
) -> Markup {
    let profile = &config.profile;
    let content = html! {
        (site_header(config, Section::Home))
        main.home-page {
            section.profile {
                @if !profile.name.is_empty() {
                    h1 { (profile.name) }
                }
                @if !profile.role.is_empty() {
                    p.role { (profile.role) }
                }
                @if !profile.bio.is_empty() {
                    div.bio { (PreEscaped(render_markdown(&profile.bio))) }
                }
                ul.contact {
                    @if !profile.email.is_empty() {
                        li { a href={ "mailto:" (profile.email) } { "Email" } }
                    }
                    @if !profile.github.is_empty() {
                        li { a href={ "https://github.com/" (profile.github) } rel="noopener" { "GitHub" } }
                    }
                    @if !profile.linkedin.is_empty() {
                        li { a href={ "https://www.linkedin.com/in/" (profile.linkedin) } rel="noopener" { "LinkedIn" } }
                    }
                }
            }
            @if !recent.is_empty() {
                section.recent-posts {
                    h2 { "Recent posts" }
                    div.post-grid {
                        @for post in recent {
                            (post_card(post, pages.contains(post.slug.as_str())))
                        }
                    }
                    p { a href="/blog/" { "All posts →" } }
                }
            }
        }
    };
    base_document(config, &config.site.title, None, css, content)
}

/// Renders the blog index: category bar, top tags, every listed post
fn render_blog(
    config: &SiteConfig,
    posts: &[Post],
    pages: &HashSet<&str>,
    css: &str,
) -> Markup {
    let categories = aggregate::category_counts(posts, &config.listing.all_category_label);
    let tags = aggregate::ranked(
        &aggregate::select_items(SelectKey::Tags, posts),
        Some(config.listing.top_tags),
    );

    let content = html! {
        (site_header(config, Section::Blog))
        main.blog-page {
            header {
                h1 { (config.site.title) }
                @if !config.site.description.is_empty() {
                    p.blog-description { (config.site.description) }
                }
            }
            nav.categories aria-label="Categories" {
                ul.chips {
                    @for (label, count) in &categories {
                        li data-category=(label) { (label) span.count { (count) } }
                    }
                }
            }
            @if !tags.is_empty() {
                nav.tags aria-label="Tags" {
                    ul.chips {
                        @for (label, count) in &tags {
                            li data-tag=(label) { "#" (label) span.count { (count) } }
                        }
                    }
                }
            }
            @if posts.is_empty() {
                div.empty-state {
                    h3 { "No posts found" }
                }
            } @else {
                div.post-grid {
                    @for post in posts {
                        (post_card(post, pages.contains(post.slug.as_str())))
                    }
                }
            }
        }
    };
    base_document(config, "Blog", None, css, content)
}

/// Renders a post page with its embedded record map
fn render_post(config: &SiteConfig, detail: &PostDetail, css: &str) -> Markup {
    let post = &detail.post;
    let canonical = (!config.site.link.is_empty())
        .then(|| format!("{}/{}/", config.site.link.trim_end_matches('/'), post.slug));
    let body_json = script_safe_json(&detail.record_map.to_json());

    let content = html! {
        (site_header(config, Section::None))
        main.post-page {
            article {
                header.post-header {
                    @if let Some(date) = format_post_date(post) {
                        time.post-date datetime=(post.display_date()) { (date) }
                    }
                    h1 { (post.title) }
                    @if let Some(excerpt) = post.excerpt() {
                        p.post-excerpt { (excerpt) }
                    }
                    (chips(&post.categories))
                    @if !post.tags.is_empty() {
                        ul.chips.post-tags {
                            @for tag in &post.tags {
                                li { "#" (tag) }
                            }
                        }
                    }
                    @if let Some(thumbnail) = &post.thumbnail {
                        img.thumbnail src=(thumbnail) alt=(post.title);
                    }
                }
                div id="notion-root" data-record-map="record-map.json" {}
                script type="application/json" id="record-map" { (PreEscaped(body_json)) }
            }
        }
    };
    base_document(config, &post.title, canonical.as_deref(), css, content)
}

/// Renders the not-found page
fn render_not_found(config: &SiteConfig, css: &str) -> Markup {
    let content = html! {
        (site_header(config, Section::None))
        main.not-found {
            div.empty-state {
                h1 { "Page not found" }
                p { a href="/blog/" { "Back to all posts" } }
            }
        }
    };
    base_document(config, "Not found", None, css, content)
}

// ============================================================================
// Tests
// ============================================================================
