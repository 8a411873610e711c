//! # Inkfolio
//!
//! A static site generator for a personal blog whose content lives in an
//! external document database. An exporter (run on its own schedule) drops a
//! snapshot of that database on disk; inkfolio decides which entries are
//! visible, builds listings and detail pages from them, and writes a plain
//! HTML site.
//!
//! # Architecture: One Invocation, One Snapshot
//!
//! ```text
//! content/posts.json ──► fetch_all_entries ──► filter (list policy) ──► sort ──► index pages
//!                                         └──► select_by_slug (detail policy) ──► fetch_body ──► post page
//! ```
//!
//! Every command creates one [`pipeline::Pipeline`], which fetches the entry
//! list at most once and shares it across all listings and detail pages of
//! that run. Nothing is cached between runs: the next build sees whatever the
//! exporter wrote last.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Post metadata, status and type labels, the opaque record map |
//! | [`source`] | The [`source::ContentSource`] boundary and the on-disk snapshot adapter |
//! | [`filter`] | Visibility policies, filtering, slug lookup, date ordering |
//! | [`aggregate`] | Tag and category counts, title/category search |
//! | [`pipeline`] | Per-invocation entry cache tying source, filter and bodies together |
//! | [`config`] | `config.toml` loading over stock defaults, validation, CSS generation |
//! | [`generate`] | Renders the HTML site using Maud |
//! | [`cache`] | Skips rewriting pages whose bytes did not change |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Visibility Is Data, Not Code
//!
//! What appears in listings and what is reachable by URL are two
//! [`filter::FilterPolicy`] values, both overridable from `config.toml`. The
//! stock detail policy admits `PublicOnDetail` posts so a post can be shared
//! by link without showing up on the blog index. A body is only ever fetched
//! for a post the detail policy admits.
//!
//! ## Opaque Bodies
//!
//! Post bodies are the database's own block graph. Inkfolio never interprets
//! them: post pages embed the JSON for a client-side renderer, and write it
//! next to the page as `record-map.json`.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), so templates are
//! checked at compile time and every interpolation is escaped.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod filter;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
