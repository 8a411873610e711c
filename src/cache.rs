//! Render cache for incremental builds.
//!
//! A rebuild re-renders every page, but most pages come out byte-identical
//! to the previous run. Rewriting them anyway bumps their modification
//! times, so every deploy tool that syncs by mtime (rsync, object-storage
//! sync) re-uploads the whole site. This module lets the generate stage skip
//! the write when a page's bytes have not changed.
//!
//! # Design
//!
//! The cache is keyed by output path (relative to the output directory) and
//! stores the SHA-256 of the bytes last written there. A page is unchanged
//! when:
//! 1. an entry for its path exists with the same hash, and
//! 2. the file is still on disk.
//!
//! Hashing the rendered bytes rather than the inputs means any change that
//! affects the output (post metadata, record map, config, stylesheet,
//! templates) is picked up without tracking those inputs separately.
//!
//! ## Storage
//!
//! The manifest is a JSON file at `<output_dir>/.render-cache.json`, so it
//! travels with the output directory when that is cached in CI.
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to `build` to rewrite every page. This starts from an
//! empty manifest.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::Path;

/// Name of the cache manifest file within the output directory.
pub const MANIFEST_FILENAME: &str = ".render-cache.json";

/// Version of the cache manifest format. Bump this to invalidate all
/// existing caches when the format or key computation changes.
const MANIFEST_VERSION: u32 = 1;

/// On-disk cache manifest mapping output paths to content hashes.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RenderCache {
    pub version: u32,
    pub entries: BTreeMap<String, String>,
}

impl RenderCache {
    /// Create an empty manifest (used for `--no-cache` or first build).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Load from the output directory. Returns an empty manifest if the
    /// file doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(output_dir: &Path) -> Self {
        let path = output_dir.join(MANIFEST_FILENAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(m) if m.version == MANIFEST_VERSION => m,
            Ok(_) | Err(_) => {
                tracing::debug!(path = %path.display(), "discarding unusable render cache");
                Self::empty()
            }
        }
    }

    /// Save to the output directory.
    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let path = output_dir.join(MANIFEST_FILENAME);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// True when `rel_path` was last written with exactly this hash and the
    /// file is still present.
    pub fn is_unchanged(&self, rel_path: &str, hash: &str, output_dir: &Path) -> bool {
        self.entries.get(rel_path).is_some_and(|h| h == hash)
            && output_dir.join(rel_path).exists()
    }

    pub fn insert(&mut self, rel_path: String, hash: String) {
        self.entries.insert(rel_path, hash);
    }

    /// Drop entries for pages that were not produced by this build.
    pub fn retain_paths<'a>(&mut self, keep: impl IntoIterator<Item = &'a str>) {
        let keep: std::collections::HashSet<&str> = keep.into_iter().collect();
        self.entries.retain(|path, _| keep.contains(path.as_str()));
    }
}

/// SHA-256 of some bytes, as a hex string.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Summary of cache behavior for a build run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub written: u32,
    pub unchanged: u32,
}

impl CacheStats {
    pub fn write(&mut self) {
        self.written += 1;
    }

    pub fn skip(&mut self) {
        self.unchanged += 1;
    }

    pub fn total(&self) -> u32 {
        self.written + self.unchanged
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unchanged > 0 {
            write!(
                f,
                "{} unchanged, {} written ({} total)",
                self.unchanged,
                self.written,
                self.total()
            )
        } else {
            write!(f, "{} written", self.written)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_manifest_has_no_entries() {
        let m = RenderCache::empty();
        assert_eq!(m.version, MANIFEST_VERSION);
        assert!(m.entries.is_empty());
    }

    #[test]
    fn unchanged_requires_matching_hash_and_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("index.html"), "x").unwrap();

        let mut m = RenderCache::empty();
        m.insert("index.html".into(), "abc".into());
        m.insert("gone.html".into(), "def".into());

        assert!(m.is_unchanged("index.html", "abc", tmp.path()));
        assert!(!m.is_unchanged("index.html", "other", tmp.path()));
        assert!(!m.is_unchanged("gone.html", "def", tmp.path()));
        assert!(!m.is_unchanged("never.html", "abc", tmp.path()));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let mut m = RenderCache::empty();
        m.insert("blog/index.html".into(), hash_bytes(b"page"));
        m.save(tmp.path()).unwrap();

        let loaded = RenderCache::load(tmp.path());
        assert_eq!(loaded.entries, m.entries);
    }

    #[test]
    fn load_missing_or_corrupt_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(RenderCache::load(tmp.path()).entries.is_empty());

        std::fs::write(tmp.path().join(MANIFEST_FILENAME), "not json").unwrap();
        assert!(RenderCache::load(tmp.path()).entries.is_empty());
    }

    #[test]
    fn load_wrong_version_is_empty() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(MANIFEST_FILENAME),
            r#"{ "version": 999, "entries": { "index.html": "abc" } }"#,
        )
        .unwrap();
        assert!(RenderCache::load(tmp.path()).entries.is_empty());
    }

    #[test]
    fn retain_drops_stale_paths() {
        let mut m = RenderCache::empty();
        m.insert("a.html".into(), "1".into());
        m.insert("b.html".into(), "2".into());
        m.retain_paths(["a.html"]);
        assert_eq!(m.entries.len(), 1);
        assert!(m.entries.contains_key("a.html"));
    }

    #[test]
    fn hash_is_deterministic_and_content_sensitive() {
        assert_eq!(hash_bytes(b"same"), hash_bytes(b"same"));
        assert_ne!(hash_bytes(b"same"), hash_bytes(b"different"));
        assert_eq!(hash_bytes(b"").len(), 64);
    }

    #[test]
    fn stats_display() {
        let mut s = CacheStats::default();
        s.write();
        assert_eq!(s.to_string(), "1 written");
        s.skip();
        s.skip();
        assert_eq!(s.to_string(), "2 unchanged, 1 written (3 total)");
    }
}
