//! Shell icon lookups with extension-keyed caching
//!
//! Wraps an [`IconSource`] behind the cache-eligibility policy: extensions
//! outside the deny-list are fetched once and shared for the process
//! lifetime, everything else is fetched per file.

use std::path::Path;
use std::sync::Arc;

use crate::cache::{is_cacheable_extension, IconCache};
use crate::error::Result;
use crate::icon::{FolderKind, IconHandle, IconSize};
use crate::shell::IconSource;

/// Lowercase extension without the dot, empty when absent.
pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

pub struct IconProvider {
    source: Arc<dyn IconSource>,
    cache: Arc<IconCache>,
}

impl IconProvider {
    pub fn new(source: Arc<dyn IconSource>, cache: Arc<IconCache>) -> Self {
        Self { source, cache }
    }

    /// Direct, uncached file icon lookup.
    pub fn file_icon(
        &self,
        path: &Path,
        link_overlay: bool,
        size: IconSize,
    ) -> Result<Option<IconHandle>> {
        self.source.file_icon(path, link_overlay, size)
    }

    /// Direct folder icon lookup. Folder icons vary with the open/closed
    /// and overlay flags, so they bypass the extension cache entirely.
    pub fn folder_icon(
        &self,
        path: &Path,
        kind: FolderKind,
        link_overlay: bool,
        size: IconSize,
    ) -> Result<Option<IconHandle>> {
        self.source.folder_icon(path, kind, link_overlay, size)
    }

    /// File icon lookup through the extension cache when eligible.
    ///
    /// Deny-list extensions (per-instance icons) always hit the source
    /// directly. For everything else the first caller's result, absent
    /// included, is shared verbatim thereafter.
    pub fn file_icon_cached(
        &self,
        path: &Path,
        link_overlay: bool,
        size: IconSize,
    ) -> Result<Option<IconHandle>> {
        let extension = extension_of(path);
        if !is_cacheable_extension(&extension) {
            return self.source.file_icon(path, link_overlay, size);
        }

        self.cache.get_or_create(&extension, || {
            tracing::debug!(path = %path.display(), extension, "fetching icon for cache");
            self.source.file_icon(path, link_overlay, size)
        })
    }

    /// Icon for a path known to be stable for the process lifetime (the
    /// default browser executable). Cached under the full path, so the
    /// extension deny-list does not apply.
    pub fn stable_path_icon(&self, path: &Path, size: IconSize) -> Result<Option<IconHandle>> {
        let key = path.to_string_lossy().to_lowercase();
        self.cache
            .get_or_create(&key, || self.source.file_icon(path, false, size))
    }
}
