//! Collaborator capabilities supplied by the host shell layer
//!
//! The resolver only ever talks to the OS through these traits. The Windows
//! implementations live in `menu_shell`; tests supply in-memory fakes.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::icon::{FolderKind, IconHandle, IconSize};

/// Fields read out of a resolved shell link
#[derive(Debug, Clone, Default)]
pub struct LinkTarget {
    /// Resolved target path; empty when the link points nowhere (expected
    /// for some system shortcuts).
    pub target_path: String,
    /// Declared icon-location field, including any trailing `,index`
    /// suffix.
    pub icon_location: String,
    pub arguments: String,
    pub working_directory: String,
}

/// Path- and association-level shell lookups
pub trait ShellContext: Send + Sync {
    /// Resolve a shortcut file to its target and declared fields.
    fn resolve_link(&self, path: &Path) -> Result<LinkTarget>;

    fn is_directory(&self, path: &str) -> bool {
        Path::new(path).is_dir()
    }

    /// A bare `\\server` share root with no path below it. Recognized as a
    /// container category with no dedicated icon fetch.
    fn is_network_root(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix("\\\\") else {
            return false;
        };
        !rest.is_empty() && !rest.trim_end_matches('\\').contains('\\')
    }

    /// Read one key from an INI-format file (internet shortcut blocks),
    /// returning `default` when the file or key is absent.
    fn read_ini_value(&self, path: &Path, key: &str, default: &str) -> String;

    /// Executable registered for the system default browser, if any.
    fn default_browser_path(&self) -> Option<PathBuf>;

    /// The executable associated with a document path.
    fn find_associated_executable(&self, path: &Path) -> Result<PathBuf>;

    /// All icons embedded in an executable, in extraction order.
    fn extract_all_icons(&self, executable: &Path) -> Result<Vec<IconHandle>>;

    /// The icon associated with a concrete file (icon-location targets).
    fn associated_icon(&self, path: &Path) -> Result<Option<IconHandle>>;
}

/// Raw shell icon queries, by path and size class
pub trait IconSource: Send + Sync {
    /// Representative icon for a file path. With `link_overlay` the OS
    /// bakes the shortcut arrow in; the result is already caller-owned
    /// pixels, never a live OS handle.
    fn file_icon(&self, path: &Path, link_overlay: bool, size: IconSize)
        -> Result<Option<IconHandle>>;

    fn folder_icon(
        &self,
        path: &Path,
        kind: FolderKind,
        link_overlay: bool,
        size: IconSize,
    ) -> Result<Option<IconHandle>>;
}
