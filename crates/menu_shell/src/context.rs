//! The [`ShellContext`] implementation for Windows

use menu_core::{IconHandle, LinkTarget, Result, ShellContext};
use std::path::{Path, PathBuf};

use crate::{assoc, ini_file, link};

/// Windows shell collaborator bundle
#[derive(Debug, Default)]
pub struct WindowsShell;

impl WindowsShell {
    pub fn new() -> Self {
        Self
    }
}

impl ShellContext for WindowsShell {
    fn resolve_link(&self, path: &Path) -> Result<LinkTarget> {
        link::resolve_link(path)
    }

    fn read_ini_value(&self, path: &Path, key: &str, default: &str) -> String {
        ini_file::read_ini_value(path, key, default)
    }

    fn default_browser_path(&self) -> Option<PathBuf> {
        assoc::default_browser_path()
    }

    fn find_associated_executable(&self, path: &Path) -> Result<PathBuf> {
        assoc::find_associated_executable(path)
    }

    fn extract_all_icons(&self, executable: &Path) -> Result<Vec<IconHandle>> {
        assoc::extract_all_icons(executable)
    }

    fn associated_icon(&self, path: &Path) -> Result<Option<IconHandle>> {
        assoc::associated_icon(path)
    }
}
