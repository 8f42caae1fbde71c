//! Per-entry icon resolution
//!
//! One entry at a time: classify the path, run the category's resolution
//! algorithm against the shell collaborators, and produce the final icon
//! plus resolved target path and display text. Entries are independent, so
//! the caller may resolve many in parallel; [`EntryResolver::resolve_batch`]
//! does exactly that with rayon.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::IconCache;
use crate::error::{IconError, Result};
use crate::icon::{FolderKind, IconHandle, IconSize};
use crate::provider::{extension_of, IconProvider};
use crate::shell::{IconSource, ShellContext};

/// One filesystem entry after resolution
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    /// The path handed to the resolver.
    pub source_path: String,
    /// Final target after following link indirection; equals `source_path`
    /// for anything that is not a resolved shortcut.
    pub target_path: String,
    pub display_text: String,
    /// Entry expands into a sub-listing instead of being launched.
    pub is_container: bool,
    pub is_resolved_link: bool,
    pub is_hidden: bool,
    /// Launch fields carried over from a resolved shortcut.
    pub arguments: String,
    pub working_directory: String,
    /// Absent when no icon could be derived; presentation substitutes a
    /// transparent placeholder.
    pub icon: Option<IconHandle>,
    /// Assigned by the presentation adapter.
    pub row_index: Option<usize>,
}

impl ResolvedEntry {
    pub(crate) fn new(path: &Path, is_hidden: bool) -> Self {
        let source_path = path.display().to_string();
        let display_text = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source_path.clone());
        Self {
            target_path: source_path.clone(),
            source_path,
            display_text,
            is_container: false,
            is_resolved_link: false,
            is_hidden,
            arguments: String::new(),
            working_directory: String::new(),
            icon: None,
            row_index: None,
        }
    }
}

/// Entry category, classified once per entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    Link,
    InternetLink,
    ProjectFile,
    Plain,
}

fn classify(extension: &str, is_directory: bool) -> EntryKind {
    if is_directory {
        return EntryKind::Directory;
    }
    match extension {
        "lnk" => EntryKind::Link,
        "url" => EntryKind::InternetLink,
        "sln" => EntryKind::ProjectFile,
        _ => EntryKind::Plain,
    }
}

/// Drop a trailing `,index` suffix from a shortcut icon-location field.
fn strip_icon_index(icon_location: &str) -> &str {
    match icon_location.rsplit_once(',') {
        Some((path, index)) if index.trim().parse::<i32>().is_ok() => path,
        _ => icon_location,
    }
}

pub struct EntryResolver {
    provider: IconProvider,
    shell: Arc<dyn ShellContext>,
    size: IconSize,
}

impl EntryResolver {
    pub fn new(source: Arc<dyn IconSource>, shell: Arc<dyn ShellContext>) -> Self {
        Self::with_size(source, shell, IconSize::Small)
    }

    pub fn with_size(
        source: Arc<dyn IconSource>,
        shell: Arc<dyn ShellContext>,
        size: IconSize,
    ) -> Self {
        Self {
            provider: IconProvider::new(source, Arc::new(IconCache::new())),
            shell,
            size,
        }
    }

    pub fn with_config(
        source: Arc<dyn IconSource>,
        shell: Arc<dyn ShellContext>,
        config: &crate::config::MenuConfig,
    ) -> Self {
        let cache = IconCache::with_negative_caching(config.cache_missing_icons);
        Self {
            provider: IconProvider::new(source, Arc::new(cache)),
            shell,
            size: config.icon_size,
        }
    }

    /// Resolve one entry to its icon and metadata.
    ///
    /// Recoverable extraction failures are logged and leave the entry
    /// without an icon; anything outside the recognized set propagates.
    pub fn resolve(&self, path: &Path, is_hidden: bool) -> Result<ResolvedEntry> {
        let mut entry = ResolvedEntry::new(path, is_hidden);
        if entry.target_path.is_empty() {
            tracing::info!("empty entry path, nothing to resolve");
            return Ok(entry);
        }

        let kind = classify(&extension_of(path), self.shell.is_directory(&entry.target_path));
        match kind {
            EntryKind::Directory => {
                entry.is_container = true;
                entry.icon =
                    self.provider
                        .folder_icon(path, FolderKind::Closed, false, self.size)?;
            }
            EntryKind::Link => {
                if !self.resolve_link(&mut entry)? {
                    self.resolve_plain(&mut entry)?;
                }
            }
            EntryKind::InternetLink => self.resolve_internet_link(&mut entry)?,
            EntryKind::ProjectFile => self.resolve_project(&mut entry)?,
            EntryKind::Plain => self.resolve_plain(&mut entry)?,
        }

        Ok(entry)
    }

    /// Resolve entries in parallel. Results are per-entry and independent.
    pub fn resolve_batch(&self, entries: &[(PathBuf, bool)]) -> Vec<Result<ResolvedEntry>> {
        entries
            .par_iter()
            .map(|(path, is_hidden)| self.resolve(path, *is_hidden))
            .collect()
    }

    /// Shortcut (.lnk) resolution. Returns `true` when the branch produced
    /// a terminal outcome; `false` falls through to the plain-file lookup
    /// on the resolved target.
    fn resolve_link(&self, entry: &mut ResolvedEntry) -> Result<bool> {
        let mut handled = false;
        let source = PathBuf::from(&entry.target_path);
        let link = match self.shell.resolve_link(&source) {
            Ok(link) => link,
            Err(e) if e.is_recoverable() => {
                // A corrupt or unreadable shortcut still gets its row,
                // just without an icon.
                tracing::warn!(link = %entry.target_path, error = %e, "shortcut resolution failed");
                entry.display_text = Path::new(&entry.source_path)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                return Ok(true);
            }
            Err(e) => return Err(e),
        };
        let resolved = link.target_path;

        if self.shell.is_directory(&resolved) {
            entry.icon =
                self.provider
                    .folder_icon(&source, FolderKind::Open, true, self.size)?;
            entry.is_container = true;
            entry.is_resolved_link = true;
            entry.target_path = resolved;
            handled = true;
        } else if self.shell.is_network_root(&resolved) {
            // Recognized category with no dedicated icon fetch.
            entry.is_container = true;
            entry.is_resolved_link = true;
            entry.target_path = resolved;
            handled = true;
        } else if resolved.is_empty() {
            // Expected for some system shortcuts, not an error.
            tracing::info!(link = %entry.target_path, "link target is empty, no icon");
            handled = true;
        } else {
            let icon_location = strip_icon_index(&link.icon_location);
            if !icon_location.is_empty() && Path::new(icon_location).exists() {
                // Icon-location is instance-specific, never cached.
                match self.shell.associated_icon(Path::new(icon_location)) {
                    Ok(Some(icon)) => {
                        entry.icon = Some(icon);
                        handled = true;
                    }
                    Ok(None) => {}
                    Err(e) if e.is_recoverable() => {
                        tracing::warn!(icon_location, error = %e, "icon location unusable");
                    }
                    Err(e) => return Err(e),
                }
            }
            entry.arguments = link.arguments;
            entry.working_directory = link.working_directory;
            entry.target_path = resolved;
            entry.is_resolved_link = true;
        }

        entry.display_text = Path::new(&entry.source_path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(handled)
    }

    /// Internet shortcut (.url) resolution. Always terminal.
    fn resolve_internet_link(&self, entry: &mut ResolvedEntry) -> Result<()> {
        let path = PathBuf::from(&entry.target_path);
        let icon_file = self.shell.read_ini_value(&path, "IconFile", "");

        let outcome: Result<()> = (|| {
            if icon_file.is_empty() {
                match self.shell.default_browser_path() {
                    Some(browser) => {
                        entry.icon = self.provider.stable_path_icon(&browser, self.size)?;
                    }
                    None => {
                        tracing::info!(url = %entry.target_path, "no default browser, no icon");
                    }
                }
            } else if Path::new(&icon_file).exists() {
                entry.icon = self.shell.associated_icon(Path::new(&icon_file))?;
            } else {
                tracing::info!(url = %entry.target_path, icon_file, "icon file missing, no icon");
            }
            Ok(())
        })();

        match outcome {
            Ok(()) => {}
            Err(e) if e.is_recoverable() => {
                tracing::warn!(url = %entry.target_path, icon_file, error = %e, "url icon extraction failed");
            }
            Err(e) => return Err(e),
        }

        // Display text is the name minus the 4-character extension.
        let name = Path::new(&entry.source_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        entry.display_text = name
            .char_indices()
            .nth_back(3)
            .map(|(i, _)| name[..i].to_string())
            .unwrap_or(name);

        Ok(())
    }

    /// Project file (.sln) resolution via the associated executable.
    /// Always terminal; the association result is never cached since the
    /// executable varies with the installed toolchain.
    fn resolve_project(&self, entry: &mut ResolvedEntry) -> Result<()> {
        let outcome: Result<()> = (|| {
            let executable = self
                .shell
                .find_associated_executable(Path::new(&entry.target_path))?;
            let icons = self.shell.extract_all_icons(&executable)?;
            // Last extracted icon wins. Inherited heuristic with no stated
            // rationale; the best icon is not guaranteed to be last.
            match icons.into_iter().last() {
                Some(icon) => entry.icon = Some(icon),
                None => {
                    tracing::info!(
                        path = %entry.target_path,
                        executable = %executable.display(),
                        "executable has no embedded icons"
                    );
                }
            }
            Ok(())
        })();

        match outcome {
            Ok(()) => Ok(()),
            Err(e) if e.is_recoverable() => {
                tracing::warn!(path = %entry.target_path, error = %e, "project icon extraction failed");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Everything else: cached-or-direct lookup keyed by extension.
    fn resolve_plain(&self, entry: &mut ResolvedEntry) -> Result<()> {
        let path = PathBuf::from(&entry.target_path);
        match self.provider.file_icon_cached(&path, false, self.size) {
            Ok(icon) => entry.icon = icon,
            Err(e) if e.is_recoverable() => {
                tracing::warn!(path = %entry.target_path, error = %e, "icon extraction failed");
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::LinkTarget;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records folder icon requests so tests can assert on the open/closed
    /// and overlay flags actually used.
    #[derive(Default)]
    struct FakeIcons {
        file_fetches: AtomicUsize,
        folder_requests: Mutex<Vec<(FolderKind, bool)>>,
        fail_file_with: Mutex<Option<fn() -> IconError>>,
    }

    impl IconSource for FakeIcons {
        fn file_icon(
            &self,
            _path: &Path,
            _link_overlay: bool,
            size: IconSize,
        ) -> Result<Option<IconHandle>> {
            self.file_fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(make) = *self.fail_file_with.lock() {
                return Err(make());
            }
            Ok(Some(IconHandle::placeholder(size)))
        }

        fn folder_icon(
            &self,
            _path: &Path,
            kind: FolderKind,
            link_overlay: bool,
            size: IconSize,
        ) -> Result<Option<IconHandle>> {
            self.folder_requests.lock().push((kind, link_overlay));
            Ok(Some(IconHandle::placeholder(size)))
        }
    }

    #[derive(Default)]
    struct FakeShell {
        directories: Vec<String>,
        links: HashMap<String, LinkTarget>,
        ini_values: HashMap<String, String>,
        browser: Option<PathBuf>,
        associated_executable: Option<PathBuf>,
        embedded_icons: Vec<IconHandle>,
        fail_link_with: Option<fn() -> IconError>,
    }

    impl ShellContext for FakeShell {
        fn resolve_link(&self, path: &Path) -> Result<LinkTarget> {
            if let Some(make) = self.fail_link_with {
                return Err(make());
            }
            Ok(self
                .links
                .get(&path.display().to_string())
                .cloned()
                .unwrap_or_default())
        }

        fn is_directory(&self, path: &str) -> bool {
            self.directories.iter().any(|d| d == path)
        }

        fn read_ini_value(&self, _path: &Path, key: &str, default: &str) -> String {
            self.ini_values
                .get(key)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        }

        fn default_browser_path(&self) -> Option<PathBuf> {
            self.browser.clone()
        }

        fn find_associated_executable(&self, _path: &Path) -> Result<PathBuf> {
            self.associated_executable
                .clone()
                .ok_or_else(|| IconError::InvalidArgument("no association".into()))
        }

        fn extract_all_icons(&self, _executable: &Path) -> Result<Vec<IconHandle>> {
            Ok(self.embedded_icons.clone())
        }

        fn associated_icon(&self, _path: &Path) -> Result<Option<IconHandle>> {
            Ok(Some(IconHandle::placeholder(IconSize::Small)))
        }
    }

    fn resolver(icons: FakeIcons, shell: FakeShell) -> EntryResolver {
        EntryResolver::new(Arc::new(icons), Arc::new(shell))
    }

    #[test]
    fn directory_uses_closed_folder_icon() {
        let icons = Arc::new(FakeIcons::default());
        let shell = FakeShell {
            directories: vec!["docs".into()],
            ..Default::default()
        };
        let resolver = EntryResolver::new(icons.clone(), Arc::new(shell));

        let entry = resolver.resolve(Path::new("docs"), false).unwrap();
        assert!(entry.is_container);
        assert!(entry.icon.is_some());
        assert_eq!(*icons.folder_requests.lock(), vec![(FolderKind::Closed, false)]);
    }

    #[test]
    fn link_to_directory_is_container_with_open_overlay_icon() {
        let icons = Arc::new(FakeIcons::default());
        let mut shell = FakeShell::default();
        shell.directories.push("C:\\Tools".into());
        shell.links.insert(
            "tools.lnk".into(),
            LinkTarget {
                target_path: "C:\\Tools".into(),
                ..Default::default()
            },
        );
        let resolver = EntryResolver::new(icons.clone(), Arc::new(shell));

        let entry = resolver.resolve(Path::new("tools.lnk"), false).unwrap();
        assert!(entry.is_container);
        assert!(entry.is_resolved_link);
        assert_eq!(entry.target_path, "C:\\Tools");
        assert_eq!(entry.display_text, "tools");
        assert_eq!(*icons.folder_requests.lock(), vec![(FolderKind::Open, true)]);
    }

    #[test]
    fn link_to_network_root_is_container_without_icon() {
        let mut shell = FakeShell::default();
        shell.links.insert(
            "share.lnk".into(),
            LinkTarget {
                target_path: "\\\\fileserver".into(),
                ..Default::default()
            },
        );
        let entry = resolver(FakeIcons::default(), shell)
            .resolve(Path::new("share.lnk"), false)
            .unwrap();
        assert!(entry.is_container);
        assert!(entry.icon.is_none());
    }

    #[test]
    fn link_with_empty_target_has_no_icon_and_no_error() {
        let mut shell = FakeShell::default();
        shell
            .links
            .insert("broken.lnk".into(), LinkTarget::default());
        let entry = resolver(FakeIcons::default(), shell)
            .resolve(Path::new("broken.lnk"), false)
            .unwrap();
        assert!(entry.icon.is_none());
        assert!(!entry.is_container);
    }

    #[test]
    fn link_without_icon_location_falls_through_to_target_icon() {
        let icons = Arc::new(FakeIcons::default());
        let mut shell = FakeShell::default();
        shell.links.insert(
            "notes.lnk".into(),
            LinkTarget {
                target_path: "C:\\notes.txt".into(),
                arguments: "--fast".into(),
                working_directory: "C:\\".into(),
                ..Default::default()
            },
        );
        let resolver = EntryResolver::new(icons.clone(), Arc::new(shell));

        let entry = resolver.resolve(Path::new("notes.lnk"), false).unwrap();
        assert!(entry.icon.is_some());
        assert!(entry.is_resolved_link);
        assert_eq!(entry.target_path, "C:\\notes.txt");
        assert_eq!(entry.arguments, "--fast");
        assert_eq!(icons.file_fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unreadable_link_recovers_without_icon() {
        let mut shell = FakeShell::default();
        shell.fail_link_with = Some(|| IconError::InvalidArgument("corrupt.lnk".into()));
        let entry = resolver(FakeIcons::default(), shell)
            .resolve(Path::new("corrupt.lnk"), false)
            .unwrap();
        assert!(entry.icon.is_none());
        assert!(!entry.is_container);
        assert_eq!(entry.display_text, "corrupt");
    }

    #[test]
    fn link_resolution_defect_escapes_resolve() {
        let mut shell = FakeShell::default();
        shell.fail_link_with = Some(|| IconError::ShellApi("com gone".into()));
        let result =
            resolver(FakeIcons::default(), shell).resolve(Path::new("corrupt.lnk"), false);
        assert!(matches!(result, Err(IconError::ShellApi(_))));
    }

    #[test]
    fn url_without_icon_file_and_without_browser_has_no_icon() {
        let mut shell = FakeShell::default();
        shell.browser = None;
        let entry = resolver(FakeIcons::default(), shell)
            .resolve(Path::new("news.url"), false)
            .unwrap();
        assert!(entry.icon.is_none());
        assert_eq!(entry.display_text, "news");
    }

    #[test]
    fn url_without_icon_file_uses_cached_browser_icon() {
        let icons = Arc::new(FakeIcons::default());
        let mut shell = FakeShell::default();
        shell.browser = Some(PathBuf::from("C:\\browser\\firefox.exe"));
        let resolver = EntryResolver::new(icons.clone(), Arc::new(shell));

        let a = resolver.resolve(Path::new("a.url"), false).unwrap();
        let b = resolver.resolve(Path::new("b.url"), false).unwrap();
        assert!(a.icon.unwrap().shares_pixels(&b.icon.unwrap()));
        assert_eq!(icons.file_fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn project_file_uses_last_embedded_icon() {
        let mut shell = FakeShell::default();
        shell.associated_executable = Some(PathBuf::from("devenv.exe"));
        let first = IconHandle::placeholder(IconSize::Small);
        let last = IconHandle::placeholder(IconSize::Small);
        shell.embedded_icons = vec![first, last.clone()];
        let entry = resolver(FakeIcons::default(), shell)
            .resolve(Path::new("app.sln"), false)
            .unwrap();
        assert!(entry.icon.unwrap().shares_pixels(&last));
    }

    #[test]
    fn project_file_without_association_recovers_without_icon() {
        let shell = FakeShell::default(); // find_associated_executable fails recoverably
        let entry = resolver(FakeIcons::default(), shell)
            .resolve(Path::new("app.sln"), false)
            .unwrap();
        assert!(entry.icon.is_none());
    }

    #[test]
    fn recoverable_extraction_failure_does_not_escape_resolve() {
        let icons = FakeIcons::default();
        *icons.fail_file_with.lock() = Some(|| IconError::AccessDenied("a.txt".into()));
        let entry = resolver(icons, FakeShell::default())
            .resolve(Path::new("a.txt"), false)
            .unwrap();
        assert!(entry.icon.is_none());
    }

    #[test]
    fn unrecognized_failure_escapes_resolve() {
        let icons = FakeIcons::default();
        *icons.fail_file_with.lock() = Some(|| IconError::ShellApi("defect".into()));
        let result = resolver(icons, FakeShell::default()).resolve(Path::new("a.txt"), false);
        assert!(matches!(result, Err(IconError::ShellApi(_))));
    }

    #[test]
    fn plain_files_share_cached_icon_per_extension() {
        let icons = Arc::new(FakeIcons::default());
        let resolver = EntryResolver::new(icons.clone(), Arc::new(FakeShell::default()));

        let a = resolver.resolve(Path::new("a.txt"), false).unwrap();
        let b = resolver.resolve(Path::new("b.txt"), false).unwrap();
        assert!(a.icon.unwrap().shares_pixels(&b.icon.unwrap()));
        assert_eq!(icons.file_fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn resolve_batch_preserves_entry_order() {
        let resolver = resolver(FakeIcons::default(), FakeShell::default());
        let inputs = vec![
            (PathBuf::from("a.txt"), false),
            (PathBuf::from("b.pdf"), true),
        ];
        let results = resolver.resolve_batch(&inputs);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().display_text, "a.txt");
        assert!(results[1].as_ref().unwrap().is_hidden);
    }

    #[test]
    fn icon_index_suffix_is_stripped() {
        assert_eq!(strip_icon_index("C:\\app.exe,0"), "C:\\app.exe");
        assert_eq!(strip_icon_index("C:\\app.exe,12"), "C:\\app.exe");
        assert_eq!(strip_icon_index("C:\\app.exe"), "C:\\app.exe");
        assert_eq!(strip_icon_index("C:\\odd,name.dll"), "C:\\odd,name.dll");
    }
}
