//! TrayMenu OS-glue layer
//!
//! Implements the `menu_core` collaborator traits against the Windows
//! shell: `SHGetFileInfoW` icon queries, `IShellLinkW` shortcut
//! resolution, file associations, and embedded-icon extraction. The
//! internet-shortcut INI reader is plain file parsing and available on
//! every platform.

mod ini_file;

pub use ini_file::read_ini_value;

#[cfg(windows)]
mod hicon;
#[cfg(windows)]
mod icons;
#[cfg(windows)]
mod link;
#[cfg(windows)]
mod assoc;
#[cfg(windows)]
mod context;

#[cfg(windows)]
pub use context::WindowsShell;
#[cfg(windows)]
pub use icons::ShellIconSource;
