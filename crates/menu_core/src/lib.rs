//! TrayMenu Icon Resolution Core
//!
//! This crate contains:
//! - Icon handles with explicit ownership tags
//! - Process-lifetime icon cache keyed by file extension
//! - Shell icon provider with cache-eligibility policy
//! - Per-entry resolution (directories, shortcuts, internet shortcuts,
//!   project files, plain files)
//! - Row presentation for the caller's display table
//! - Error taxonomy and configuration
//!
//! OS lookups enter through the collaborator traits in [`shell`]; the
//! Windows implementations live in the `menu_shell` crate.

pub mod cache;
pub mod config;
pub mod error;
pub mod icon;
pub mod provider;
pub mod resolver;
pub mod row;
pub mod shell;

pub use cache::{is_cacheable_extension, IconCache};
pub use config::MenuConfig;
pub use error::{IconError, Result};
pub use icon::{compose_overlay, FolderKind, IconHandle, IconSize, Ownership};
pub use provider::IconProvider;
pub use resolver::{EntryResolver, ResolvedEntry};
pub use row::{ContextMenuGate, DisplayRow, RowTable};
pub use shell::{IconSource, LinkTarget, ShellContext};
