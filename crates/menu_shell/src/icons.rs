//! Shell icon queries via SHGetFileInfoW
//!
//! The system image list owns the handles it returns; everything is cloned
//! into caller-owned pixels and the native handles destroyed before
//! returning, in the same scope that obtained them.

use menu_core::{FolderKind, IconHandle, IconSize, IconSource, Result};
use std::path::Path;
use windows::core::PCWSTR;
use windows::Win32::Storage::FileSystem::{
    FILE_ATTRIBUTE_DIRECTORY, FILE_ATTRIBUTE_NORMAL, FILE_FLAGS_AND_ATTRIBUTES,
};
use windows::Win32::UI::Controls::{ImageList_GetIcon, HIMAGELIST, ILD_TRANSPARENT};
use windows::Win32::UI::Shell::{
    SHGetFileInfoW, SHFILEINFOW, SHGFI_FLAGS, SHGFI_ICON, SHGFI_LARGEICON, SHGFI_LINKOVERLAY,
    SHGFI_OPENICON, SHGFI_SMALLICON, SHGFI_SYSICONINDEX,
};
use windows::Win32::UI::WindowsAndMessaging::DestroyIcon;

use crate::hicon::icon_to_handle;

pub(crate) fn wide(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(std::iter::once(0)).collect()
}

/// [`IconSource`] backed by the Windows shell
#[derive(Debug, Default)]
pub struct ShellIconSource;

impl ShellIconSource {
    pub fn new() -> Self {
        Self
    }

    fn size_flag(size: IconSize) -> u32 {
        match size {
            IconSize::Small => SHGFI_SMALLICON.0,
            IconSize::Large => SHGFI_LARGEICON.0,
        }
    }

    /// Run the file-info query and clone the resulting icon.
    ///
    /// `from_image_list` pulls the transparent copy out of the system
    /// image list instead of taking the file-info icon; the overlay
    /// variants skip that since the arrow is already composited in.
    fn query(
        path: &Path,
        attributes: FILE_FLAGS_AND_ATTRIBUTES,
        flags: u32,
        from_image_list: bool,
    ) -> Result<Option<IconHandle>> {
        let wide_path = wide(&path.to_string_lossy());
        let mut shfi = SHFILEINFOW::default();

        unsafe {
            let image_list = SHGetFileInfoW(
                PCWSTR(wide_path.as_ptr()),
                attributes,
                Some(&mut shfi),
                std::mem::size_of::<SHFILEINFOW>() as u32,
                SHGFI_FLAGS(flags),
            );
            if image_list == 0 {
                tracing::debug!(path = %path.display(), "shell returned no icon");
                return Ok(None);
            }

            let (hicon, owns_clone_source) = if from_image_list {
                let himl = HIMAGELIST(image_list as *mut core::ffi::c_void);
                (ImageList_GetIcon(himl, shfi.iIcon, ILD_TRANSPARENT), true)
            } else {
                (shfi.hIcon, false)
            };

            if hicon.is_invalid() {
                if !shfi.hIcon.is_invalid() {
                    let _ = DestroyIcon(shfi.hIcon);
                }
                return Ok(None);
            }

            let result = icon_to_handle(hicon);

            // Neither handle is ours to keep past this point.
            if owns_clone_source {
                let _ = DestroyIcon(hicon);
            }
            if !shfi.hIcon.is_invalid() {
                let _ = DestroyIcon(shfi.hIcon);
            }

            result
        }
    }
}

impl IconSource for ShellIconSource {
    fn file_icon(
        &self,
        path: &Path,
        link_overlay: bool,
        size: IconSize,
    ) -> Result<Option<IconHandle>> {
        let mut flags = SHGFI_ICON.0 | SHGFI_SYSICONINDEX.0 | Self::size_flag(size);
        if link_overlay {
            flags |= SHGFI_LINKOVERLAY.0;
        }
        Self::query(path, FILE_ATTRIBUTE_NORMAL, flags, !link_overlay)
    }

    fn folder_icon(
        &self,
        path: &Path,
        kind: FolderKind,
        link_overlay: bool,
        size: IconSize,
    ) -> Result<Option<IconHandle>> {
        let mut flags = SHGFI_ICON.0 | Self::size_flag(size);
        if link_overlay {
            flags |= SHGFI_LINKOVERLAY.0;
        }
        if kind == FolderKind::Open {
            flags |= SHGFI_OPENICON.0;
        }
        Self::query(path, FILE_ATTRIBUTE_DIRECTORY, flags, false)
    }
}
