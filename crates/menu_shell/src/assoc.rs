//! File associations and embedded icon extraction

use menu_core::{IconError, IconHandle, Result};
use std::path::{Path, PathBuf};
use windows::core::{PCWSTR, PWSTR};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Shell::{
    AssocQueryStringW, ExtractAssociatedIconW, ExtractIconExW, FindExecutableW, ASSOCF_NONE,
    ASSOCSTR_EXECUTABLE,
};
use windows::Win32::UI::WindowsAndMessaging::{DestroyIcon, HICON};

use crate::hicon::icon_to_handle;
use crate::icons::wide;

/// The executable registered to open a document path.
pub(crate) fn find_associated_executable(path: &Path) -> Result<PathBuf> {
    let wide_path = wide(&path.to_string_lossy());
    let mut buffer = [0u16; 260];

    unsafe {
        let instance = FindExecutableW(
            PCWSTR(wide_path.as_ptr()),
            PCWSTR::null(),
            PWSTR(buffer.as_mut_ptr()),
        );
        // Values at or below 32 are the legacy error codes.
        if instance.0 as usize <= 32 {
            return Err(IconError::InvalidArgument(format!(
                "no executable associated with {}",
                path.display()
            )));
        }
    }

    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    Ok(PathBuf::from(String::from_utf16_lossy(&buffer[..len])))
}

/// The executable registered for the `http` protocol, i.e. the default
/// browser. `None` when nothing is configured.
pub(crate) fn default_browser_path() -> Option<PathBuf> {
    let assoc = wide("http");
    let mut buffer = [0u16; 1024];
    let mut length = buffer.len() as u32;

    unsafe {
        AssocQueryStringW(
            ASSOCF_NONE,
            ASSOCSTR_EXECUTABLE,
            PCWSTR(assoc.as_ptr()),
            PCWSTR::null(),
            Some(PWSTR(buffer.as_mut_ptr())),
            &mut length,
        )
        .ok()?;
    }

    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    if len == 0 {
        return None;
    }
    Some(PathBuf::from(String::from_utf16_lossy(&buffer[..len])))
}

/// All icons embedded in an executable, in resource extraction order.
pub(crate) fn extract_all_icons(executable: &Path) -> Result<Vec<IconHandle>> {
    let wide_path = wide(&executable.to_string_lossy());

    unsafe {
        let count = ExtractIconExW(PCWSTR(wide_path.as_ptr()), -1, None, None, 0);
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut large = vec![HICON::default(); count as usize];
        let extracted = ExtractIconExW(
            PCWSTR(wide_path.as_ptr()),
            0,
            Some(large.as_mut_ptr()),
            None,
            count,
        );

        let mut icons = Vec::with_capacity(extracted as usize);
        let mut failure = None;
        for hicon in large.into_iter().take(extracted as usize) {
            if hicon.is_invalid() {
                continue;
            }
            if failure.is_none() {
                match icon_to_handle(hicon) {
                    Ok(Some(icon)) => icons.push(icon),
                    Ok(None) => {}
                    Err(e) => failure = Some(e),
                }
            }
            // Destroy every extracted handle even after a conversion
            // failure; the acquire/release pairs stay balanced.
            let _ = DestroyIcon(hicon);
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(icons),
        }
    }
}

/// The icon associated with one concrete file, e.g. a shortcut's declared
/// icon-location target.
pub(crate) fn associated_icon(path: &Path) -> Result<Option<IconHandle>> {
    // ExtractAssociatedIconW may rewrite the buffer with the path the icon
    // actually came from, hence the oversized mutable copy.
    let mut buffer = [0u16; 260];
    let text = path.to_string_lossy();
    let encoded: Vec<u16> = text.encode_utf16().collect();
    if encoded.len() >= buffer.len() {
        return Err(IconError::PathTooLong(text.into_owned()));
    }
    buffer[..encoded.len()].copy_from_slice(&encoded);

    unsafe {
        let instance = GetModuleHandleW(None)
            .map_err(|e| IconError::ShellApi(format!("GetModuleHandleW: {e}")))?;
        let mut index = 0u16;
        let hicon = ExtractAssociatedIconW(instance.into(), &mut buffer, &mut index);
        if hicon.is_invalid() {
            return Ok(None);
        }

        let result = icon_to_handle(hicon);
        let _ = DestroyIcon(hicon);
        result
    }
}
