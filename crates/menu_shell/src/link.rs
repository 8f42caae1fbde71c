//! Shortcut (.lnk) resolution via IShellLinkW

use menu_core::{IconError, LinkTarget, Result};
use std::path::Path;
use windows::core::{Interface, PCWSTR};
use windows::Win32::Storage::FileSystem::WIN32_FIND_DATAW;
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoUninitialize, IPersistFile, CLSCTX_INPROC_SERVER,
    COINIT_MULTITHREADED, STGM_READ,
};
use windows::Win32::UI::Shell::{IShellLinkW, ShellLink, SLGP_UNCPRIORITY, SLR_NO_UI};

use crate::icons::wide;

/// COM init guard, balanced per thread
pub(crate) struct ComInit {
    initialized: bool,
}

impl ComInit {
    pub(crate) fn new() -> Self {
        unsafe {
            let hr = CoInitializeEx(None, COINIT_MULTITHREADED);
            Self {
                initialized: hr.is_ok(),
            }
        }
    }
}

impl Drop for ComInit {
    fn drop(&mut self) {
        if self.initialized {
            unsafe {
                CoUninitialize();
            }
        }
    }
}

fn from_wide(buffer: &[u16]) -> String {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..len])
}

/// Load a shortcut file and read its target, icon location, and launch
/// fields. An unresolvable target comes back as an empty string rather
/// than an error; that case is expected for some system shortcuts.
pub(crate) fn resolve_link(path: &Path) -> Result<LinkTarget> {
    unsafe {
        let _com = ComInit::new();

        let shell_link: IShellLinkW = CoCreateInstance(&ShellLink, None, CLSCTX_INPROC_SERVER)
            .map_err(|e| IconError::ShellApi(format!("CoCreateInstance(ShellLink): {e}")))?;
        let persist_file: IPersistFile = shell_link
            .cast()
            .map_err(|e| IconError::ShellApi(format!("IPersistFile cast: {e}")))?;

        let wide_path = wide(&path.to_string_lossy());
        persist_file
            .Load(PCWSTR(wide_path.as_ptr()), STGM_READ)
            .map_err(|e| IconError::InvalidArgument(format!("{}: {e}", path.display())))?;

        // Best effort; a dangling link still yields its stored fields.
        let _ = shell_link.Resolve(None, SLR_NO_UI.0 as u32);

        let mut target = [0u16; 260];
        let mut find_data = WIN32_FIND_DATAW::default();
        if shell_link
            .GetPath(&mut target, &mut find_data, SLGP_UNCPRIORITY.0 as u32)
            .is_err()
        {
            return Ok(LinkTarget::default());
        }

        let mut icon_path = [0u16; 260];
        let mut icon_index = 0i32;
        let _ = shell_link.GetIconLocation(&mut icon_path, &mut icon_index);

        let mut arguments = [0u16; 260];
        let _ = shell_link.GetArguments(&mut arguments);

        let mut working_dir = [0u16; 260];
        let _ = shell_link.GetWorkingDirectory(&mut working_dir);

        let icon_location = from_wide(&icon_path);
        Ok(LinkTarget {
            target_path: from_wide(&target),
            icon_location: if icon_location.is_empty() {
                icon_location
            } else {
                format!("{icon_location},{icon_index}")
            },
            arguments: from_wide(&arguments),
            working_directory: from_wide(&working_dir),
        })
    }
}
