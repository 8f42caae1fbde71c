//! HICON to pixel-buffer conversion
//!
//! Clones an OS icon handle into caller-owned RGBA pixels. The handle
//! itself is NOT destroyed here; the caller owns its lifetime and must
//! destroy it in the same scope it was obtained.

use image::RgbaImage;
use menu_core::{IconError, IconHandle, Result};
use std::mem::size_of;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    CreateCompatibleDC, CreateDIBSection, DeleteDC, DeleteObject, GetDC, GetObjectW, ReleaseDC,
    SelectObject, BITMAP, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS,
};
use windows::Win32::UI::WindowsAndMessaging::{
    DrawIconEx, GetIconInfo, DI_NORMAL, HICON, ICONINFO,
};

/// Rasterize an icon handle into caller-owned RGBA pixels.
///
/// Returns `Ok(None)` when the icon yields no drawable bitmap or an OS
/// call fails along the way; extraction never turns an OS failure into a
/// hard error.
pub(crate) fn icon_to_handle(icon: HICON) -> Result<Option<IconHandle>> {
    unsafe {
        let mut icon_info = ICONINFO::default();
        if GetIconInfo(icon, &mut icon_info).is_err() {
            return Ok(None);
        }

        let mut bitmap = BITMAP::default();
        GetObjectW(
            icon_info.hbmColor.into(),
            size_of::<BITMAP>() as i32,
            Some(&mut bitmap as *mut _ as *mut _),
        );

        let width = bitmap.bmWidth;
        let height = bitmap.bmHeight;
        if width <= 0 || height <= 0 {
            let _ = DeleteObject(icon_info.hbmColor.into());
            let _ = DeleteObject(icon_info.hbmMask.into());
            return Ok(None);
        }

        let hdc = GetDC(Some(HWND::default()));
        let mem_dc = CreateCompatibleDC(Some(hdc));

        // Top-down 32bpp DIB so rows come out in image order.
        let bmi = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let mut bits: *mut std::ffi::c_void = std::ptr::null_mut();
        let dib = match CreateDIBSection(Some(mem_dc), &bmi, DIB_RGB_COLORS, &mut bits, None, 0) {
            Ok(dib) => dib,
            Err(e) => {
                // GDI failures here are transient (resource pressure,
                // locked session); the entry renders a placeholder.
                tracing::warn!(error = %e, "CreateDIBSection failed, no icon");
                let _ = DeleteDC(mem_dc);
                let _ = ReleaseDC(Some(HWND::default()), hdc);
                let _ = DeleteObject(icon_info.hbmColor.into());
                let _ = DeleteObject(icon_info.hbmMask.into());
                return Ok(None);
            }
        };

        let old_bitmap = SelectObject(mem_dc, dib.into());

        let pixel_count = (width * height) as usize;
        if !bits.is_null() {
            std::ptr::write_bytes(bits as *mut u8, 0, pixel_count * 4);
        }

        let draw_ok = DrawIconEx(mem_dc, 0, 0, icon, 0, 0, 0, None, DI_NORMAL).is_ok();

        let mut pixels = vec![0u8; pixel_count * 4];
        if draw_ok && !bits.is_null() {
            std::ptr::copy_nonoverlapping(bits as *const u8, pixels.as_mut_ptr(), pixels.len());
        }

        let _ = SelectObject(mem_dc, old_bitmap);
        let _ = DeleteObject(dib.into());
        let _ = DeleteDC(mem_dc);
        let _ = ReleaseDC(Some(HWND::default()), hdc);
        let _ = DeleteObject(icon_info.hbmColor.into());
        let _ = DeleteObject(icon_info.hbmMask.into());

        if !draw_ok {
            return Ok(None);
        }

        // BGRA -> RGBA. Legacy icons report an all-zero alpha channel; the
        // mask already took effect during DrawIconEx, so force opaque.
        let all_alpha_zero = pixels.chunks_exact(4).all(|p| p[3] == 0);
        for pixel in pixels.chunks_exact_mut(4) {
            pixel.swap(0, 2);
            if all_alpha_zero {
                pixel[3] = 255;
            }
        }

        let image = RgbaImage::from_raw(width as u32, height as u32, pixels)
            .ok_or_else(|| IconError::Image("icon pixel buffer size mismatch".into()))?;
        Ok(Some(IconHandle::caller_owned(image)))
    }
}
