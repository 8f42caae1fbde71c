//! Icon handles with explicit ownership tags
//!
//! Every icon crossing a component boundary is an [`IconHandle`]: a shared
//! RGBA pixel buffer plus an [`Ownership`] tag. Cache-owned handles live for
//! the process lifetime and must never be released by a consumer;
//! caller-owned handles are released exactly once. [`IconHandle::release`]
//! checks the tag and refuses to release a cache-owned handle.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{IconError, Result};

/// Shell icon size classes. Only two fixed sizes are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconSize {
    /// 16x16 pixels
    Small,
    /// 32x32 pixels
    Large,
}

impl IconSize {
    pub fn pixels(self) -> u32 {
        match self {
            IconSize::Small => 16,
            IconSize::Large => 32,
        }
    }
}

/// Open/closed variant selector for folder icons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderKind {
    Open,
    Closed,
}

/// Who is responsible for an icon's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Held by the icon cache for the process lifetime; never released
    /// by a consumer.
    CacheOwned,
    /// Released exactly once by whoever received it, on every exit path.
    CallerOwned,
}

/// An icon resource decoupled from any OS-held handle
#[derive(Debug, Clone)]
pub struct IconHandle {
    pixels: Arc<RgbaImage>,
    ownership: Ownership,
}

impl IconHandle {
    /// Wrap pixels cloned out of an OS resource as a caller-owned handle.
    pub fn caller_owned(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
            ownership: Ownership::CallerOwned,
        }
    }

    /// Retag a handle as the cache inserts it. The pixel buffer is shared,
    /// not copied.
    pub(crate) fn into_cache_owned(self) -> Self {
        Self {
            pixels: self.pixels,
            ownership: Ownership::CacheOwned,
        }
    }

    /// A fully transparent square used where no icon could be produced.
    pub fn placeholder(size: IconSize) -> Self {
        let px = size.pixels();
        Self::caller_owned(RgbaImage::from_pixel(px, px, Rgba([0, 0, 0, 0])))
    }

    /// Translucent white veil composed over hidden entries.
    pub fn hidden_overlay(size: IconSize) -> Self {
        let px = size.pixels();
        Self::caller_owned(RgbaImage::from_pixel(px, px, Rgba([255, 255, 255, 128])))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Do two handles share the same underlying pixel buffer?
    pub fn shares_pixels(&self, other: &IconHandle) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }

    /// Release a caller-owned handle. Cache-owned handles are refused so a
    /// consumer cannot tear a shared cache entry out from under other rows.
    pub fn release(self) -> Result<()> {
        match self.ownership {
            Ownership::CallerOwned => Ok(()),
            Ownership::CacheOwned => Err(IconError::ReleaseRefused(self.ownership)),
        }
    }
}

/// Compose `overlay` on top of `base` on a transparent canvas sized to the
/// base icon.
///
/// The pixel at (1,1) is probed as the transparency key: any pixel matching
/// it exactly is cleared, stripping the backing color compositing can
/// introduce. Non-uniform backgrounds will show artifacts.
pub fn compose_overlay(base: &IconHandle, overlay: &IconHandle) -> IconHandle {
    let (w, h) = (base.width(), base.height());
    let mut canvas = RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]));

    image::imageops::overlay(&mut canvas, base.pixels(), 0, 0);
    image::imageops::overlay(&mut canvas, overlay.pixels(), 0, 0);

    let probe_x = 1.min(w.saturating_sub(1));
    let probe_y = 1.min(h.saturating_sub(1));
    let key = *canvas.get_pixel(probe_x, probe_y);
    if key[3] != 0 {
        for pixel in canvas.pixels_mut() {
            if *pixel == key {
                *pixel = Rgba([0, 0, 0, 0]);
            }
        }
    }

    IconHandle::caller_owned(canvas)
}
