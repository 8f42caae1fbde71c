//! Row presentation for resolved entries
//!
//! The presentation step is serialized by the caller: the table is mutated
//! through `&mut`, while resolution runs on worker threads. A table
//! refresh bumps the generation; late results from the previous view are
//! rejected rather than interrupted, keeping handle acquire/release pairs
//! balanced.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

use crate::icon::{compose_overlay, IconHandle, IconSize};
use crate::resolver::ResolvedEntry;

/// One (icon, label) display record
#[derive(Debug, Clone)]
pub struct DisplayRow {
    pub icon: IconHandle,
    pub label: String,
}

/// Caller-owned tabular display structure
pub struct RowTable {
    rows: Vec<DisplayRow>,
    generation: u64,
    icon_size: IconSize,
    hidden_overlay: IconHandle,
}

impl RowTable {
    pub fn new(icon_size: IconSize) -> Self {
        Self {
            rows: Vec::new(),
            generation: 0,
            icon_size,
            hidden_overlay: IconHandle::hidden_overlay(icon_size),
        }
    }

    /// Generation token to capture before resolution starts.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drop all rows and invalidate results still in flight.
    pub fn refresh(&mut self) {
        self.rows.clear();
        self.generation += 1;
    }

    /// Append the display record for a resolved entry and assign its row
    /// index. Entries without an icon get a transparent placeholder, never
    /// a blank cell; hidden entries get the overlay composed in.
    ///
    /// Returns `None` when `generation` is stale: the entry's view was
    /// torn down while resolution ran and the result is discarded.
    pub fn present(&mut self, entry: &mut ResolvedEntry, generation: u64) -> Option<usize> {
        if generation != self.generation {
            tracing::debug!(entry = %entry.source_path, "stale entry rejected");
            return None;
        }

        let icon = entry
            .icon
            .clone()
            .unwrap_or_else(|| IconHandle::placeholder(self.icon_size));
        let icon = if entry.is_hidden {
            compose_overlay(&icon, &self.hidden_overlay)
        } else {
            icon
        };

        let index = self.rows.len();
        self.rows.push(DisplayRow {
            icon,
            label: entry.display_text.clone(),
        });
        entry.row_index = Some(index);
        Some(index)
    }

    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Process-wide "context menu recently closed" state, passed explicitly
/// into whoever dispatches clicks instead of being read from an ambient
/// global. Starts empty; no teardown required.
#[derive(Default)]
pub struct ContextMenuGate {
    closed_at: Mutex<Option<Instant>>,
}

impl ContextMenuGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note_closed(&self) {
        *self.closed_at.lock() = Some(Instant::now());
    }

    /// False within `debounce` of the last context menu close, so the
    /// click that dismissed the menu does not also activate a row.
    pub fn accepts_click(&self, debounce: Duration) -> bool {
        match *self.closed_at.lock() {
            Some(closed) => closed.elapsed() > debounce,
            None => true,
        }
    }
}
