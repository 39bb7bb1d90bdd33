// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// N-up planner: several source pages on each output page, in reading order.
//
// Output page k holds source pages k*n .. k*n + n - 1, filled row by row
// from the top-left cell. Each source page is scaled uniformly to fit its
// cell and centred in it. Cells past the last source page stay empty.

use printdesk_core::error::{PrintdeskError, Result};
use printdesk_core::types::NUpGrid;
use serde::{Deserialize, Serialize};

use super::compose::SheetSize;
use crate::pdf::library::Placement;

/// Plan for printing a document n-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NUpLayout {
    /// Pages in the source document.
    pub page_count: u32,
    pub grid: NUpGrid,
    /// Output pages (sheet sides) produced.
    pub sheets_needed: u32,
    /// Empty cells on the last output page.
    pub blank_slots: u32,
}

impl NUpLayout {
    /// `(slot, source index)` pairs drawn on 0-based output page `sheet`.
    /// Both are 0-based; slots count row by row from the top-left.
    pub fn pages_on_sheet(&self, sheet: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
        let per_sheet = self.grid.pages_per_sheet();
        let first = sheet * per_sheet;
        (0..per_sheet)
            .map(move |slot| (slot, first + slot))
            .filter(move |&(_, index)| index < self.page_count)
    }
}

/// Plan an n-up document of `page_count` pages.
///
/// Fails with `InvalidInput` if `page_count` is 0.
pub fn compute_nup_layout(page_count: u32, grid: NUpGrid) -> Result<NUpLayout> {
    if page_count == 0 {
        return Err(PrintdeskError::InvalidInput(
            "page count must be at least 1".into(),
        ));
    }
    let per_sheet = grid.pages_per_sheet();
    let sheets_needed = page_count.div_ceil(per_sheet);
    Ok(NUpLayout {
        page_count,
        grid,
        sheets_needed,
        blank_slots: sheets_needed * per_sheet - page_count,
    })
}

/// `sheet` turned to suit `grid`: landscape for wider-than-tall grids,
/// portrait otherwise.
pub fn sheet_for_grid(sheet: SheetSize, grid: NUpGrid) -> SheetSize {
    let (long, short) = if sheet.width >= sheet.height {
        (sheet.width, sheet.height)
    } else {
        (sheet.height, sheet.width)
    };
    if grid.is_landscape() {
        SheetSize {
            width: long,
            height: short,
        }
    } else {
        SheetSize {
            width: short,
            height: long,
        }
    }
}

/// Placement of a source page of `source_size` in grid cell `slot`.
pub fn cell_placement(
    sheet: SheetSize,
    grid: NUpGrid,
    slot: u32,
    source_size: (f32, f32),
) -> Placement {
    let cell_width = sheet.width / grid.columns as f32;
    let cell_height = sheet.height / grid.rows as f32;
    let column = (slot % grid.columns) as f32;
    let row = (slot / grid.columns) as f32;

    let (w, h) = source_size;
    let scale = if w > 0.0 && h > 0.0 {
        (cell_width / w).min(cell_height / h)
    } else {
        1.0
    };
    let (width, height) = (w * scale, h * scale);

    // PDF space grows upwards, so row 0 is the top band of the sheet.
    let cell_bottom = sheet.height - (row + 1.0) * cell_height;
    Placement {
        x: column * cell_width + (cell_width - width) / 2.0,
        y: cell_bottom + (cell_height - height) / 2.0,
        width,
        height,
    }
}
