// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Booklet layout planner: saddle-stitch imposition for a single signature.
//
// Every physical sheet carries four logical pages: two on the front, two on
// the back. Stacking the sheets in order, folding once down the middle and
// stapling the fold yields pages 1..N in reading order.
//
// For sheet index i (0-based) and T = total padded page count:
//
//   front = [T - 2i,  2i + 1]
//   back  = [2i + 2,  T - 2i - 1]
//
// Slots numbered above the real page count are blanks.

use printdesk_core::error::{PrintdeskError, Result};
use serde::{Deserialize, Serialize};

/// Logical pages carried by one sheet.
pub const PAGES_PER_SHEET: u32 = 4;

/// Left/right pair of 1-based logical page numbers on one side of a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PagePair {
    pub left: u32,
    pub right: u32,
}

/// Which half of a sheet side a page occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Half {
    Left,
    Right,
}

/// Which face of the paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    Front,
    Back,
}

/// One physical sheet of paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetAssignment {
    /// 1-based position in the stack.
    pub sheet_number: u32,
    pub front: PagePair,
    pub back: PagePair,
}

impl SheetAssignment {
    /// The four slots in drawing order: front-left, front-right, back-left,
    /// back-right.
    pub fn slots(&self) -> [(Face, Half, u32); 4] {
        [
            (Face::Front, Half::Left, self.front.left),
            (Face::Front, Half::Right, self.front.right),
            (Face::Back, Half::Left, self.back.left),
            (Face::Back, Half::Right, self.back.right),
        ]
    }

    pub fn side(&self, face: Face) -> PagePair {
        match face {
            Face::Front => self.front,
            Face::Back => self.back,
        }
    }
}

/// Complete imposition plan for one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookletLayout {
    /// Pages in the source document.
    pub page_count: u32,
    pub sheets_needed: u32,
    /// `sheets_needed * 4`.
    pub total_pages_needed: u32,
    /// Padding slots, always 0..=3.
    pub blank_pages: u32,
    pub sheets: Vec<SheetAssignment>,
}

impl BookletLayout {
    /// Whether a logical page number is padding rather than a source page.
    pub fn is_blank(&self, page: u32) -> bool {
        page > self.page_count
    }

    /// Output pages a composed booklet has: one per sheet side.
    pub fn output_page_count(&self) -> u32 {
        self.sheets_needed * 2
    }
}

/// Compute the saddle-stitch layout for `page_count` source pages.
///
/// Pure and deterministic. Fails with `InvalidInput` when `page_count` is 0.
pub fn compute_layout(page_count: u32) -> Result<BookletLayout> {
    if page_count == 0 {
        return Err(PrintdeskError::InvalidInput(
            "page count must be at least 1".into(),
        ));
    }

    let sheets_needed = page_count.div_ceil(PAGES_PER_SHEET);
    let total_pages_needed = sheets_needed * PAGES_PER_SHEET;
    let blank_pages = total_pages_needed - page_count;

    let sheets = (0..sheets_needed)
        .map(|i| SheetAssignment {
            sheet_number: i + 1,
            front: PagePair {
                left: total_pages_needed - i * 2,
                right: i * 2 + 1,
            },
            back: PagePair {
                left: i * 2 + 2,
                right: total_pages_needed - i * 2 - 1,
            },
        })
        .collect();

    Ok(BookletLayout {
        page_count,
        sheets_needed,
        total_pages_needed,
        blank_pages,
        sheets,
    })
}

/// Layout-only entry point for preview requests: plans, composes nothing.
pub fn compute_layout_only(page_count: u32) -> Result<BookletLayout> {
    compute_layout(page_count)
}
