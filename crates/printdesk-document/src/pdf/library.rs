// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The PDF capability the booklet composer is written against.
//
// The composer never touches a PDF crate directly. It asks a `PdfLibrary`
// to load a source, create an output document, add sheet pages and draw
// scaled source pages onto them. `LopdfLibrary` is the production
// implementation; tests substitute a recording fake.

use printdesk_core::error::Result;

/// Where and how large a source page is drawn on a sheet side, in points.
///
/// The source page is stretched to exactly `width` x `height`, with its
/// lower-left corner at (`x`, `y`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Handle to a page created with [`PdfLibrary::add_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageHandle(pub usize);

/// Minimal set of PDF operations needed to impose pages.
pub trait PdfLibrary {
    /// A parsed input document.
    type Source;
    /// An output document under construction.
    type Output;

    /// Parse PDF bytes. Fails with `DocumentLoad` on malformed input.
    fn load(&self, bytes: &[u8]) -> Result<Self::Source>;

    /// Number of pages in a loaded source.
    fn page_count(&self, source: &Self::Source) -> u32;

    /// Width and height in points of the 0-based source page `index`.
    fn page_size(&self, source: &Self::Source, index: u32) -> Result<(f32, f32)>;

    /// Start an empty output document.
    fn create(&self) -> Self::Output;

    /// Append a blank page of the given size and return its handle.
    fn add_page(&self, output: &mut Self::Output, width: f32, height: f32) -> PageHandle;

    /// Copy the 0-based source page `index` onto `page` at `placement`.
    fn draw_page(
        &self,
        output: &mut Self::Output,
        page: PageHandle,
        source: &Self::Source,
        index: u32,
        placement: Placement,
    ) -> Result<()>;

    /// Serialise the finished output document.
    fn save(&self, output: Self::Output) -> Result<Vec<u8>>;
}
