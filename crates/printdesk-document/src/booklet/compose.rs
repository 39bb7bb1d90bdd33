// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Booklet composer: turns a source PDF into the imposed booklet PDF.
//
// Output page k*2 is the front of sheet k+1, page k*2+1 its back. Each side
// is a landscape sheet with two source pages drawn at half scale, one per
// half. Blank slots are simply not drawn.
//
// The same composer also renders n-up documents, with several pages per
// output page in reading order.

use std::path::Path;

use printdesk_core::error::{PrintdeskError, Result};
use printdesk_core::integrity::short_fingerprint;
use printdesk_core::types::NUpGrid;
use tracing::{debug, info, instrument};

use super::layout::{BookletLayout, Face, Half, compute_layout, compute_layout_only};
use super::nup::{NUpLayout, cell_placement, compute_nup_layout, sheet_for_grid};
use crate::pdf::library::{PdfLibrary, Placement};
use crate::pdf::lopdf_library::LopdfLibrary;

/// Scale applied to both axes of every source page.
pub const PAGE_SCALE: f32 = 0.5;

/// Output sheet dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetSize {
    pub width: f32,
    pub height: f32,
}

impl SheetSize {
    /// A4 landscape.
    pub const A4_LANDSCAPE: SheetSize = SheetSize {
        width: 841.89,
        height: 595.28,
    };

    /// Placement of a source page of `source_size` on one half of the sheet.
    ///
    /// Width and height are halved. The page is anchored at the left edge of
    /// its half and vertically offset by half of the difference between the
    /// sheet height and the source page's own height.
    pub fn placement(&self, half: Half, source_size: (f32, f32)) -> Placement {
        let (w, h) = source_size;
        let x = match half {
            Half::Left => 0.0,
            Half::Right => self.width / 2.0,
        };
        Placement {
            x,
            y: (self.height - h) / 2.0,
            width: w * PAGE_SCALE,
            height: h * PAGE_SCALE,
        }
    }
}

impl Default for SheetSize {
    fn default() -> Self {
        Self::A4_LANDSCAPE
    }
}

/// Composes booklets through a [`PdfLibrary`].
pub struct BookletComposer<L: PdfLibrary = LopdfLibrary> {
    library: L,
    sheet: SheetSize,
}

impl BookletComposer<LopdfLibrary> {
    /// Composer backed by lopdf, printing on A4 landscape.
    pub fn new() -> Self {
        Self::with_library(LopdfLibrary)
    }
}

impl Default for BookletComposer<LopdfLibrary> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: PdfLibrary> BookletComposer<L> {
    pub fn with_library(library: L) -> Self {
        Self {
            library,
            sheet: SheetSize::A4_LANDSCAPE,
        }
    }

    pub fn with_sheet(mut self, sheet: SheetSize) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn sheet(&self) -> SheetSize {
        self.sheet
    }

    /// Load `pdf` and plan its layout without rendering anything.
    pub fn plan(&self, pdf: &[u8]) -> Result<BookletLayout> {
        let source = self.library.load(pdf)?;
        compute_layout_only(self.library.page_count(&source))
    }

    /// Plan and render a booklet from PDF bytes.
    ///
    /// Returns the serialised booklet and the layout it was built from.
    /// Malformed input fails with `DocumentLoad`; a PDF with no pages fails
    /// with `InvalidInput`.
    #[instrument(skip_all, fields(input_len = pdf.len(), fingerprint = %short_fingerprint(pdf)))]
    pub fn compose(&self, pdf: &[u8]) -> Result<(Vec<u8>, BookletLayout)> {
        let source = self.library.load(pdf)?;
        let page_count = self.library.page_count(&source);
        if page_count == 0 {
            return Err(PrintdeskError::InvalidInput(
                "Error processing PDF: document has no pages".into(),
            ));
        }

        let layout = compute_layout(page_count)?;
        debug!(
            pages = page_count,
            sheets = layout.sheets_needed,
            blanks = layout.blank_pages,
            "booklet layout planned"
        );

        let mut output = self.library.create();
        for sheet in &layout.sheets {
            for face in [Face::Front, Face::Back] {
                let page = self
                    .library
                    .add_page(&mut output, self.sheet.width, self.sheet.height);
                let pair = sheet.side(face);
                for (half, number) in [(Half::Left, pair.left), (Half::Right, pair.right)] {
                    if layout.is_blank(number) {
                        continue;
                    }
                    let index = number - 1;
                    let size = self.library.page_size(&source, index)?;
                    let placement = self.sheet.placement(half, size);
                    self.library
                        .draw_page(&mut output, page, &source, index, placement)?;
                }
            }
        }

        let bytes = self.library.save(output)?;
        info!(
            pages = page_count,
            output_pages = layout.output_page_count(),
            output_len = bytes.len(),
            "booklet composed"
        );
        Ok((bytes, layout))
    }

    /// Read `input`, compose it, and write the booklet to `output`.
    pub fn compose_file(&self, input: &Path, output: &Path) -> Result<BookletLayout> {
        let pdf = std::fs::read(input)?;
        let (bytes, layout) = self.compose(&pdf)?;
        std::fs::write(output, bytes)?;
        Ok(layout)
    }

    /// Render `pdf` with `grid` pages on every output page.
    ///
    /// The composer's sheet is turned to suit the grid. Fails like
    /// [`compose`](Self::compose) on malformed or empty input.
    #[instrument(skip_all, fields(input_len = pdf.len(), columns = grid.columns, rows = grid.rows))]
    pub fn compose_nup(&self, pdf: &[u8], grid: NUpGrid) -> Result<(Vec<u8>, NUpLayout)> {
        let source = self.library.load(pdf)?;
        let page_count = self.library.page_count(&source);
        if page_count == 0 {
            return Err(PrintdeskError::InvalidInput(
                "Error processing PDF: document has no pages".into(),
            ));
        }

        let layout = compute_nup_layout(page_count, grid)?;
        let sheet = sheet_for_grid(self.sheet, grid);

        let mut output = self.library.create();
        for index in 0..layout.sheets_needed {
            let page = self.library.add_page(&mut output, sheet.width, sheet.height);
            for (slot, source_index) in layout.pages_on_sheet(index) {
                let size = self.library.page_size(&source, source_index)?;
                let placement = cell_placement(sheet, grid, slot, size);
                self.library
                    .draw_page(&mut output, page, &source, source_index, placement)?;
            }
        }

        let bytes = self.library.save(output)?;
        info!(
            pages = page_count,
            output_pages = layout.sheets_needed,
            output_len = bytes.len(),
            "n-up document composed"
        );
        Ok((bytes, layout))
    }

    /// Read `input`, render it n-up, and write the result to `output`.
    pub fn compose_nup_file(&self, input: &Path, output: &Path, grid: NUpGrid) -> Result<NUpLayout> {
        let pdf = std::fs::read(input)?;
        let (bytes, layout) = self.compose_nup(&pdf, grid)?;
        std::fs::write(output, bytes)?;
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::pdf::library::PageHandle;

    /// Records every call instead of producing a PDF.
    struct RecordingLibrary {
        pages: Vec<(f32, f32)>,
        draws: RefCell<Vec<(usize, u32, Placement)>>,
    }

    struct FakeOutput {
        pages: Vec<(f32, f32)>,
    }

    impl RecordingLibrary {
        fn uniform(count: usize, size: (f32, f32)) -> Self {
            Self {
                pages: vec![size; count],
                draws: RefCell::new(Vec::new()),
            }
        }
    }

    impl PdfLibrary for &RecordingLibrary {
        type Source = ();
        type Output = FakeOutput;

        fn load(&self, bytes: &[u8]) -> Result<()> {
            if bytes.starts_with(b"%PDF") {
                Ok(())
            } else {
                Err(PrintdeskError::DocumentLoad("not a PDF".into()))
            }
        }

        fn page_count(&self, _: &()) -> u32 {
            self.pages.len() as u32
        }

        fn page_size(&self, _: &(), index: u32) -> Result<(f32, f32)> {
            Ok(self.pages[index as usize])
        }

        fn create(&self) -> FakeOutput {
            FakeOutput { pages: Vec::new() }
        }

        fn add_page(&self, output: &mut FakeOutput, width: f32, height: f32) -> PageHandle {
            output.pages.push((width, height));
            PageHandle(output.pages.len() - 1)
        }

        fn draw_page(
            &self,
            _: &mut FakeOutput,
            page: PageHandle,
            _: &(),
            index: u32,
            placement: Placement,
        ) -> Result<()> {
            self.draws.borrow_mut().push((page.0, index, placement));
            Ok(())
        }

        fn save(&self, output: FakeOutput) -> Result<Vec<u8>> {
            Ok(vec![output.pages.len() as u8])
        }
    }

    const A4: (f32, f32) = (595.28, 841.89);

    #[test]
    fn eight_pages_make_four_sides() {
        let lib = RecordingLibrary::uniform(8, A4);
        let (bytes, layout) = BookletComposer::with_library(&lib)
            .compose(b"%PDF-1.7")
            .expect("compose");
        assert_eq!(bytes, vec![4]);
        assert_eq!(layout.sheets_needed, 2);

        let drawn: Vec<(usize, u32)> = lib
            .draws
            .borrow()
            .iter()
            .map(|(page, index, _)| (*page, *index + 1))
            .collect();
        assert_eq!(
            drawn,
            vec![
                (0, 8),
                (0, 1),
                (1, 2),
                (1, 7),
                (2, 6),
                (2, 3),
                (3, 4),
                (3, 5)
            ]
        );
    }

    #[test]
    fn blank_slots_are_not_drawn() {
        let lib = RecordingLibrary::uniform(5, A4);
        let (bytes, layout) = BookletComposer::with_library(&lib)
            .compose(b"%PDF-1.7")
            .expect("compose");
        assert_eq!(bytes, vec![4]);
        assert_eq!(layout.blank_pages, 3);

        let draws = lib.draws.borrow();
        assert_eq!(draws.len(), 5);
        assert!(draws.iter().all(|(_, index, _)| *index < 5));
    }

    #[test]
    fn placements_use_half_scale_and_half_offsets() {
        let lib = RecordingLibrary::uniform(2, A4);
        BookletComposer::with_library(&lib)
            .compose(b"%PDF-1.7")
            .expect("compose");

        let draws = lib.draws.borrow();
        // Sheet 1 front is [4, 1]: 4 is blank, page 1 sits on the right half.
        let (page, index, right) = draws[0];
        assert_eq!((page, index), (0, 0));
        assert_eq!(right.x, 841.89 / 2.0);
        assert_eq!(right.width, 595.28 * 0.5);
        assert_eq!(right.height, 841.89 * 0.5);
        assert_eq!(right.y, (595.28 - 841.89) / 2.0);

        // Sheet 1 back is [2, 3]: page 2 on the left half.
        let (page, index, left) = draws[1];
        assert_eq!((page, index), (1, 1));
        assert_eq!(left.x, 0.0);
    }

    #[test]
    fn planning_draws_nothing() {
        let lib = RecordingLibrary::uniform(13, A4);
        let layout = BookletComposer::with_library(&lib)
            .plan(b"%PDF-1.7")
            .expect("plan");
        assert_eq!(layout.sheets_needed, 4);
        assert_eq!(layout.blank_pages, 3);
        assert!(lib.draws.borrow().is_empty());
    }

    #[test]
    fn malformed_input_is_a_load_error() {
        let lib = RecordingLibrary::uniform(3, A4);
        let result = BookletComposer::with_library(&lib).compose(b"garbage");
        assert!(matches!(result, Err(PrintdeskError::DocumentLoad(_))));
    }

    #[test]
    fn empty_document_is_rejected() {
        let lib = RecordingLibrary::uniform(0, A4);
        let result = BookletComposer::with_library(&lib).compose(b"%PDF-1.7");
        assert!(matches!(result, Err(PrintdeskError::InvalidInput(_))));
    }

    #[test]
    fn sheet_size_can_be_overridden() {
        let lib = RecordingLibrary::uniform(1, A4);
        let letter = SheetSize {
            width: 792.0,
            height: 612.0,
        };
        let composer = BookletComposer::with_library(&lib).with_sheet(letter);
        assert_eq!(composer.sheet(), letter);
        composer.compose(b"%PDF-1.7").expect("compose");
        assert_eq!(lib.draws.borrow()[0].2.x, 396.0);
    }

    #[test]
    fn lopdf_booklet_has_two_sides_per_sheet() {
        use crate::pdf::fixture::sample_a4_pdf;

        let composer = BookletComposer::new();
        for (pages, sides) in [(1, 2), (4, 2), (5, 4), (8, 4), (9, 6)] {
            let pdf = sample_a4_pdf(pages).expect("fixture");
            let (bytes, layout) = composer.compose(&pdf).expect("compose");
            assert_eq!(layout.output_page_count(), sides);

            let reloaded = lopdf::Document::load_mem(&bytes).expect("reload");
            assert_eq!(reloaded.get_pages().len(), sides as usize, "{pages} pages");
        }
    }

    #[test]
    fn compose_file_writes_booklet() {
        use crate::pdf::fixture::sample_a4_pdf;

        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        std::fs::write(&input, sample_a4_pdf(6).expect("fixture")).expect("write");

        let layout = BookletComposer::new()
            .compose_file(&input, &output)
            .expect("compose");
        assert_eq!(layout.blank_pages, 2);
        let written = std::fs::read(&output).expect("read");
        assert!(written.starts_with(b"%PDF"));
    }

    fn grid(n: u32) -> NUpGrid {
        NUpGrid::for_pages_per_sheet(n).expect("supported")
    }

    #[test]
    fn nup_draws_pages_in_reading_order() {
        let lib = RecordingLibrary::uniform(5, A4);
        let (bytes, layout) = BookletComposer::with_library(&lib)
            .compose_nup(b"%PDF-1.7", grid(4))
            .expect("compose");
        assert_eq!(bytes, vec![2]);
        assert_eq!(layout.sheets_needed, 2);
        assert_eq!(layout.blank_slots, 3);

        let drawn: Vec<(usize, u32)> = lib
            .draws
            .borrow()
            .iter()
            .map(|(page, index, _)| (*page, *index))
            .collect();
        assert_eq!(drawn, vec![(0, 0), (0, 1), (0, 2), (0, 3), (1, 4)]);
    }

    #[test]
    fn nup_turns_the_sheet_for_square_grids() {
        let lib = RecordingLibrary::uniform(4, A4);
        BookletComposer::with_library(&lib)
            .compose_nup(b"%PDF-1.7", grid(4))
            .expect("compose");
        // Portrait sheet: the top-left cell starts halfway up its height.
        let (_, _, first) = lib.draws.borrow()[0];
        assert_eq!(first.x, 0.0);
        assert!((first.y - 841.89 / 2.0).abs() < 0.01);
    }

    #[test]
    fn nup_rejects_empty_and_malformed_input() {
        let empty = RecordingLibrary::uniform(0, A4);
        let result = BookletComposer::with_library(&empty).compose_nup(b"%PDF-1.7", grid(2));
        assert!(matches!(result, Err(PrintdeskError::InvalidInput(_))));

        let lib = RecordingLibrary::uniform(3, A4);
        let result = BookletComposer::with_library(&lib).compose_nup(b"junk", grid(2));
        assert!(matches!(result, Err(PrintdeskError::DocumentLoad(_))));
    }

    #[test]
    fn lopdf_nup_document_has_one_page_per_grid() {
        use crate::pdf::fixture::sample_a4_pdf;

        let composer = BookletComposer::new();
        for (pages, per_sheet, expected) in [(1, 2, 1), (5, 2, 3), (9, 9, 1), (10, 6, 2)] {
            let pdf = sample_a4_pdf(pages).expect("fixture");
            let (bytes, layout) = composer.compose_nup(&pdf, grid(per_sheet)).expect("compose");
            assert_eq!(layout.sheets_needed, expected);

            let reloaded = lopdf::Document::load_mem(&bytes).expect("reload");
            assert_eq!(reloaded.get_pages().len(), expected as usize, "{pages} pages");
        }
    }

    #[test]
    fn compose_nup_file_writes_document() {
        use crate::pdf::fixture::sample_a4_pdf;

        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        std::fs::write(&input, sample_a4_pdf(3).expect("fixture")).expect("write");

        let layout = BookletComposer::new()
            .compose_nup_file(&input, &output, grid(2))
            .expect("compose");
        assert_eq!(layout.sheets_needed, 2);
        assert!(std::fs::read(&output).expect("read").starts_with(b"%PDF"));
    }

    #[test]
    fn lopdf_rejects_non_pdf_bytes() {
        let result = BookletComposer::new().compose(b"hello, world");
        assert!(matches!(result, Err(PrintdeskError::DocumentLoad(_))));
    }
}
