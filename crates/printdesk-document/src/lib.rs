// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// printdesk-document: booklet planning and PDF imposition for Printdesk.
//
// `booklet::layout` decides which logical page goes where on each folded
// sheet; `booklet::compose` renders that plan through the `pdf::PdfLibrary`
// capability, implemented on top of lopdf. `booklet::nup` plans the
// several-pages-per-side layout rendered by the same composer.

pub mod booklet;
pub mod pdf;

pub use booklet::{
    BookletComposer, BookletLayout, NUpLayout, SheetSize, compute_layout, compute_layout_only,
    compute_nup_layout,
};
pub use pdf::{LopdfLibrary, PdfLibrary};
