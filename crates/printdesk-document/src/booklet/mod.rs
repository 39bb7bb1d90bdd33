// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet layouts: booklet imposition and n-up planning.

pub mod compose;
pub mod layout;
pub mod nup;

pub use compose::{BookletComposer, SheetSize};
pub use layout::{BookletLayout, PagePair, SheetAssignment, compute_layout, compute_layout_only};
pub use nup::{NUpLayout, compute_nup_layout};
