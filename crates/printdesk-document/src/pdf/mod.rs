// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF access: the capability trait and its lopdf implementation.

pub mod fixture;
pub mod library;
pub mod lopdf_library;

pub use library::{PageHandle, PdfLibrary, Placement};
pub use lopdf_library::LopdfLibrary;
