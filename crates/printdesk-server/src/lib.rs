// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// printdesk-server: the HTTP boundary.
//
// Accepts PDF uploads, previews booklet layouts, composes booklets and hands
// documents to the remote print submitter. Uploaded files live in the upload
// directory only for the duration of their request.

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod uploads;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
