// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Router construction.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};

use crate::handlers;
use crate::state::AppState;

/// Room for the text fields and multipart framing on top of the file cap.
pub const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/booklet-layout", post(handlers::booklet_layout))
        .route("/api/submit-job", post(handlers::submit_job))
        .route("/api/test-connection", post(handlers::test_connection))
        .route("/api/queue-status", post(handlers::queue_status))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
