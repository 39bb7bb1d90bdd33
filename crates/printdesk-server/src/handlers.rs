// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Route handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use tracing::{debug, info, instrument};

use printdesk_core::types::{PageLayout, PrintCredential};

use crate::dto::{
    ConnectionRequest, HealthResponse, LayoutResponse, QueueResponse, SuccessResponse,
};
use crate::error::ApiError;
use crate::state::AppState;
use crate::uploads::{JobFiles, read_file_bytes, read_submission, render_blocking};

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

/// Page-order preview for an uploaded PDF. Nothing is composed or printed.
#[instrument(skip_all)]
pub async fn booklet_layout(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<LayoutResponse>, ApiError> {
    let pdf = read_file_bytes(&mut multipart, state.config.max_upload_bytes)
        .await?
        .ok_or_else(ApiError::missing_file)?;

    let composer = Arc::clone(&state.composer);
    let layout = tokio::task::spawn_blocking(move || composer.plan(&pdf)).await??;

    debug!(
        pages = layout.page_count,
        sheets = layout.sheets_needed,
        "layout preview computed"
    );
    Ok(Json(LayoutResponse::from(&layout)))
}

/// Upload, optionally impose, and print a document.
///
/// The uploaded file and any booklet or n-up document produced from it are
/// deleted before the response is sent, on success and on every failure
/// path. A render still running when the client disconnects removes its
/// output once it finishes.
#[instrument(skip_all)]
pub async fn submit_job(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SuccessResponse>, ApiError> {
    let config = &state.config;
    let mut files = JobFiles::new(&config.upload_dir);

    let upload = read_submission(&mut multipart, &mut files, config.max_upload_bytes).await?;
    let document = upload.file.ok_or_else(ApiError::missing_file)?;
    let submission = upload
        .form
        .validate(config.default_queue.as_deref(), config.max_copies)?;

    info!(
        fingerprint = %document.fingerprint,
        bytes = document.bytes,
        server = ?submission.server,
        layout = ?submission.layout,
        copies = submission.options.copies,
        duplex = submission.options.duplex,
        "print job received"
    );

    let print_path = match submission.layout {
        PageLayout::AsIs => document.path.clone(),
        PageLayout::Booklet => {
            let output = files.allocate("_booklet.pdf");
            let composer = Arc::clone(&state.composer);
            let input = document.path.clone();
            let layout = render_blocking(&files, output.clone(), move |out| {
                composer.compose_file(&input, out)
            })
            .await?;
            debug!(
                sheets = layout.sheets_needed,
                blanks = layout.blank_pages,
                "booklet prepared"
            );
            output
        }
        PageLayout::NUp(grid) => {
            let output = files.allocate("_nup.pdf");
            let composer = Arc::clone(&state.composer);
            let input = document.path.clone();
            let layout = render_blocking(&files, output.clone(), move |out| {
                composer.compose_nup_file(&input, out, grid)
            })
            .await?;
            debug!(
                pages = layout.sheets_needed,
                blanks = layout.blank_slots,
                "n-up document prepared"
            );
            output
        }
    };

    let credential = PrintCredential::with_password(
        config.hosts.host_for(submission.server),
        config.ssh_port,
        submission.username,
        submission.password,
    );
    let result = state
        .submitter
        .submit(credential, &print_path, submission.options)
        .await?
        .into_result()?;

    info!(id = %result.id, fingerprint = %document.fingerprint, "print job submitted");
    files.remove_all();
    Ok(Json(SuccessResponse::new("Print job submitted successfully")))
}

/// Log in to the selected print server and run a trivial command.
#[instrument(skip_all)]
pub async fn test_connection(
    State(state): State<AppState>,
    body: Result<Json<ConnectionRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(request) = body?;
    let credential = request.credential(&state.config)?;

    state.submitter.test_connection(credential).await?;
    Ok(Json(SuccessResponse::new("Connection successful")))
}

/// List the jobs waiting on a printer queue.
#[instrument(skip_all)]
pub async fn queue_status(
    State(state): State<AppState>,
    body: Result<Json<ConnectionRequest>, JsonRejection>,
) -> Result<Json<QueueResponse>, ApiError> {
    let Json(request) = body?;
    let credential = request.credential(&state.config)?;
    let queue = request.queue(&state.config)?;

    let jobs = state.submitter.queue_status(credential, queue).await?;
    Ok(Json(QueueResponse { jobs }))
}
