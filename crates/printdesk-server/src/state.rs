// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared handler state.

use std::sync::Arc;

use printdesk_core::AppConfig;
use printdesk_document::BookletComposer;
use printdesk_print::Submitter;

/// Cloned into every handler. Holds no per-request data.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub submitter: Submitter,
    pub composer: Arc<BookletComposer>,
}

impl AppState {
    /// State backed by real SSH connections.
    pub fn new(config: AppConfig) -> Self {
        let submitter = Submitter::ssh(&config);
        Self::with_submitter(config, submitter)
    }

    /// State with a caller-supplied submitter (tests use the scripted
    /// transport).
    pub fn with_submitter(config: AppConfig, submitter: Submitter) -> Self {
        Self {
            config: Arc::new(config),
            submitter,
            composer: Arc::new(BookletComposer::new()),
        }
    }
}
