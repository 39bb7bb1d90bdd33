// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Printdesk.

use thiserror::Error;

/// Top-level error type for all Printdesk operations.
#[derive(Debug, Error)]
pub enum PrintdeskError {
    // -- Request errors --
    #[error("{0}")]
    InvalidInput(String),

    // -- Document errors --
    #[error("Error processing PDF: {0}")]
    DocumentLoad(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Remote session errors --
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("file transfer failed: {0}")]
    Transfer(String),

    #[error("Print command failed (exit code {exit_code}): {stderr}")]
    RemoteCommand { exit_code: i32, stderr: String },

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("submission cancelled")]
    Cancelled,

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PrintdeskError {
    /// Whether repeating the same operation could plausibly succeed.
    ///
    /// Nothing in Printdesk retries on its own; callers use this to decide
    /// whether offering "try again" makes sense.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout(_) => true,
            Self::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::Interrupted
            ),
            Self::InvalidInput(_)
            | Self::DocumentLoad(_)
            | Self::PdfError(_)
            | Self::Auth(_)
            | Self::Transfer(_)
            | Self::RemoteCommand { .. }
            | Self::Cancelled
            | Self::Config(_)
            | Self::Serialization(_) => false,
        }
    }

    /// Whether the error was caused by the caller's input rather than by
    /// the document, the remote host or this process.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrintdeskError>;
