// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for remote print submission.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PrintdeskError, Result};

/// Unique identifier for one submission request.
///
/// Embedded in local and remote temp file names so concurrent submissions
/// never share a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of the two print servers a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerChoice {
    Stu,
    Stf,
}

impl std::str::FromStr for ServerChoice {
    type Err = PrintdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "stu" => Ok(Self::Stu),
            "stf" => Ok(Self::Stf),
            other => Err(PrintdeskError::InvalidInput(format!(
                "Invalid server selection '{other}' (expected 'stu' or 'stf')"
            ))),
        }
    }
}

/// How the remote session authenticates.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SshAuth {
    Password {
        password: String,
    },
    PrivateKey {
        key_path: PathBuf,
        passphrase: Option<String>,
    },
}

impl std::fmt::Debug for SshAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password { .. } => f.write_str("Password { password: <redacted> }"),
            Self::PrivateKey { key_path, passphrase } => f
                .debug_struct("PrivateKey")
                .field("key_path", key_path)
                .field("passphrase", &passphrase.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Everything needed to open a remote session. Opaque to the pipeline
/// beyond being handed to the transport.
#[derive(Clone, Serialize, Deserialize)]
pub struct PrintCredential {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: SshAuth,
}

impl PrintCredential {
    pub fn with_password(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            auth: SshAuth::Password {
                password: password.into(),
            },
        }
    }

    /// `user@host:port`, safe to log.
    pub fn target(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.port)
    }
}

impl std::fmt::Debug for PrintCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrintCredential")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("auth", &self.auth)
            .finish()
    }
}

/// Which pages of the document the printer should print.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PageRange {
    #[default]
    All,
    /// Inclusive, 1-based.
    Range { start: u32, end: u32 },
    /// Individual 1-based pages, in the order given.
    Selection { pages: Vec<u32> },
}

impl PageRange {
    /// Value for the CUPS `page-ranges` option, `None` for the whole document.
    pub fn cups_value(&self) -> Option<String> {
        match self {
            Self::All => None,
            Self::Range { start, end } => Some(format!("{start}-{end}")),
            Self::Selection { pages } => Some(
                pages
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        }
    }
}

impl std::str::FromStr for PageRange {
    type Err = PrintdeskError;

    /// Accepts `all` (or nothing), `start-end`, or a comma-separated list of
    /// page numbers.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }

        let invalid = || {
            PrintdeskError::InvalidInput(format!(
                "Invalid page range '{s}' (expected e.g. 2-5 or 1,3,7)"
            ))
        };
        let page = |p: &str| p.trim().parse::<u32>().ok().filter(|n| *n >= 1);

        match s.split_once('-') {
            Some((start, end)) => {
                let start = page(start).ok_or_else(invalid)?;
                let end = page(end).ok_or_else(invalid)?;
                if end < start {
                    return Err(invalid());
                }
                Ok(Self::Range { start, end })
            }
            None => {
                let pages = s
                    .split(',')
                    .map(|p| page(p).ok_or_else(invalid))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::Selection { pages })
            }
        }
    }
}

/// Paper the printer should use, passed as `-o media=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    Letter,
    Legal,
}

impl PaperSize {
    /// CUPS media name.
    pub fn media(self) -> &'static str {
        match self {
            Self::A4 => "A4",
            Self::A3 => "A3",
            Self::Letter => "Letter",
            Self::Legal => "Legal",
        }
    }
}

impl std::str::FromStr for PaperSize {
    type Err = PrintdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "a3" => Ok(Self::A3),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            _ => Err(PrintdeskError::InvalidInput(format!(
                "Invalid paper size '{s}' (expected A4, A3, Letter or Legal)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// The bare CUPS option (`portrait` / `landscape`).
    pub fn cups_option(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

impl std::str::FromStr for Orientation {
    type Err = PrintdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" => Ok(Self::Portrait),
            "landscape" => Ok(Self::Landscape),
            _ => Err(PrintdeskError::InvalidInput(format!(
                "Invalid orientation '{s}' (expected portrait or landscape)"
            ))),
        }
    }
}

/// Columns and rows of source pages drawn on each side of an n-up sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NUpGrid {
    pub columns: u32,
    pub rows: u32,
}

impl NUpGrid {
    /// Supported pages-per-sheet values.
    pub const CHOICES: [u32; 4] = [2, 4, 6, 9];

    /// Grid for `pages_per_sheet`: 2 is 2x1, 4 is 2x2, 6 is 3x2, 9 is 3x3.
    pub fn for_pages_per_sheet(pages_per_sheet: u32) -> Option<Self> {
        let (columns, rows) = match pages_per_sheet {
            2 => (2, 1),
            4 => (2, 2),
            6 => (3, 2),
            9 => (3, 3),
            _ => return None,
        };
        Some(Self { columns, rows })
    }

    pub fn pages_per_sheet(self) -> u32 {
        self.columns * self.rows
    }

    /// Wider grids go on landscape sheets.
    pub fn is_landscape(self) -> bool {
        self.columns > self.rows
    }
}

/// How the uploaded document is arranged before printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageLayout {
    /// Printed as uploaded.
    #[default]
    AsIs,
    /// Imposed as a saddle-stitched booklet.
    Booklet,
    /// Several pages per sheet side.
    NUp(NUpGrid),
}

/// Options that become flags on the remote print command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterOptions {
    /// Two-sided, long-edge binding.
    pub duplex: bool,
    /// Always at least 1.
    pub copies: u32,
    /// Printer queue passed as `-P`, if any.
    pub queue: Option<String>,
    pub page_range: PageRange,
    pub paper_size: Option<PaperSize>,
    pub orientation: Option<Orientation>,
}

impl Default for PrinterOptions {
    fn default() -> Self {
        Self {
            duplex: false,
            copies: 1,
            queue: None,
            page_range: PageRange::All,
            paper_size: None,
            orientation: None,
        }
    }
}

/// Lifecycle of one remote submission session.
///
/// ```text
/// Disconnected -> Connecting -> Connected -> SftpOpen -> Uploading -> Uploaded
///   -> Executing -> (Succeeded | Failed) -> Closed
/// ```
///
/// Any state before `Succeeded` may fall through to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionState {
    Disconnected,
    Connecting,
    Connected,
    SftpOpen,
    Uploading,
    Uploaded,
    Executing,
    Succeeded,
    Failed,
    Closed,
}

impl SubmissionState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: SubmissionState) -> bool {
        use SubmissionState::*;
        match (self, next) {
            (Disconnected, Connecting) => true,
            (Connecting, Connected) => true,
            (Connected, SftpOpen) => true,
            (SftpOpen, Uploading) => true,
            (Uploading, Uploaded) => true,
            (Uploaded, Executing) => true,
            (Executing, Succeeded) => true,
            (Connecting | Connected | SftpOpen | Uploading | Uploaded | Executing, Failed) => {
                true
            }
            (Succeeded | Failed, Closed) => true,
            _ => false,
        }
    }
}

/// Outcome of a remote print command, captured after the session closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub id: SubmissionId,
    /// True when the print command itself exited 0.
    pub success: bool,
    /// Exit code of the print command (not of the cleanup that follows it).
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Where the document was uploaded to on the remote host.
    pub remote_path: String,
    /// Every state the session passed through, in order.
    pub transitions: Vec<SubmissionState>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SubmissionResult {
    /// Turn a failed print into a `RemoteCommand` error carrying stderr and
    /// the exit code; successful results pass through.
    pub fn into_result(self) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(PrintdeskError::RemoteCommand {
                exit_code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}
