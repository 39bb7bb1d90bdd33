// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local upload directory discipline.
//
// Each request owns a `JobFiles` that hands out unique paths inside the
// upload directory and deletes every one of them when the request finishes,
// however it finishes. Handlers return their response after the guard has
// dropped, so no file outlives the response.
//
// Dropping the guard also cancels its token. Blocking renders started
// through `render_blocking` check that token when they finish and delete
// their own output, so a client that disconnects mid-compose leaves nothing
// behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use axum::extract::multipart::Field;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use printdesk_core::error::Result as DomainResult;
use printdesk_core::integrity::Fingerprinter;
use printdesk_core::validation::SubmissionForm;

use crate::error::ApiError;

/// Temporary files belonging to one request.
#[derive(Debug)]
pub struct JobFiles {
    dir: PathBuf,
    id: Uuid,
    paths: Vec<PathBuf>,
    cancel: CancellationToken,
}

impl JobFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            id: Uuid::new_v4(),
            paths: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Token cancelled when the guard drops.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// A fresh path `<dir>/<request id><suffix>`, deleted with the guard.
    pub fn allocate(&mut self, suffix: &str) -> PathBuf {
        let path = self.dir.join(format!("{}{}", self.id, suffix));
        self.paths.push(path.clone());
        path
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Delete every allocated file that exists.
    pub fn remove_all(&mut self) {
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed temporary file"),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => warn!(path = %path.display(), %err, "could not remove temporary file"),
            }
        }
    }
}

impl Drop for JobFiles {
    fn drop(&mut self) {
        // Cancel first: a render that finishes after this point sees the
        // token and removes its own output.
        self.cancel.cancel();
        self.remove_all();
    }
}

/// Run `render` on the blocking pool, writing to `output`.
///
/// If the owning request is dropped while `render` runs, the file it
/// writes is deleted as soon as it returns.
pub async fn render_blocking<T, F>(
    files: &JobFiles,
    output: PathBuf,
    render: F,
) -> Result<T, ApiError>
where
    F: FnOnce(&Path) -> DomainResult<T> + Send + 'static,
    T: Send + 'static,
{
    let cancel = files.cancellation();
    let rendered = tokio::task::spawn_blocking(move || {
        let result = render(&output);
        if cancel.is_cancelled() {
            discard(&output);
        }
        result
    })
    .await??;
    Ok(rendered)
}

fn discard(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "discarded output of abandoned request"),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), %err, "could not remove abandoned output"),
    }
}

/// A file received from a multipart form and written to disk.
#[derive(Debug)]
pub struct StoredUpload {
    pub path: PathBuf,
    pub bytes: u64,
    pub fingerprint: String,
}

/// Fields of a print submission form.
#[derive(Debug, Default)]
pub struct SubmissionUpload {
    pub file: Option<StoredUpload>,
    pub form: SubmissionForm,
}

/// Read a submission form, streaming its `file` field into `files`.
///
/// Text fields are collected into a [`SubmissionForm`]; unknown fields are
/// ignored. A file larger than `max_bytes` is rejected with 413.
pub async fn read_submission(
    multipart: &mut Multipart,
    files: &mut JobFiles,
    max_bytes: usize,
) -> Result<SubmissionUpload, ApiError> {
    let mut upload = SubmissionUpload::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" if upload.file.is_none() => {
                let path = files.allocate(".pdf");
                upload.file = Some(store_field(field, &path, max_bytes).await?);
            }
            "server" => upload.form.server = Some(field.text().await?),
            "username" => upload.form.username = Some(field.text().await?),
            "password" => upload.form.password = Some(field.text().await?),
            "enableBooklet" => upload.form.enable_booklet = Some(field.text().await?),
            "duplex" => upload.form.duplex = Some(field.text().await?),
            "copies" => upload.form.copies = Some(field.text().await?),
            "printer" => upload.form.printer = Some(field.text().await?),
            "pageRange" => upload.form.page_range = Some(field.text().await?),
            "paperSize" => upload.form.paper_size = Some(field.text().await?),
            "orientation" => upload.form.orientation = Some(field.text().await?),
            "pagesPerSheet" => upload.form.pages_per_sheet = Some(field.text().await?),
            _ => debug!(field = %name, "ignoring form field"),
        }
    }

    Ok(upload)
}

/// Read just the `file` field into memory.
pub async fn read_file_bytes(
    multipart: &mut Multipart,
    max_bytes: usize,
) -> Result<Option<Vec<u8>>, ApiError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            if data.len() + chunk.len() > max_bytes {
                return Err(ApiError::too_large(max_bytes));
            }
            data.extend_from_slice(&chunk);
        }
        return Ok(Some(data));
    }
    Ok(None)
}

async fn store_field(
    mut field: Field<'_>,
    path: &Path,
    max_bytes: usize,
) -> Result<StoredUpload, ApiError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut fingerprint = Fingerprinter::new();
    let mut written: u64 = 0;

    while let Some(chunk) = field.chunk().await? {
        written += chunk.len() as u64;
        if written > max_bytes as u64 {
            return Err(ApiError::too_large(max_bytes));
        }
        fingerprint.update(&chunk);
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(StoredUpload {
        path: path.to_path_buf(),
        bytes: written,
        fingerprint: fingerprint.finish_short(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn allocated_paths_are_unique_and_removed_on_drop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (a, b) = {
            let mut files = JobFiles::new(dir.path());
            let a = files.allocate(".pdf");
            let b = files.allocate("_booklet.pdf");
            assert_ne!(a, b);
            std::fs::write(&a, b"x").expect("write a");
            std::fs::write(&b, b"y").expect("write b");
            (a, b)
        };
        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn missing_files_are_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut files = JobFiles::new(dir.path());
        files.allocate(".pdf");
        files.remove_all();
        assert!(files.paths().is_empty());
    }

    #[test]
    fn separate_requests_never_share_paths() {
        let mut first = JobFiles::new("uploads");
        let mut second = JobFiles::new("uploads");
        assert_ne!(first.allocate(".pdf"), second.allocate(".pdf"));
    }

    #[test]
    fn dropping_the_guard_cancels_its_token() {
        let files = JobFiles::new("uploads");
        let token = files.cancellation();
        assert!(!token.is_cancelled());
        drop(files);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn render_output_is_kept_while_the_request_lives() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut files = JobFiles::new(dir.path());
        let output = files.allocate("_booklet.pdf");

        let len = render_blocking(&files, output.clone(), |path| {
            std::fs::write(path, b"%PDF-1.7")?;
            Ok(8)
        })
        .await
        .expect("render");
        assert_eq!(len, 8);
        assert!(output.exists());

        drop(files);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn render_finishing_after_the_request_is_gone_removes_its_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut files = JobFiles::new(dir.path());
        let output = files.allocate("_booklet.pdf");

        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let (written_tx, written_rx) = std::sync::mpsc::channel::<()>();
        let render = render_blocking(&files, output.clone(), move |path| {
            let _ = release_rx.recv();
            std::fs::write(path, b"%PDF-1.7")?;
            let _ = written_tx.send(());
            Ok(())
        });

        // The client goes away while the render is still blocked.
        let abandoned = tokio::time::timeout(Duration::from_millis(50), render).await;
        assert!(abandoned.is_err());
        drop(files);

        release_tx.send(()).expect("release render");
        tokio::task::spawn_blocking(move || written_rx.recv_timeout(Duration::from_secs(5)))
            .await
            .expect("join")
            .expect("render wrote its output");

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while output.exists() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!output.exists());
        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }
}
