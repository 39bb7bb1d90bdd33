// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Remote print submitter.
//
// One submission is one fresh session:
//
//   connect -> open SFTP -> upload -> run print script -> close
//
// The lifecycle is recorded as `SubmissionState` transitions. Every path ends
// in `Closed`, including failures and cancellation. The blocking session runs
// on tokio's blocking pool, bounded by the submission timeout.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use printdesk_core::config::AppConfig;
use printdesk_core::error::{PrintdeskError, Result};
use printdesk_core::types::{
    PrintCredential, PrinterOptions, SubmissionId, SubmissionResult, SubmissionState,
};

use crate::command::{
    RemoteScript, check_command, parse_queue_listing, print_command, queue_command,
    remote_path_for, remove_command, sweep_command,
};
use crate::ssh::SshTransport;
use crate::transport::{CommandOutput, RemoteSession, Transport};

/// Submitter settings, usually derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct SubmitterSettings {
    pub print_program: String,
    pub remote_temp_dir: String,
    pub stale_remote_minutes: Option<u32>,
    pub connect_timeout: Duration,
    pub submission_timeout: Duration,
}

impl SubmitterSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            print_program: config.print_program.clone(),
            remote_temp_dir: config.remote_temp_dir.clone(),
            stale_remote_minutes: config.stale_remote_minutes,
            connect_timeout: config.connect_timeout(),
            submission_timeout: config.submission_timeout(),
        }
    }
}

impl Default for SubmitterSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Uploads documents to a print host and runs the print command there.
#[derive(Clone)]
pub struct Submitter {
    transport: Arc<dyn Transport>,
    settings: SubmitterSettings,
}

impl std::fmt::Debug for Submitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submitter")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Submitter {
    pub fn new(transport: Arc<dyn Transport>, settings: SubmitterSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Submitter over real SSH connections.
    pub fn ssh(config: &AppConfig) -> Self {
        Self::new(Arc::new(SshTransport), SubmitterSettings::from_config(config))
    }

    pub fn settings(&self) -> &SubmitterSettings {
        &self.settings
    }

    /// Upload `local_path` and print it with `options`.
    ///
    /// Returns `Ok` once the print command has run, whatever its exit code;
    /// check [`SubmissionResult::success`] or call
    /// [`SubmissionResult::into_result`]. Session-level failures (connect,
    /// authentication, transfer, timeout) are returned as errors.
    pub async fn submit(
        &self,
        credential: PrintCredential,
        local_path: &Path,
        options: PrinterOptions,
    ) -> Result<SubmissionResult> {
        self.submit_with_cancel(credential, local_path, options, CancellationToken::new())
            .await
    }

    /// [`submit`](Self::submit) with caller-controlled cancellation.
    ///
    /// Dropping the returned future also cancels the session.
    #[instrument(skip_all, fields(target = %credential.target(), copies = options.copies, duplex = options.duplex))]
    pub async fn submit_with_cancel(
        &self,
        credential: PrintCredential,
        local_path: &Path,
        options: PrinterOptions,
        cancel: CancellationToken,
    ) -> Result<SubmissionResult> {
        let id = SubmissionId::new();
        let remote_path = remote_path_for(&self.settings.remote_temp_dir, id);
        let script = RemoteScript::new(
            print_command(&self.settings.print_program, &options, &remote_path),
            &remote_path,
        );
        let sweep = self
            .settings
            .stale_remote_minutes
            .map(|minutes| sweep_command(&self.settings.remote_temp_dir, minutes).render());

        info!(%id, remote_path = %remote_path, "submitting print job");
        let started_at = Utc::now();

        let job = SessionJob {
            transport: Arc::clone(&self.transport),
            credential,
            local_path: local_path.to_path_buf(),
            remote_path: remote_path.clone(),
            script: script.render(),
            sweep,
            connect_timeout: self.settings.connect_timeout,
        };

        let (transitions, outcome) = self.run_blocking(cancel, move |c| job.run(c)).await?;
        let output = outcome?;

        let result = SubmissionResult {
            id,
            success: output.success(),
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
            remote_path,
            transitions,
            started_at,
            finished_at: Utc::now(),
        };

        if result.success {
            info!(%id, "print command succeeded");
        } else {
            warn!(%id, exit_code = result.exit_code, stderr = %result.stderr.trim(), "print command failed");
        }
        Ok(result)
    }

    /// Open a session, run `echo ok`, close it. Returns the command output.
    #[instrument(skip_all, fields(target = %credential.target()))]
    pub async fn test_connection(&self, credential: PrintCredential) -> Result<String> {
        let output = self
            .run_command(credential, check_command().render())
            .await?;
        if !output.success() {
            return Err(PrintdeskError::RemoteCommand {
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout.trim().to_string())
    }

    /// Jobs currently waiting on `queue` (or the host's default queue).
    #[instrument(skip_all, fields(target = %credential.target(), queue = ?queue))]
    pub async fn queue_status(
        &self,
        credential: PrintCredential,
        queue: Option<&str>,
    ) -> Result<Vec<String>> {
        let output = self
            .run_command(credential, queue_command(queue).render())
            .await?;
        if !output.success() {
            return Err(PrintdeskError::RemoteCommand {
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        let jobs = parse_queue_listing(&output.stdout);
        debug!(jobs = jobs.len(), "queue listing parsed");
        Ok(jobs)
    }

    async fn run_command(
        &self,
        credential: PrintCredential,
        command: String,
    ) -> Result<CommandOutput> {
        let transport = Arc::clone(&self.transport);
        let connect_timeout = self.settings.connect_timeout;
        let (_, outcome) = self
            .run_blocking(CancellationToken::new(), move |cancel| {
                run_single_command(transport.as_ref(), &credential, &command, connect_timeout, cancel)
            })
            .await?;
        outcome
    }

    /// Run a blocking session on the blocking pool, bounded by the submission
    /// timeout. Timing out or dropping the future cancels `cancel`.
    async fn run_blocking<F>(
        &self,
        cancel: CancellationToken,
        session: F,
    ) -> Result<(Vec<SubmissionState>, Result<CommandOutput>)>
    where
        F: FnOnce(&CancellationToken) -> (Vec<SubmissionState>, Result<CommandOutput>)
            + Send
            + 'static,
    {
        let guard = cancel.clone().drop_guard();
        let handle = tokio::task::spawn_blocking({
            let cancel = cancel.clone();
            move || session(&cancel)
        });

        let timeout = self.settings.submission_timeout;
        let joined = match tokio::time::timeout(timeout, handle).await {
            Ok(joined) => joined,
            Err(_) => {
                // The guard cancels the session, which cleans up on its own.
                warn!(timeout_secs = timeout.as_secs(), "remote session timed out");
                return Err(PrintdeskError::Timeout(format!(
                    "remote session did not finish within {}s",
                    timeout.as_secs()
                )));
            }
        };
        guard.disarm();

        joined.map_err(|e| PrintdeskError::Io(std::io::Error::other(e)))
    }
}

// -- Blocking session ----------------------------------------------------------

/// Everything a blocking submission session needs, owned so it can move onto
/// the blocking pool.
struct SessionJob {
    transport: Arc<dyn Transport>,
    credential: PrintCredential,
    local_path: PathBuf,
    remote_path: String,
    script: String,
    sweep: Option<String>,
    connect_timeout: Duration,
}

/// Records state transitions, refusing illegal ones.
struct Lifecycle {
    state: SubmissionState,
    transitions: Vec<SubmissionState>,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            state: SubmissionState::Disconnected,
            transitions: vec![SubmissionState::Disconnected],
        }
    }

    fn advance(&mut self, next: SubmissionState) {
        if !self.state.can_advance_to(next) {
            warn!(from = ?self.state, to = ?next, "ignoring illegal session transition");
            return;
        }
        debug!(from = ?self.state, to = ?next, "session transition");
        self.state = next;
        self.transitions.push(next);
    }

    fn reached(&self, state: SubmissionState) -> bool {
        self.transitions.contains(&state)
    }

    fn finish(mut self, outcome: &Result<CommandOutput>) -> Vec<SubmissionState> {
        match outcome {
            Ok(output) if output.success() => self.advance(SubmissionState::Succeeded),
            _ => self.advance(SubmissionState::Failed),
        }
        self.advance(SubmissionState::Closed);
        self.transitions
    }
}

impl SessionJob {
    fn run(self, cancel: &CancellationToken) -> (Vec<SubmissionState>, Result<CommandOutput>) {
        let mut lifecycle = Lifecycle::new();
        let mut session: Option<Box<dyn RemoteSession>> = None;

        let outcome = self.drive(cancel, &mut lifecycle, &mut session);

        if let Some(mut session) = session {
            // An upload began but the script never completed: the remote file
            // may still be there.
            if outcome.is_err() && lifecycle.reached(SubmissionState::Uploading) {
                best_effort(&mut *session, &remove_command(&self.remote_path).render());
            }
            if let Some(sweep) = &self.sweep {
                if !cancel.is_cancelled() {
                    best_effort(&mut *session, sweep);
                }
            }
            if let Err(err) = session.close() {
                debug!(%err, "session close failed");
            }
        }

        (lifecycle.finish(&outcome), outcome)
    }

    fn drive(
        &self,
        cancel: &CancellationToken,
        lifecycle: &mut Lifecycle,
        slot: &mut Option<Box<dyn RemoteSession>>,
    ) -> Result<CommandOutput> {
        lifecycle.advance(SubmissionState::Connecting);
        ensure_live(cancel)?;
        let session = slot.insert(
            self.transport
                .connect(&self.credential, self.connect_timeout)?,
        );
        lifecycle.advance(SubmissionState::Connected);

        ensure_live(cancel)?;
        session.open_file_transfer()?;
        lifecycle.advance(SubmissionState::SftpOpen);

        ensure_live(cancel)?;
        lifecycle.advance(SubmissionState::Uploading);
        let bytes = session.upload(&self.local_path, &self.remote_path)?;
        lifecycle.advance(SubmissionState::Uploaded);
        debug!(bytes, remote_path = %self.remote_path, "document uploaded");

        ensure_live(cancel)?;
        lifecycle.advance(SubmissionState::Executing);
        session.execute(&self.script)
    }
}

/// Open a session, run one command, close it.
fn run_single_command(
    transport: &dyn Transport,
    credential: &PrintCredential,
    command: &str,
    connect_timeout: Duration,
    cancel: &CancellationToken,
) -> (Vec<SubmissionState>, Result<CommandOutput>) {
    let outcome = ensure_live(cancel).and_then(|()| {
        let mut session = transport.connect(credential, connect_timeout)?;
        let result = ensure_live(cancel).and_then(|()| session.execute(command));
        if let Err(err) = session.close() {
            debug!(%err, "session close failed");
        }
        result
    });
    (Vec::new(), outcome)
}

/// `Err(Cancelled)` once `cancel` has fired. Checked between session steps;
/// a protocol operation already in flight is never interrupted.
fn ensure_live(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(PrintdeskError::Cancelled)
    } else {
        Ok(())
    }
}

fn best_effort(session: &mut dyn RemoteSession, command: &str) {
    match session.execute(command) {
        Ok(output) if output.success() => debug!(command, "cleanup ran"),
        Ok(output) => debug!(command, exit_code = output.exit_code, "cleanup exited non-zero"),
        Err(err) => debug!(command, %err, "cleanup failed"),
    }
}
