// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted transport for tests and offline development.
//
// Never touches the network. Each call is recorded in a shared log, and
// failures or command outputs are scripted up front. Clones share the same
// script and log, so a test can keep one handle and give another to the
// submitter.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use printdesk_core::error::{PrintdeskError, Result};
use printdesk_core::types::PrintCredential;

use crate::transport::{CommandOutput, RemoteSession, Transport};

/// Which error `connect` should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubFailure {
    Connection,
    Auth,
    Timeout,
}

/// Everything the stub saw.
#[derive(Debug, Clone, Default)]
pub struct StubLog {
    /// `user@host:port` of each connect attempt.
    pub targets: Vec<String>,
    pub connects: usize,
    /// (remote path, bytes) per successful upload.
    pub uploads: Vec<(String, u64)>,
    /// Every command line executed, in order.
    pub commands: Vec<String>,
    pub closes: usize,
}

#[derive(Debug, Default)]
struct Script {
    connect_failure: Option<StubFailure>,
    fail_file_transfer: bool,
    fail_upload: bool,
    upload_delay: Option<Duration>,
    responses: VecDeque<CommandOutput>,
    log: StubLog,
}

/// In-memory [`Transport`].
///
/// Commands without a scripted response succeed with empty output.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_connect(self, failure: StubFailure) -> Self {
        self.lock().connect_failure = Some(failure);
        self
    }

    pub fn fail_file_transfer(self) -> Self {
        self.lock().fail_file_transfer = true;
        self
    }

    /// Fail the upload after creating the remote file.
    pub fn fail_upload(self) -> Self {
        self.lock().fail_upload = true;
        self
    }

    /// Make every upload block for `delay` first.
    pub fn with_upload_delay(self, delay: Duration) -> Self {
        self.lock().upload_delay = Some(delay);
        self
    }

    /// Queue the output of the next unscripted command.
    pub fn respond(self, output: CommandOutput) -> Self {
        self.lock().responses.push_back(output);
        self
    }

    /// Snapshot of the calls made so far.
    pub fn log(&self) -> StubLog {
        self.lock().log.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        // A panic while holding the lock only happens inside a failing test.
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Transport for ScriptedTransport {
    fn connect(
        &self,
        credential: &PrintCredential,
        _timeout: Duration,
    ) -> Result<Box<dyn RemoteSession>> {
        let mut script = self.lock();
        script.log.connects += 1;
        script.log.targets.push(credential.target());

        match script.connect_failure {
            Some(StubFailure::Connection) => Err(PrintdeskError::Connection(format!(
                "connect to {}:{}: connection refused",
                credential.host, credential.port
            ))),
            Some(StubFailure::Auth) => Err(PrintdeskError::Auth(format!(
                "{}: authentication failed",
                credential.target()
            ))),
            Some(StubFailure::Timeout) => Err(PrintdeskError::Timeout(format!(
                "connecting to {} timed out",
                credential.host
            ))),
            None => Ok(Box::new(ScriptedSession {
                transport: self.clone(),
                sftp_open: false,
            })),
        }
    }
}

struct ScriptedSession {
    transport: ScriptedTransport,
    sftp_open: bool,
}

impl RemoteSession for ScriptedSession {
    fn open_file_transfer(&mut self) -> Result<()> {
        if self.transport.lock().fail_file_transfer {
            return Err(PrintdeskError::Transfer(
                "open SFTP channel: subsystem request failed".into(),
            ));
        }
        self.sftp_open = true;
        Ok(())
    }

    fn upload(&mut self, local: &Path, remote: &str) -> Result<u64> {
        if !self.sftp_open {
            return Err(PrintdeskError::Transfer("SFTP channel is not open".into()));
        }

        let delay = self.transport.lock().upload_delay;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let bytes = std::fs::metadata(local)?.len();
        let mut script = self.transport.lock();
        if script.fail_upload {
            return Err(PrintdeskError::Transfer(format!(
                "write {remote}: connection reset"
            )));
        }
        script.log.uploads.push((remote.to_string(), bytes));
        Ok(bytes)
    }

    fn execute(&mut self, command: &str) -> Result<CommandOutput> {
        let mut script = self.transport.lock();
        script.log.commands.push(command.to_string());
        Ok(script.responses.pop_front().unwrap_or_default())
    }

    fn close(&mut self) -> Result<()> {
        self.transport.lock().log.closes += 1;
        Ok(())
    }
}
