// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transport capability used by the submitter.
//
// The submitter never opens sockets itself. A `Transport` produces an
// authenticated `RemoteSession`; the session uploads files and runs command
// lines. `SshTransport` is the production implementation and
// `stub::ScriptedTransport` stands in for it in tests.
//
// Both traits are blocking. The submitter drives a session from
// `tokio::task::spawn_blocking`.

use std::path::Path;
use std::time::Duration;

use printdesk_core::error::Result;
use printdesk_core::types::PrintCredential;

/// Captured result of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Opens authenticated sessions to a print host.
pub trait Transport: Send + Sync {
    /// Connect and authenticate. `timeout` bounds the TCP connect and every
    /// individual protocol operation on the returned session.
    ///
    /// Fails with `Connection`, `Timeout` or `Auth`.
    fn connect(
        &self,
        credential: &PrintCredential,
        timeout: Duration,
    ) -> Result<Box<dyn RemoteSession>>;
}

/// One live, authenticated session.
pub trait RemoteSession: Send {
    /// Open the file-transfer sub-channel. Fails with `Transfer`.
    fn open_file_transfer(&mut self) -> Result<()>;

    /// Copy `local` to `remote`, returning the number of bytes written.
    /// Requires [`open_file_transfer`](Self::open_file_transfer).
    fn upload(&mut self, local: &Path, remote: &str) -> Result<u64>;

    /// Run one command line and wait for it to exit.
    fn execute(&mut self, command: &str) -> Result<CommandOutput>;

    /// Tear the session down.
    fn close(&mut self) -> Result<()>;
}
