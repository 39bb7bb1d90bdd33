// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// printdesk-print: remote print submission over SSH.
//
// `command` builds every remote command line from argument vectors,
// `transport` defines the session capability, `ssh` implements it with
// libssh2, and `submitter` drives one session per submission through its
// state machine.

pub mod command;
pub mod ssh;
pub mod stub;
pub mod submitter;
pub mod transport;

pub use ssh::SshTransport;
pub use submitter::{Submitter, SubmitterSettings};
pub use transport::{CommandOutput, RemoteSession, Transport};
pub use tokio_util::sync::CancellationToken;
