// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SSH/SFTP transport built on libssh2 (the `ssh2` crate).

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::{Duration, Instant};

use ssh2::{Channel, Session, Sftp};
use tracing::{debug, info};

use printdesk_core::error::{PrintdeskError, Result};
use printdesk_core::types::{PrintCredential, SshAuth};

use crate::transport::{CommandOutput, RemoteSession, Transport};

/// Production transport: one TCP connection and SSH session per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct SshTransport;

impl Transport for SshTransport {
    fn connect(
        &self,
        credential: &PrintCredential,
        timeout: Duration,
    ) -> Result<Box<dyn RemoteSession>> {
        let target = credential.target();
        let addr = format!("{}:{}", credential.host, credential.port);
        let socket_addr = addr
            .to_socket_addrs()
            .map_err(|e| {
                PrintdeskError::Connection(format!(
                    "cannot resolve {}: {}",
                    credential.host, e
                ))
            })?
            .next()
            .ok_or_else(|| {
                PrintdeskError::Connection(format!("no address found for {}", credential.host))
            })?;

        debug!(target = %target, addr = %socket_addr, "opening TCP connection");
        let tcp = TcpStream::connect_timeout(&socket_addr, timeout).map_err(|e| {
            if e.kind() == ErrorKind::TimedOut {
                PrintdeskError::Timeout(format!(
                    "connecting to {} took longer than {}s",
                    addr,
                    timeout.as_secs()
                ))
            } else {
                PrintdeskError::Connection(format!("connect to {}: {}", addr, e))
            }
        })?;
        tcp.set_read_timeout(Some(timeout))?;
        tcp.set_write_timeout(Some(timeout))?;

        let mut session = Session::new()
            .map_err(|e| PrintdeskError::Connection(format!("SSH session: {e}")))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
        session
            .handshake()
            .map_err(|e| PrintdeskError::Connection(format!("SSH handshake with {addr}: {e}")))?;

        match &credential.auth {
            SshAuth::Password { password } => session
                .userauth_password(&credential.username, password)
                .map_err(|e| PrintdeskError::Auth(format!("{target}: {e}")))?,
            SshAuth::PrivateKey {
                key_path,
                passphrase,
            } => session
                .userauth_pubkey_file(
                    &credential.username,
                    None,
                    key_path,
                    passphrase.as_deref(),
                )
                .map_err(|e| PrintdeskError::Auth(format!("{target}: {e}")))?,
        }

        if !session.authenticated() {
            return Err(PrintdeskError::Auth(format!(
                "{target}: server did not accept the credentials"
            )));
        }

        info!(target = %target, "SSH session established");
        Ok(Box::new(SshSession {
            session,
            sftp: None,
            timeout,
        }))
    }
}

/// Pause between polls when neither output stream has data.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

struct SshSession {
    session: Session,
    sftp: Option<Sftp>,
    /// Longest stretch a running command may go without producing output.
    timeout: Duration,
}

impl RemoteSession for SshSession {
    fn open_file_transfer(&mut self) -> Result<()> {
        let sftp = self
            .session
            .sftp()
            .map_err(|e| PrintdeskError::Transfer(format!("open SFTP channel: {e}")))?;
        self.sftp = Some(sftp);
        Ok(())
    }

    fn upload(&mut self, local: &Path, remote: &str) -> Result<u64> {
        let sftp = self.sftp.as_ref().ok_or_else(|| {
            PrintdeskError::Transfer("SFTP channel is not open".into())
        })?;

        let local_file = File::open(local)?;
        let mut remote_file = sftp
            .create(Path::new(remote))
            .map_err(|e| PrintdeskError::Transfer(format!("create {remote}: {e}")))?;

        let written = std::io::copy(&mut BufReader::new(local_file), &mut remote_file)
            .map_err(|e| PrintdeskError::Transfer(format!("write {remote}: {e}")))?;
        debug!(remote, bytes = written, "upload complete");
        Ok(written)
    }

    fn execute(&mut self, command: &str) -> Result<CommandOutput> {
        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| PrintdeskError::Connection(format!("open exec channel: {e}")))?;
        channel
            .exec(command)
            .map_err(|e| PrintdeskError::Connection(format!("exec: {e}")))?;

        self.session.set_blocking(false);
        let drained = drain_output(&mut channel, self.timeout);
        self.session.set_blocking(true);
        let (stdout, stderr) = drained?;

        channel
            .wait_close()
            .map_err(|e| PrintdeskError::Connection(format!("wait for exit: {e}")))?;
        let exit_code = channel
            .exit_status()
            .map_err(|e| PrintdeskError::Connection(format!("read exit status: {e}")))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code,
        })
    }

    fn close(&mut self) -> Result<()> {
        self.sftp = None;
        self.session
            .disconnect(None, "printdesk session complete", None)
            .map_err(|e| PrintdeskError::Connection(format!("disconnect: {e}")))
    }
}

/// The two output streams of a running remote command.
trait CommandStreams {
    fn read_stdout(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
    fn read_stderr(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
    /// The remote side has closed both streams.
    fn eof(&self) -> bool;
}

impl CommandStreams for Channel {
    fn read_stdout(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.read(buf)
    }

    fn read_stderr(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stderr().read(buf)
    }

    fn eof(&self) -> bool {
        Channel::eof(self)
    }
}

/// Read stdout and stderr in alternation until the remote side closes both.
///
/// The session must be non-blocking. Reading one stream to the end first
/// would stall a command that fills the other stream's window.
fn drain_output(
    streams: &mut impl CommandStreams,
    idle_timeout: Duration,
) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut buf = [0u8; 16 * 1024];
    let mut last_progress = Instant::now();

    loop {
        let out = read_available(streams.read_stdout(&mut buf), &buf, &mut stdout)?;
        let err = read_available(streams.read_stderr(&mut buf), &buf, &mut stderr)?;

        if out > 0 || err > 0 {
            last_progress = Instant::now();
            continue;
        }
        if streams.eof() {
            return Ok((stdout, stderr));
        }
        if last_progress.elapsed() > idle_timeout {
            return Err(PrintdeskError::Timeout(format!(
                "remote command produced no output for {}s",
                idle_timeout.as_secs()
            )));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Append the bytes of a non-blocking `read` to `sink`. Returns the count.
fn read_available(
    read: std::io::Result<usize>,
    buf: &[u8],
    sink: &mut Vec<u8>,
) -> Result<usize> {
    match read {
        Ok(n) => {
            sink.extend_from_slice(&buf[..n]);
            Ok(n)
        }
        Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
        Err(e) => Err(PrintdeskError::Connection(format!("read command output: {e}"))),
    }
}
