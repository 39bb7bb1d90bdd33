// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Remote command construction.
//
// The remote exec channel carries a single command line, interpreted by the
// remote user's shell. Commands are therefore built as argument vectors and
// every token is quoted here, in one place, when the line is rendered.
// Nothing else in the crate formats untrusted values into shell text.

use std::borrow::Cow;
use std::fmt;

use printdesk_core::types::{PrinterOptions, SubmissionId};

/// `lpr` option for two-sided printing bound on the long edge.
pub const DUPLEX_OPTION: &str = "sides=two-sided-long-edge";

/// Prefix of every file this service uploads. The stale-file sweep only
/// ever matches this prefix.
pub const REMOTE_FILE_PREFIX: &str = "printdesk-";

/// Quote one token for a POSIX shell.
///
/// Tokens made only of characters no shell treats specially are returned
/// as-is; everything else is wrapped in single quotes, with embedded single
/// quotes written as `'\''`.
pub fn shell_quote(token: &str) -> Cow<'_, str> {
    let safe = !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"_@%+=:,./-".contains(&b));
    if safe {
        Cow::Borrowed(token)
    } else {
        Cow::Owned(format!("'{}'", token.replace('\'', r"'\''")))
    }
}

/// A program and its arguments, kept as discrete tokens until rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    argv: Vec<String>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            argv: vec![program.into()],
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.argv.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// The quoted command line.
    pub fn render(&self) -> String {
        self.argv
            .iter()
            .map(|token| shell_quote(token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Remote path for a submission's upload: `<dir>/printdesk-<id>.pdf`.
pub fn remote_path_for(dir: &str, id: SubmissionId) -> String {
    let dir = dir.trim_end_matches('/');
    let dir = if dir.is_empty() { "/" } else { dir };
    if dir == "/" {
        format!("/{REMOTE_FILE_PREFIX}{id}.pdf")
    } else {
        format!("{dir}/{REMOTE_FILE_PREFIX}{id}.pdf")
    }
}

/// `<program> [-P queue] [-o sides=two-sided-long-edge] [-# copies]
/// [-o portrait|landscape] [-o media=<size>] [-o page-ranges=<pages>] <path>`
///
/// The copy flag is only present for more than one copy; the remaining
/// options only when set.
pub fn print_command(program: &str, options: &PrinterOptions, remote_path: &str) -> ShellCommand {
    let mut cmd = ShellCommand::new(program);
    if let Some(queue) = &options.queue {
        cmd = cmd.arg("-P").arg(queue.as_str());
    }
    if options.duplex {
        cmd = cmd.arg("-o").arg(DUPLEX_OPTION);
    }
    if options.copies > 1 {
        cmd = cmd.arg(format!("-#{}", options.copies));
    }
    if let Some(orientation) = options.orientation {
        cmd = cmd.arg("-o").arg(orientation.cups_option());
    }
    if let Some(paper) = options.paper_size {
        cmd = cmd.arg("-o").arg(format!("media={}", paper.media()));
    }
    if let Some(pages) = options.page_range.cups_value() {
        cmd = cmd.arg("-o").arg(format!("page-ranges={pages}"));
    }
    cmd.arg(remote_path)
}

/// `rm -f -- <path>`
pub fn remove_command(remote_path: &str) -> ShellCommand {
    ShellCommand::new("rm").args(["-f", "--", remote_path])
}

/// Delete this service's uploads in `dir` older than `minutes`.
pub fn sweep_command(dir: &str, minutes: u32) -> ShellCommand {
    let pattern = format!("{REMOTE_FILE_PREFIX}*.pdf");
    let age = format!("+{minutes}");
    ShellCommand::new("find").args([
        dir,
        "-maxdepth",
        "1",
        "-type",
        "f",
        "-name",
        pattern.as_str(),
        "-mmin",
        age.as_str(),
        "-delete",
    ])
}

/// `lpq [-P queue]`
pub fn queue_command(queue: Option<&str>) -> ShellCommand {
    let cmd = ShellCommand::new("lpq");
    match queue {
        Some(queue) => cmd.arg("-P").arg(queue),
        None => cmd,
    }
}

/// `echo ok`, used to prove a session can run commands.
pub fn check_command() -> ShellCommand {
    ShellCommand::new("echo").arg("ok")
}

/// The script executed for one submission.
///
/// Prints, records the print command's exit status, always removes the
/// uploaded file, then exits with the recorded status so the session's exit
/// code is the print command's and not the cleanup's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteScript {
    print: ShellCommand,
    cleanup: ShellCommand,
}

impl RemoteScript {
    pub fn new(print: ShellCommand, remote_path: &str) -> Self {
        Self {
            print,
            cleanup: remove_command(remote_path),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "{}; status=$?; {}; exit $status",
            self.print.render(),
            self.cleanup.render()
        )
    }
}

/// Job lines from `lpq` output.
///
/// Keeps the lines whose first field is an ordinal rank (`1st`, `2nd`,
/// `23rd`, ...). Header lines and the "no entries" message are dropped.
pub fn parse_queue_listing(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.split_whitespace().next().is_some_and(is_ordinal))
        .map(str::to_string)
        .collect()
}

fn is_ordinal(word: &str) -> bool {
    let digits = word.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let suffix = &word[digits.len()..];
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && matches!(suffix, "st" | "nd" | "rd" | "th")
}
