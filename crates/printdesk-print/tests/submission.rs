// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end submission through the public API, against the scripted
// transport.

use std::io::Write;
use std::sync::Arc;

use printdesk_core::config::AppConfig;
use printdesk_core::error::PrintdeskError;
use printdesk_core::types::{PrintCredential, PrinterOptions, SubmissionState};
use printdesk_core::validation::SubmissionForm;
use printdesk_print::command::shell_quote;
use printdesk_print::stub::{ScriptedTransport, StubFailure};
use printdesk_print::{CommandOutput, Submitter, SubmitterSettings};

fn pdf_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(b"%PDF-1.7\n%%EOF\n").expect("write");
    file
}

#[tokio::test]
async fn validated_form_submits_with_quoted_tokens() {
    let config = AppConfig {
        default_queue: Some("psts".into()),
        stale_remote_minutes: None,
        ..AppConfig::default()
    };
    let form = SubmissionForm {
        server: Some("stf".into()),
        username: Some("alice_01".into()),
        password: Some("secret-pass".into()),
        enable_booklet: Some("false".into()),
        duplex: Some("true".into()),
        copies: Some("1; rm -rf /".into()),
        ..SubmissionForm::default()
    };
    let submission = form
        .validate(config.default_queue.as_deref(), config.max_copies)
        .expect("valid form");
    // Malformed copies fall back to a single copy.
    assert_eq!(submission.options.copies, 1);

    let transport = ScriptedTransport::new();
    let submitter = Submitter::new(
        Arc::new(transport.clone()),
        SubmitterSettings::from_config(&config),
    );
    let credential = PrintCredential::with_password(
        config.hosts.host_for(submission.server),
        config.ssh_port,
        submission.username.clone(),
        submission.password.clone(),
    );

    let file = pdf_file();
    let result = submitter
        .submit(credential, file.path(), submission.options)
        .await
        .expect("submit")
        .into_result()
        .expect("print succeeded");

    let log = transport.log();
    assert_eq!(log.targets, vec!["alice_01@stf.comp.nus.edu.sg:22".to_string()]);
    assert_eq!(log.commands.len(), 1);
    let script = &log.commands[0];
    assert!(!script.contains("rm -rf"));
    assert!(script.starts_with("lpr -P psts -o sides=two-sided-long-edge /tmp/printdesk-"));
    assert!(script.contains(&format!("rm -f -- {}", result.remote_path)));
    assert_eq!(result.transitions.last(), Some(&SubmissionState::Closed));
}

#[tokio::test]
async fn failed_print_carries_stderr() {
    let transport = ScriptedTransport::new().respond(CommandOutput {
        stdout: String::new(),
        stderr: "lpr: Error - no default destination available.\n".into(),
        exit_code: 1,
    });
    let submitter = Submitter::new(Arc::new(transport), SubmitterSettings::default());
    let file = pdf_file();

    let err = submitter
        .submit(
            PrintCredential::with_password("stu.example", 22, "bob", "secret-pass"),
            file.path(),
            PrinterOptions::default(),
        )
        .await
        .expect("session completed")
        .into_result()
        .expect_err("print failed");
    assert_eq!(
        err.to_string(),
        "Print command failed (exit code 1): lpr: Error - no default destination available."
    );
}

#[tokio::test]
async fn unreachable_host_is_a_connection_error() {
    let transport = ScriptedTransport::new().fail_connect(StubFailure::Connection);
    let submitter = Submitter::new(Arc::new(transport), SubmitterSettings::default());
    let file = pdf_file();

    let err = submitter
        .submit(
            PrintCredential::with_password("stu.example", 22, "bob", "secret-pass"),
            file.path(),
            PrinterOptions::default(),
        )
        .await
        .expect_err("connect fails");
    assert!(err.is_retriable());
}

#[tokio::test]
async fn connect_timeout_is_retriable_and_runs_nothing() {
    let transport = ScriptedTransport::new().fail_connect(StubFailure::Timeout);
    let submitter = Submitter::new(Arc::new(transport.clone()), SubmitterSettings::default());
    let file = pdf_file();

    let err = submitter
        .submit(
            PrintCredential::with_password("stu.example", 22, "bob", "secret-pass"),
            file.path(),
            PrinterOptions::default(),
        )
        .await
        .expect_err("connect times out");
    assert!(matches!(err, PrintdeskError::Timeout(_)));
    assert!(err.is_retriable());

    let log = transport.log();
    assert_eq!(log.connects, 1);
    assert!(log.uploads.is_empty());
    assert!(log.commands.is_empty());
    assert_eq!(log.closes, 0);
}

#[test]
fn quoting_neutralises_shell_syntax() {
    for hostile in ["1; rm -rf /", "$(reboot)", "`id`", "a && b", "x|y", "q'uote"] {
        let quoted = shell_quote(hostile);
        assert!(quoted.starts_with('\'') && quoted.ends_with('\''), "{hostile}");
    }
}
