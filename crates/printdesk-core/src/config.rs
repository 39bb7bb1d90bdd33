// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::ServerChoice;

/// Upload cap enforced before handler logic runs (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Hostnames behind the two selectable print servers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerHosts {
    pub stu: String,
    pub stf: String,
}

impl Default for ServerHosts {
    fn default() -> Self {
        Self {
            stu: "stu.comp.nus.edu.sg".into(),
            stf: "stf.comp.nus.edu.sg".into(),
        }
    }
}

impl ServerHosts {
    /// Resolve a server selection to its hostname.
    pub fn host_for(&self, choice: ServerChoice) -> &str {
        match choice {
            ServerChoice::Stu => &self.stu,
            ServerChoice::Stf => &self.stf,
        }
    }
}

/// Server settings. Read once at start-up, never written back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind_address: String,
    /// Port for the HTTP server (default 3000).
    pub port: u16,
    /// Directory for transient uploads and intermediate booklet files.
    pub upload_dir: PathBuf,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
    /// Hostname mapping for the `server` form field.
    pub hosts: ServerHosts,
    /// SSH port on the print servers.
    pub ssh_port: u16,
    /// TCP connect timeout, also applied to each blocking SSH operation.
    pub connect_timeout_secs: u64,
    /// Upper bound on one whole remote session.
    pub submission_timeout_secs: u64,
    /// Remote directory that receives uploaded documents.
    pub remote_temp_dir: String,
    /// Remove our own remote temp files older than this many minutes after
    /// each session. `None` disables the sweep.
    pub stale_remote_minutes: Option<u32>,
    /// Remote print program.
    pub print_program: String,
    /// Queue passed as `-P` when a request does not name one.
    pub default_queue: Option<String>,
    /// Largest copy count a request may ask for.
    pub max_copies: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".into(),
            port: 3000,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            hosts: ServerHosts::default(),
            ssh_port: 22,
            connect_timeout_secs: 30,
            submission_timeout_secs: 300,
            remote_temp_dir: "/tmp".into(),
            stale_remote_minutes: Some(24 * 60),
            print_program: "lpr".into(),
            default_queue: None,
            max_copies: 100,
        }
    }
}

impl AppConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn submission_timeout(&self) -> Duration {
        Duration::from_secs(self.submission_timeout_secs)
    }

    /// `host:port` string the server listens on.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
