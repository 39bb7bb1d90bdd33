// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// printdesk-core: core types, error definitions, configuration and request
// validation shared across all crates.

pub mod config;
pub mod error;
pub mod integrity;
pub mod types;
pub mod validation;

pub use config::AppConfig;
pub use error::PrintdeskError;
pub use types::*;
