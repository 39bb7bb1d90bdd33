// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON request and response bodies.

use serde::{Deserialize, Serialize};

use printdesk_core::config::AppConfig;
use printdesk_core::error::Result;
use printdesk_core::types::{PrintCredential, ServerChoice};
use printdesk_core::validation::{validate_password, validate_queue_name, validate_username};
use printdesk_document::BookletLayout;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// One sheet in the layout preview: `front` and `back` are `[left, right]`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SheetView {
    pub sheet: u32,
    pub front: [u32; 2],
    pub back: [u32; 2],
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResponse {
    pub layout: Vec<SheetView>,
    pub total_pages: u32,
    pub total_pages_needed: u32,
    pub blank_pages: u32,
    pub sheets_needed: u32,
}

impl From<&BookletLayout> for LayoutResponse {
    fn from(layout: &BookletLayout) -> Self {
        Self {
            layout: layout
                .sheets
                .iter()
                .map(|s| SheetView {
                    sheet: s.sheet_number,
                    front: [s.front.left, s.front.right],
                    back: [s.back.left, s.back.right],
                })
                .collect(),
            total_pages: layout.page_count,
            total_pages_needed: layout.total_pages_needed,
            blank_pages: layout.blank_pages,
            sheets_needed: layout.sheets_needed,
        }
    }
}

/// Body of `/api/test-connection` and `/api/queue-status`.
#[derive(Deserialize)]
pub struct ConnectionRequest {
    pub server: String,
    pub username: String,
    pub password: String,
    /// Only used by the queue listing.
    #[serde(default)]
    pub printer: Option<String>,
}

impl ConnectionRequest {
    /// Validate the request and build the credential for the selected host.
    pub fn credential(&self, config: &AppConfig) -> Result<PrintCredential> {
        let server: ServerChoice = self.server.parse()?;
        validate_username(&self.username)?;
        validate_password(&self.password)?;
        Ok(PrintCredential::with_password(
            config.hosts.host_for(server),
            config.ssh_port,
            self.username.clone(),
            self.password.clone(),
        ))
    }

    /// Requested queue, else the configured default.
    pub fn queue<'a>(&'a self, config: &'a AppConfig) -> Result<Option<&'a str>> {
        match self.printer.as_deref().filter(|p| !p.is_empty()) {
            Some(name) => {
                validate_queue_name(name)?;
                Ok(Some(name))
            }
            None => Ok(config.default_queue.as_deref()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueueResponse {
    pub jobs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use printdesk_document::compute_layout;

    #[test]
    fn layout_serialises_with_camel_case_keys() {
        let layout = compute_layout(5).expect("layout");
        let json = serde_json::to_value(LayoutResponse::from(&layout)).expect("json");
        assert_eq!(
            json,
            serde_json::json!({
                "layout": [
                    { "sheet": 1, "front": [8, 1], "back": [2, 7] },
                    { "sheet": 2, "front": [6, 3], "back": [4, 5] }
                ],
                "totalPages": 5,
                "totalPagesNeeded": 8,
                "blankPages": 3,
                "sheetsNeeded": 2
            })
        );
    }

    #[test]
    fn connection_request_validates_before_building_credential() {
        let config = AppConfig::default();
        let request = ConnectionRequest {
            server: "stu".into(),
            username: "alice".into(),
            password: "secret-pass".into(),
            printer: Some("psts".into()),
        };
        let credential = request.credential(&config).expect("valid");
        assert_eq!(credential.target(), "alice@stu.comp.nus.edu.sg:22");
        assert_eq!(request.queue(&config).expect("queue"), Some("psts"));

        let bad = ConnectionRequest {
            username: "a b".into(),
            ..request
        };
        assert!(bad.credential(&config).is_err());
    }
}
