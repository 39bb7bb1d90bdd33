// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Validation of the untrusted form fields that drive a print submission.
//
// Everything here runs before any file is processed or any connection is
// opened. Failures are `InvalidInput`, which the HTTP layer maps to 400.

use crate::error::{PrintdeskError, Result};
use crate::types::{
    NUpGrid, Orientation, PageLayout, PageRange, PaperSize, PrinterOptions, ServerChoice,
};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 100;
pub const QUEUE_NAME_MAX: usize = 32;

/// Raw submission fields as they arrive from the form.
#[derive(Debug, Default, Clone)]
pub struct SubmissionForm {
    pub server: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub enable_booklet: Option<String>,
    pub duplex: Option<String>,
    pub copies: Option<String>,
    pub printer: Option<String>,
    pub page_range: Option<String>,
    pub paper_size: Option<String>,
    pub orientation: Option<String>,
    pub pages_per_sheet: Option<String>,
}

/// Submission fields after validation.
#[derive(Clone)]
pub struct ValidatedSubmission {
    pub server: ServerChoice,
    pub username: String,
    pub password: String,
    pub layout: PageLayout,
    pub options: PrinterOptions,
}

impl std::fmt::Debug for ValidatedSubmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedSubmission")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("layout", &self.layout)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SubmissionForm {
    /// Check every field and produce typed values.
    ///
    /// `default_queue` is used when the form names no printer; `max_copies`
    /// bounds the copy count.
    pub fn validate(
        &self,
        default_queue: Option<&str>,
        max_copies: u32,
    ) -> Result<ValidatedSubmission> {
        let (server, username, password) = match (
            non_empty(&self.server),
            non_empty(&self.username),
            non_empty(&self.password),
        ) {
            (Some(s), Some(u), Some(p)) => (s, u, p),
            _ => {
                return Err(PrintdeskError::InvalidInput(
                    "Missing required fields".into(),
                ));
            }
        };

        let server: ServerChoice = server.parse()?;
        validate_username(username)?;
        validate_password(password)?;

        let copies = parse_copies(self.copies.as_deref());
        if copies > max_copies {
            return Err(PrintdeskError::InvalidInput(format!(
                "Too many copies requested ({copies}, maximum {max_copies})"
            )));
        }

        let queue = match non_empty(&self.printer) {
            Some(name) => {
                validate_queue_name(name)?;
                Some(name.to_string())
            }
            None => default_queue.map(str::to_string),
        };

        let nup = parse_pages_per_sheet(self.pages_per_sheet.as_deref())?;
        let layout = match (parse_flag(self.enable_booklet.as_deref()), nup) {
            (true, Some(_)) => {
                return Err(PrintdeskError::InvalidInput(
                    "Booklet and n-up layouts cannot be combined".into(),
                ));
            }
            (true, None) => PageLayout::Booklet,
            (false, Some(grid)) => PageLayout::NUp(grid),
            (false, None) => PageLayout::AsIs,
        };

        let page_range: PageRange = self.page_range.as_deref().unwrap_or_default().parse()?;
        if page_range != PageRange::All && layout != PageLayout::AsIs {
            return Err(PrintdeskError::InvalidInput(
                "Page ranges cannot be combined with booklet or n-up layouts".into(),
            ));
        }

        Ok(ValidatedSubmission {
            server,
            username: username.to_string(),
            password: password.to_string(),
            layout,
            options: PrinterOptions {
                duplex: parse_flag(self.duplex.as_deref()),
                copies,
                queue,
                page_range,
                paper_size: non_empty(&self.paper_size)
                    .map(str::parse::<PaperSize>)
                    .transpose()?,
                orientation: non_empty(&self.orientation)
                    .map(str::parse::<Orientation>)
                    .transpose()?,
            },
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// 3 to 20 characters, ASCII letters, digits and underscore only.
pub fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    let charset_ok = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) || !charset_ok {
        return Err(PrintdeskError::InvalidInput(format!(
            "Invalid username: must be {USERNAME_MIN}-{USERNAME_MAX} characters of letters, digits or underscore"
        )));
    }
    Ok(())
}

/// 6 to 100 characters, any content.
pub fn validate_password(password: &str) -> Result<()> {
    let len = password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        return Err(PrintdeskError::InvalidInput(format!(
            "Invalid password: must be {PASSWORD_MIN}-{PASSWORD_MAX} characters"
        )));
    }
    Ok(())
}

/// Printer queue names: 1 to 32 characters of ASCII letters, digits, `-`, `_`.
pub fn validate_queue_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name.len() <= QUEUE_NAME_MAX
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !ok {
        return Err(PrintdeskError::InvalidInput(format!(
            "Invalid printer queue name '{name}'"
        )));
    }
    Ok(())
}

/// Parse the copy count from the leading digits of the field (`"3abc"` is 3,
/// `"2.5"` is 2), falling back to 1 when there are none or they read as 0.
/// Malformed input is defaulted, never an error. Counts too large for a
/// `u32` saturate so the copy limit rejects them.
pub fn parse_copies(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else { return 1 };
    let raw = raw.trim_start();
    let raw = raw.strip_prefix('+').unwrap_or(raw);
    let digits = &raw[..raw.bytes().take_while(u8::is_ascii_digit).count()];
    if digits.is_empty() {
        return 1;
    }
    match digits.parse::<u32>() {
        Ok(0) => 1,
        Ok(n) => n,
        Err(_) => u32::MAX,
    }
}

/// `None` for a single page per sheet (or no value); the grid otherwise.
pub fn parse_pages_per_sheet(raw: Option<&str>) -> Result<Option<NUpGrid>> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() || raw == "1" {
        return Ok(None);
    }
    raw.parse::<u32>()
        .ok()
        .and_then(NUpGrid::for_pages_per_sheet)
        .map(Some)
        .ok_or_else(|| {
            PrintdeskError::InvalidInput(format!(
                "Unsupported pages per sheet '{raw}' (expected 1, 2, 4, 6 or 9)"
            ))
        })
}

/// Form booleans are the literal string `"true"`; anything else is false.
pub fn parse_flag(raw: Option<&str>) -> bool {
    raw == Some("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> SubmissionForm {
        SubmissionForm {
            server: Some("stu".into()),
            username: Some("e0123456".into()),
            password: Some("correct-horse".into()),
            enable_booklet: Some("true".into()),
            duplex: Some("true".into()),
            copies: Some("2".into()),
            printer: None,
            page_range: None,
            paper_size: None,
            orientation: None,
            pages_per_sheet: None,
        }
    }

    #[test]
    fn valid_form_produces_typed_submission() {
        let v = form().validate(None, 100).expect("valid");
        assert_eq!(v.server, ServerChoice::Stu);
        assert_eq!(v.layout, PageLayout::Booklet);
        assert!(v.options.duplex);
        assert_eq!(v.options.copies, 2);
        assert_eq!(v.options.queue, None);
    }

    #[test]
    fn short_username_is_rejected() {
        let mut f = form();
        f.username = Some("ab".into());
        assert!(matches!(f.validate(None, 100), Err(PrintdeskError::InvalidInput(_))));
    }

    #[test]
    fn username_with_shell_characters_is_rejected() {
        assert!(validate_username("alice;rm").is_err());
        assert!(validate_username("bob smith").is_err());
        assert!(validate_username("a_valid_user_20chars").is_ok());
        assert!(validate_username("a_valid_user_21charss").is_err());
    }

    #[test]
    fn short_password_is_rejected() {
        let mut f = form();
        f.password = Some("short".into());
        assert!(matches!(f.validate(None, 100), Err(PrintdeskError::InvalidInput(_))));
        assert!(validate_password(&"x".repeat(100)).is_ok());
        assert!(validate_password(&"x".repeat(101)).is_err());
    }

    #[test]
    fn unknown_server_is_rejected() {
        let mut f = form();
        f.server = Some("xx".into());
        assert!(matches!(f.validate(None, 100), Err(PrintdeskError::InvalidInput(_))));
    }

    #[test]
    fn missing_fields_are_rejected() {
        let mut f = form();
        f.password = None;
        let err = f.validate(None, 100).expect_err("missing password");
        assert_eq!(err.to_string(), "Missing required fields");

        let mut f = form();
        f.server = Some(String::new());
        assert!(f.validate(None, 100).is_err());
    }

    #[test]
    fn malformed_copies_default_to_one() {
        assert_eq!(parse_copies(None), 1);
        assert_eq!(parse_copies(Some("")), 1);
        assert_eq!(parse_copies(Some("abc")), 1);
        assert_eq!(parse_copies(Some("0")), 1);
        assert_eq!(parse_copies(Some("-3")), 1);
        assert_eq!(parse_copies(Some("1; rm -rf /")), 1);
        assert_eq!(parse_copies(Some(" 4 ")), 4);
        assert_eq!(parse_copies(Some("+2")), 2);
    }

    #[test]
    fn copies_use_leading_digits() {
        assert_eq!(parse_copies(Some("3abc")), 3);
        assert_eq!(parse_copies(Some("2.5")), 2);
        assert_eq!(parse_copies(Some("007")), 7);
        assert_eq!(parse_copies(Some("99999999999")), u32::MAX);

        let mut f = form();
        f.copies = Some("99999999999".into());
        assert!(f.validate(None, 100).is_err());
    }

    #[test]
    fn print_options_are_parsed_from_the_form() {
        let mut f = form();
        f.enable_booklet = Some("false".into());
        f.page_range = Some("2-4".into());
        f.paper_size = Some("A3".into());
        f.orientation = Some("landscape".into());
        let v = f.validate(None, 100).expect("valid");
        assert_eq!(v.layout, PageLayout::AsIs);
        assert_eq!(v.options.page_range, PageRange::Range { start: 2, end: 4 });
        assert_eq!(v.options.paper_size, Some(PaperSize::A3));
        assert_eq!(v.options.orientation, Some(Orientation::Landscape));

        f.paper_size = Some("A0".into());
        assert!(f.validate(None, 100).is_err());
    }

    #[test]
    fn nup_layout_is_selected_by_pages_per_sheet() {
        let mut f = form();
        f.enable_booklet = Some("false".into());
        f.pages_per_sheet = Some("4".into());
        let v = f.validate(None, 100).expect("valid");
        assert_eq!(
            v.layout,
            PageLayout::NUp(NUpGrid {
                columns: 2,
                rows: 2
            })
        );

        f.pages_per_sheet = Some("1".into());
        assert_eq!(f.validate(None, 100).expect("valid").layout, PageLayout::AsIs);

        f.pages_per_sheet = Some("5".into());
        assert!(f.validate(None, 100).is_err());
    }

    #[test]
    fn conflicting_layouts_are_rejected() {
        let mut f = form();
        f.pages_per_sheet = Some("2".into());
        let err = f.validate(None, 100).expect_err("booklet and n-up");
        assert_eq!(err.to_string(), "Booklet and n-up layouts cannot be combined");

        let mut f = form();
        f.page_range = Some("1-2".into());
        assert!(f.validate(None, 100).is_err());
    }

    #[test]
    fn copies_above_limit_are_rejected() {
        let mut f = form();
        f.copies = Some("500".into());
        assert!(f.validate(None, 100).is_err());
        assert!(f.validate(None, 500).is_ok());
    }

    #[test]
    fn flags_only_accept_literal_true() {
        assert!(parse_flag(Some("true")));
        assert!(!parse_flag(Some("TRUE")));
        assert!(!parse_flag(Some("1")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn printer_queue_overrides_default() {
        let mut f = form();
        let v = f.validate(Some("psts"), 100).expect("valid");
        assert_eq!(v.options.queue.as_deref(), Some("psts"));

        f.printer = Some("pstsb-sx".into());
        let v = f.validate(Some("psts"), 100).expect("valid");
        assert_eq!(v.options.queue.as_deref(), Some("pstsb-sx"));

        f.printer = Some("psts $(id)".into());
        assert!(f.validate(None, 100).is_err());
    }

    #[test]
    fn debug_output_hides_password() {
        let v = form().validate(None, 100).expect("valid");
        assert!(!format!("{v:?}").contains("correct-horse"));
    }
}
