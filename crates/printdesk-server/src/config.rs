// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Start-up configuration loading.
//
// Defaults, then the JSON file named by `PRINTDESK_CONFIG` (if set), then
// the `PORT` and `PRINTDESK_UPLOAD_DIR` environment overrides.

use std::path::{Path, PathBuf};

use tracing::info;

use printdesk_core::AppConfig;
use printdesk_core::error::{PrintdeskError, Result};

pub const CONFIG_ENV: &str = "PRINTDESK_CONFIG";
pub const PORT_ENV: &str = "PORT";
pub const UPLOAD_DIR_ENV: &str = "PRINTDESK_UPLOAD_DIR";

/// Load configuration from the process environment.
pub fn load_config() -> Result<AppConfig> {
    load_with(|key| std::env::var(key).ok())
}

/// Load configuration using `env` to look up variables.
pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<AppConfig> {
    let mut config = match env(CONFIG_ENV) {
        Some(path) => read_config_file(Path::new(&path))?,
        None => AppConfig::default(),
    };

    if let Some(port) = env(PORT_ENV) {
        config.port = port.trim().parse().map_err(|_| {
            PrintdeskError::Config(format!("{PORT_ENV} must be a port number, got '{port}'"))
        })?;
    }
    if let Some(dir) = env(UPLOAD_DIR_ENV).filter(|d| !d.is_empty()) {
        config.upload_dir = PathBuf::from(dir);
    }

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<AppConfig> {
    let data = std::fs::read_to_string(path).map_err(|e| {
        PrintdeskError::Config(format!("cannot read {}: {}", path.display(), e))
    })?;
    let config = serde_json::from_str(&data)?;
    info!(path = %path.display(), "configuration file loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = load_with(env_from(&[])).expect("config");
        assert_eq!(config.port, 3000);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn environment_overrides_port_and_upload_dir() {
        let config = load_with(env_from(&[
            (PORT_ENV, "8081"),
            (UPLOAD_DIR_ENV, "/var/spool/printdesk"),
        ]))
        .expect("config");
        assert_eq!(config.port, 8081);
        assert_eq!(config.upload_dir, PathBuf::from("/var/spool/printdesk"));
    }

    #[test]
    fn bad_port_is_a_config_error() {
        let err = load_with(env_from(&[(PORT_ENV, "http")])).expect_err("bad port");
        assert!(matches!(err, PrintdeskError::Config(_)));
    }

    #[test]
    fn file_values_apply_before_environment() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("printdesk.json");
        std::fs::write(&path, r#"{ "port": 9000, "default_queue": "psts" }"#).expect("write");
        let path = path.to_string_lossy().into_owned();

        let config = load_with(env_from(&[(CONFIG_ENV, path.as_str())])).expect("config");
        assert_eq!(config.port, 9000);
        assert_eq!(config.default_queue.as_deref(), Some("psts"));

        let config =
            load_with(env_from(&[(CONFIG_ENV, path.as_str()), (PORT_ENV, "9001")])).expect("config");
        assert_eq!(config.port, 9001);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = load_with(env_from(&[(CONFIG_ENV, "/nonexistent/printdesk.json")]))
            .expect_err("missing file");
        assert!(matches!(err, PrintdeskError::Config(_)));
    }
}
