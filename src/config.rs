// src/config.rs

//! Configuration for the `termwatch` command-line front end.
//!
//! Every field has a default, so a config file only needs the settings it
//! changes. Files are JSON, for example:
//!
//! ```json
//! { "fallback": { "columns": 100, "rows": 30 }, "strict": false }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::size::TerminalSize;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)] // Apply default values for the entire struct if a field is missing.
pub struct Config {
    /// Size reported when standard output is not a terminal.
    pub fallback: FallbackConfig,
    /// Fail instead of reporting the fallback size.
    pub strict: bool,
    /// Watch-mode settings.
    pub watch: WatchConfig,
}

/// Dimensions to assume when the real ones are unknown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FallbackConfig {
    pub columns: u16,
    pub rows: u16,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        FallbackConfig {
            columns: TerminalSize::DEFAULT.columns,
            rows: TerminalSize::DEFAULT.rows,
        }
    }
}

impl From<FallbackConfig> for TerminalSize {
    fn from(fallback: FallbackConfig) -> Self {
        TerminalSize::new(fallback.columns, fallback.rows)
    }
}

/// Settings for `--watch`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct WatchConfig {
    /// Print the size once before waiting for the first resize.
    pub print_initial: bool,
    /// Skip notifications that leave the size unchanged.
    pub skip_unchanged: bool,
}

impl Config {
    /// Parses a JSON configuration string.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse termwatch configuration")
    }

    /// Reads and parses a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// The fallback size as a `TerminalSize`.
    pub fn fallback_size(&self) -> TerminalSize {
        self.fallback.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test_log::test]
    fn empty_object_yields_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.fallback_size(), TerminalSize::new(80, 24));
        assert!(!config.strict);
    }

    #[test_log::test]
    fn partial_fallback_keeps_other_default() {
        let config = Config::from_json(r#"{"fallback":{"columns":132}}"#).unwrap();
        assert_eq!(config.fallback_size(), TerminalSize::new(132, 24));
    }

    #[test_log::test]
    fn full_config_parses() {
        let config = Config::from_json(
            r#"{"fallback":{"columns":100,"rows":30},"strict":true,
                "watch":{"print_initial":true,"skip_unchanged":true}}"#,
        )
        .unwrap();
        assert!(config.strict);
        assert!(config.watch.print_initial);
        assert!(config.watch.skip_unchanged);
        assert_eq!(config.fallback_size(), TerminalSize::new(100, 30));
    }

    #[test_log::test]
    fn malformed_json_is_an_error() {
        assert!(Config::from_json("{ not json").is_err());
    }

    #[test_log::test]
    fn load_reads_from_disk() {
        let path = std::env::temp_dir().join(format!("termwatch-config-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"strict": true}}"#).unwrap();
        drop(file);

        let config = Config::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(config.strict);
    }

    #[test_log::test]
    fn load_missing_file_names_the_path() {
        let err = Config::load(Path::new("/nonexistent/termwatch.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/termwatch.json"));
    }
}
