use crate::enumerator::ScanOptions;
use crate::wire::{DEFAULT_TEXT_CAPACITY, MAX_TEXT_CAPACITY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// When enabled the logger starts at debug level and honours `RUST_LOG`.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional file that receives a copy of the log output.
    #[serde(default)]
    pub log_file: Option<String>,
    /// Capacity of the text buffer staged in the shell process, in UTF-16
    /// units. Labels longer than this are cut short.
    #[serde(default = "default_text_capacity")]
    pub text_capacity: usize,
    /// Leave icons with an empty or unreadable label out of scans.
    #[serde(default = "default_true")]
    pub skip_empty_names: bool,
}

fn default_text_capacity() -> usize {
    DEFAULT_TEXT_CAPACITY
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            log_file: None,
            text_capacity: default_text_capacity(),
            skip_empty_names: true,
        }
    }
}

impl Settings {
    /// Load settings from `path`. A missing or empty file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    }

    pub fn scan_options(&self) -> ScanOptions {
        let text_capacity = self.text_capacity.clamp(1, MAX_TEXT_CAPACITY);
        if text_capacity != self.text_capacity {
            tracing::warn!(
                "text_capacity of {} is out of range; using {text_capacity}",
                self.text_capacity
            );
        }
        ScanOptions {
            text_capacity,
            skip_empty_names: self.skip_empty_names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;

    #[test]
    fn missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"debug_logging":true}"#).unwrap();
        assert!(settings.debug_logging);
        assert_eq!(settings.text_capacity, 256);
        assert!(settings.skip_empty_names);
        assert!(settings.log_path().is_none());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let settings = Settings {
            text_capacity: 0,
            ..Settings::default()
        };
        assert_eq!(settings.scan_options().text_capacity, 1);
    }

    #[test]
    fn huge_capacity_is_clamped() {
        let settings: Settings =
            serde_json::from_str(r#"{"text_capacity": 9223372036854775808}"#).unwrap();
        assert_eq!(settings.text_capacity, 9_223_372_036_854_775_808);
        assert_eq!(
            settings.scan_options().text_capacity,
            crate::wire::MAX_TEXT_CAPACITY
        );
    }

    #[test]
    fn empty_names_are_skipped_unless_disabled() {
        assert!(Settings::default().scan_options().skip_empty_names);
        let settings: Settings =
            serde_json::from_str(r#"{"skip_empty_names": false}"#).unwrap();
        assert!(!settings.scan_options().skip_empty_names);
    }
}
