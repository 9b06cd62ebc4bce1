use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

// Constants
const DEFAULT_COMMANDS: [&str; 3] = ["python3", "python", "py"];
const DEFAULT_SCRIPT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/scripts/excel_summary.py");
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TEMP_SUBDIR: &str = "sheet-summary";
const DEFAULT_SIGNATURES: [&str; 3] = ["ModuleNotFoundError", "No module named", "pandas"];
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_DATABASE_DIR: &str = "database";

/// Settings for the summary pipeline
///
/// Deserializable so it can be embedded in a larger settings file; every
/// field falls back to its default when omitted.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SummaryConfig {
    /// Interpreter commands tried in order
    pub commands: Vec<String>,

    /// Script handed to each interpreter as its first argument
    pub script_path: PathBuf,

    /// Per-command time limit
    #[serde(with = "duration_secs")]
    pub timeout: Duration,

    /// Directory for the per-upload JSON artifact
    pub temp_dir: PathBuf,

    /// Output substrings meaning the interpreter lacks a required library
    pub dependency_signatures: Vec<String>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            commands: DEFAULT_COMMANDS.iter().map(|c| c.to_string()).collect(),
            script_path: PathBuf::from(DEFAULT_SCRIPT),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            temp_dir: env::temp_dir().join(DEFAULT_TEMP_SUBDIR),
            dependency_signatures: DEFAULT_SIGNATURES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SummaryConfig {
    /// Defaults overlaid with `SHEET_SUMMARY_*` environment variables
    ///
    /// Recognized variables:
    /// * `SHEET_SUMMARY_COMMANDS` - comma separated interpreter list
    /// * `SHEET_SUMMARY_SCRIPT` - script path
    /// * `SHEET_SUMMARY_TIMEOUT_SECS` - per-command timeout, ignored unless a positive integer
    /// * `SHEET_SUMMARY_TEMP_DIR` - artifact directory
    /// * `SHEET_SUMMARY_SIGNATURES` - comma separated dependency signatures
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(commands) = lookup("SHEET_SUMMARY_COMMANDS").map(|v| split_list(&v)) {
            if !commands.is_empty() {
                cfg.commands = commands;
            }
        }
        if let Some(script) = lookup("SHEET_SUMMARY_SCRIPT") {
            cfg.script_path = PathBuf::from(script);
        }
        if let Some(secs) = lookup("SHEET_SUMMARY_TIMEOUT_SECS").and_then(|v| v.trim().parse::<u64>().ok()) {
            if secs > 0 {
                cfg.timeout = Duration::from_secs(secs);
            }
        }
        if let Some(dir) = lookup("SHEET_SUMMARY_TEMP_DIR") {
            cfg.temp_dir = PathBuf::from(dir);
        }
        if let Some(signatures) = lookup("SHEET_SUMMARY_SIGNATURES") {
            cfg.dependency_signatures = split_list(&signatures);
        }

        cfg
    }
}

/// Settings for the HTTP front end
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,

    /// Directory holding `uploads.json`
    pub database_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            database_dir: PathBuf::from(DEFAULT_DATABASE_DIR),
        }
    }
}

impl ServerConfig {
    /// Reads `SHEET_SUMMARY_BIND` and `SHEET_SUMMARY_DATABASE`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(addr) = env::var("SHEET_SUMMARY_BIND") {
            cfg.bind_addr = addr;
        }
        if let Ok(dir) = env::var("SHEET_SUMMARY_DATABASE") {
            cfg.database_dir = PathBuf::from(dir);
        }
        cfg
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

mod duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_python_toolchain() {
        let cfg = SummaryConfig::default();
        assert_eq!(cfg.commands, vec!["python3", "python", "py"]);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert!(cfg.dependency_signatures.contains(&"ModuleNotFoundError".to_string()));
        assert!(cfg.temp_dir.ends_with("sheet-summary"));
    }

    #[test]
    fn default_script_does_not_depend_on_working_directory() {
        let cfg = SummaryConfig::default();
        assert!(cfg.script_path.is_absolute());
        assert!(cfg.script_path.ends_with("scripts/excel_summary.py"));
        assert!(cfg.script_path.exists());
    }

    #[test]
    fn environment_overrides_defaults() {
        let cfg = SummaryConfig::from_lookup(lookup(&[
            ("SHEET_SUMMARY_COMMANDS", "python3.12, python3 ,"),
            ("SHEET_SUMMARY_SCRIPT", "/opt/summary.py"),
            ("SHEET_SUMMARY_TIMEOUT_SECS", "5"),
            ("SHEET_SUMMARY_TEMP_DIR", "/var/tmp/uploads"),
            ("SHEET_SUMMARY_SIGNATURES", "ImportError"),
        ]));

        assert_eq!(cfg.commands, vec!["python3.12", "python3"]);
        assert_eq!(cfg.script_path, PathBuf::from("/opt/summary.py"));
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.temp_dir, PathBuf::from("/var/tmp/uploads"));
        assert_eq!(cfg.dependency_signatures, vec!["ImportError"]);
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let cfg = SummaryConfig::from_lookup(lookup(&[
            ("SHEET_SUMMARY_COMMANDS", " , "),
            ("SHEET_SUMMARY_TIMEOUT_SECS", "soon"),
        ]));
        assert_eq!(cfg, SummaryConfig::default());

        let zero = SummaryConfig::from_lookup(lookup(&[("SHEET_SUMMARY_TIMEOUT_SECS", "0")]));
        assert_eq!(zero.timeout, Duration::from_secs(30));
    }

    #[test]
    fn deserializes_partial_json() {
        let cfg: SummaryConfig =
            serde_json::from_str(r#"{"commands": ["python3"], "timeout": 10}"#).unwrap();
        assert_eq!(cfg.commands, vec!["python3"]);
        assert_eq!(cfg.timeout, Duration::from_secs(10));
        assert_eq!(cfg.script_path, SummaryConfig::default().script_path);

        let server: ServerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(server, ServerConfig::default());
    }
}
