//! Engine configuration.
//!
//! | Variable               | Default  | Description                                   |
//! |------------------------|----------|-----------------------------------------------|
//! | `FLATDB_DATA_DIR`      | `./data` | Directory holding one `<table>.table` file each |
//! | `FLATDB_ATOMIC_WRITES` | `true`   | Write to a temp file and rename over the target |

use std::path::PathBuf;

/// Runtime configuration for a file-backed engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding the table files. Created on open if absent.
    pub data_dir: PathBuf,

    /// When false, table files are overwritten in place and a crash
    /// mid-write can leave a truncated file.
    pub atomic_writes: bool,
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            atomic_writes: true,
        }
    }

    pub fn with_atomic_writes(mut self, atomic_writes: bool) -> Self {
        self.atomic_writes = atomic_writes;
        self
    }

    /// Load configuration from environment variables, applying defaults where
    /// a variable is absent or unparseable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            data_dir: PathBuf::from(env_str(&lookup, "FLATDB_DATA_DIR", "./data")),
            atomic_writes: env_bool(&lookup, "FLATDB_ATOMIC_WRITES", true),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("./data")
    }
}

fn env_str(lookup: impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

fn env_bool(lookup: impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    lookup(key).and_then(|v| parse_bool(&v)).unwrap_or(default)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
