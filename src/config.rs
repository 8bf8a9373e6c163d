use std::path::PathBuf;

use tracing::Level;

/// Runtime settings for the CLI, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON file the CLI keeps its records in between runs.
    pub session_path: PathBuf,
    pub export_dir: PathBuf,
    /// Currency symbol shown next to money amounts.
    pub currency: String,
    pub log_level: Level,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            session_path: PathBuf::from("grow-tracker.json"),
            export_dir: PathBuf::from("."),
            currency: "R".to_string(),
            log_level: Level::INFO,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();
        Config {
            session_path: lookup("GROW_TRACKER_SESSION")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_path),
            export_dir: lookup("GROW_TRACKER_EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.export_dir),
            currency: lookup("GROW_TRACKER_CURRENCY").unwrap_or(defaults.currency),
            log_level: lookup("GROW_TRACKER_LOG")
                .and_then(|level| level.parse().ok())
                .unwrap_or(defaults.log_level),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_when_unset() {
        assert_eq!(Config::from_lookup(|_| None), Config::default());
    }

    #[test]
    fn reads_overrides() {
        let env: HashMap<&str, &str> = [
            ("GROW_TRACKER_SESSION", "/tmp/mine.json"),
            ("GROW_TRACKER_CURRENCY", "$"),
            ("GROW_TRACKER_LOG", "debug"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.session_path, PathBuf::from("/tmp/mine.json"));
        assert_eq!(config.currency, "$");
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.export_dir, PathBuf::from("."));
    }

    #[test]
    fn bad_log_level_falls_back_to_info() {
        let config = Config::from_lookup(|key| (key == "GROW_TRACKER_LOG").then(|| "loud".to_string()));
        assert_eq!(config.log_level, Level::INFO);
    }
}
