//! Configuration for the lookout binary
//!
//! Command line flags (with environment fallbacks) for the watched
//! directory, polling, test runs and logging.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use lookout_packages::DEFAULT_IGNORED;
use lookout_tests::RunFlags;

use crate::watcher::WatcherConfig;

/// Default poll interval in milliseconds
pub const DEFAULT_INTERVAL_MS: u64 = 200;

/// Default per-run timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Lookout - rerun the tests of changed Go packages
#[derive(Parser, Debug, Clone)]
#[command(name = "lookout")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Directory to watch
    ///
    /// Any directory inside a Go module; the whole module is watched.
    /// Defaults to the current working directory.
    #[arg(short, long, env = "LOOKOUT_DIR")]
    pub dir: Option<PathBuf>,

    /// Milliseconds between two scans of the module
    #[arg(long, env = "LOOKOUT_INTERVAL_MS", default_value_t = DEFAULT_INTERVAL_MS)]
    pub interval_ms: u64,

    /// Milliseconds a package's test run may take
    #[arg(long, env = "LOOKOUT_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Additional directory name to skip (repeatable)
    #[arg(long = "ignore", value_name = "NAME")]
    pub ignore: Vec<String>,

    /// Run tests with `-vet=off`
    #[arg(long, default_value = "false")]
    pub no_vet: bool,

    /// Run tests with the race detector
    #[arg(long, default_value = "false")]
    pub race: bool,

    /// Print one JSON report per package run to stdout
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dir: None,
            interval_ms: DEFAULT_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            ignore: Vec::new(),
            no_vet: false,
            race: false,
            json: false,
            verbose: false,
            quiet: false,
        }
    }
}

impl Config {
    /// Get the watched directory, using current directory as default
    ///
    /// Returns `None` if no directory is specified and the current
    /// directory cannot be determined.
    #[must_use]
    pub fn dir_path(&self) -> Option<PathBuf> {
        self.dir.clone().or_else(|| std::env::current_dir().ok())
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory is specified but doesn't exist or isn't a directory
    /// - The poll interval or the timeout is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref dir) = self.dir {
            if !dir.exists() {
                return Err(ConfigError::DirNotFound(dir.clone()));
            }
            if !dir.is_dir() {
                return Err(ConfigError::NotDirectory(dir.clone()));
            }
        }
        if self.interval_ms == 0 {
            return Err(ConfigError::ZeroDuration("interval-ms"));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("timeout-ms"));
        }
        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }

    /// Directory names skipped while scanning
    #[must_use]
    pub fn ignored(&self) -> Vec<String> {
        DEFAULT_IGNORED
            .iter()
            .map(ToString::to_string)
            .chain(self.ignore.iter().cloned())
            .collect()
    }

    /// Settings for the watcher
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoDirectory` if no directory is given and
    /// the current directory cannot be determined.
    pub fn watcher_config(&self) -> Result<WatcherConfig, ConfigError> {
        let dir = self.dir_path().ok_or(ConfigError::NoDirectory)?;
        Ok(WatcherConfig {
            dir,
            interval: Duration::from_millis(self.interval_ms),
            timeout: Duration::from_millis(self.timeout_ms),
            ignored: self.ignored(),
            ..WatcherConfig::default()
        })
    }

    /// Flags every test run uses
    #[must_use]
    pub fn run_flags(&self) -> RunFlags {
        RunFlags {
            vet: !self.no_vet,
            race: self.race,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Directory not found
    #[error("Directory not found: {0}")]
    DirNotFound(PathBuf),

    /// Path is not a directory
    #[error("Path is not a directory: {0}")]
    NotDirectory(PathBuf),

    /// The current directory is not accessible
    #[error("No directory given and the current directory is not accessible")]
    NoDirectory,

    /// A duration flag is zero
    #[error("--{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.dir.is_none());
        assert_eq!(config.interval_ms, 200);
        assert_eq!(config.timeout_ms, 10_000);
        assert!(!config.no_vet);
        assert!(!config.race);
        assert!(!config.verbose);
        assert!(!config.quiet);
    }

    #[test]
    fn test_dir_path_default() {
        let config = Config::default();
        // Should fallback to current directory
        assert!(config.dir_path().is_some());
    }

    #[test]
    fn test_log_level() {
        assert_eq!(Config::default().log_level(), tracing::Level::INFO);
        let verbose = Config {
            verbose: true,
            ..Default::default()
        };
        assert_eq!(verbose.log_level(), tracing::Level::DEBUG);
        let quiet = Config {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(quiet.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_validate_nonexistent_dir() {
        let config = Config {
            dir: Some(PathBuf::from("/nonexistent/path/12345")),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::DirNotFound(_))));
    }

    #[test]
    fn test_validate_zero_interval() {
        let config = Config {
            interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroDuration("interval-ms"))
        ));
    }

    #[test]
    fn test_watcher_config() {
        let config = Config {
            dir: Some(PathBuf::from("/tmp")),
            interval_ms: 50,
            timeout_ms: 1_000,
            ignore: vec!["gen".to_string()],
            ..Default::default()
        };
        let watcher = config.watcher_config().expect("watcher config");
        assert_eq!(watcher.dir, PathBuf::from("/tmp"));
        assert_eq!(watcher.interval, Duration::from_millis(50));
        assert_eq!(watcher.timeout, Duration::from_secs(1));
        assert!(watcher.ignored.contains(&"vendor".to_string()));
        assert_eq!(watcher.ignored.last().map(String::as_str), Some("gen"));
    }

    #[test]
    fn test_run_flags() {
        let config = Config {
            no_vet: true,
            race: true,
            ..Default::default()
        };
        assert_eq!(
            config.run_flags(),
            RunFlags {
                vet: false,
                race: true
            }
        );
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
