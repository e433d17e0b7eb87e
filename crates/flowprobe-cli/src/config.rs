//! CLI configuration

use crate::error::{CliError, CliResult};
use flowprobe::engine::{EngineConfig, DEFAULT_BORDER_WIDTH, DEFAULT_ITEMS_PER_LINE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - engine debug logs
    Verbose,
    /// Debug - everything
    Debug,
}

impl Verbosity {
    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Check if debug mode
    #[must_use]
    pub const fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }

    /// Default log filter directive for this level
    #[must_use]
    pub const fn filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "info",
            Self::Verbose => "debug",
            Self::Debug => "trace",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stdout()),
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Write logs to this file instead of stderr
    pub log_file: Option<PathBuf>,
    /// Log line format
    pub log_format: LogFormat,
    /// States per line in the traversal diagram
    pub items_per_line: usize,
    /// Include step ids in the execution summary
    pub detailed: bool,
    /// Width of the star border around each step in the log
    pub border_width: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
            log_file: None,
            log_format: LogFormat::Text,
            items_per_line: DEFAULT_ITEMS_PER_LINE,
            detailed: true,
            border_width: DEFAULT_BORDER_WIDTH,
        }
    }
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration file. Keys left out keep their defaults.
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("cannot read '{}': {e}", path.display()))
        })?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| CliError::config(format!("invalid config '{}': {e}", path.display())))
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set log file
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Set log format
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Set diagram items per line (at least 1)
    #[must_use]
    pub const fn with_items_per_line(mut self, items: usize) -> Self {
        self.items_per_line = if items == 0 { 1 } else { items };
        self
    }

    /// Set detailed summary
    #[must_use]
    pub const fn with_detailed(mut self, detailed: bool) -> Self {
        self.detailed = detailed;
        self
    }

    /// Set border width
    #[must_use]
    pub const fn with_border_width(mut self, width: usize) -> Self {
        self.border_width = width;
        self
    }

    /// Engine settings derived from this configuration
    #[must_use]
    pub const fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            border_width: self.border_width,
            items_per_line: self.items_per_line,
        }
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> CliResult<String> {
        serde_yaml_ng::to_string(self).map_err(|e| CliError::config(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_default_verbosity() {
            assert_eq!(Verbosity::default(), Verbosity::Normal);
        }

        #[test]
        fn test_levels() {
            assert!(Verbosity::Quiet.is_quiet());
            assert!(!Verbosity::Normal.is_quiet());
            assert!(Verbosity::Verbose.is_verbose());
            assert!(Verbosity::Debug.is_verbose());
            assert!(!Verbosity::Verbose.is_debug());
            assert!(Verbosity::Debug.is_debug());
        }

        #[test]
        fn test_filter() {
            assert_eq!(Verbosity::Quiet.filter(), "error");
            assert_eq!(Verbosity::Normal.filter(), "info");
            assert_eq!(Verbosity::Verbose.filter(), "debug");
            assert_eq!(Verbosity::Debug.filter(), "trace");
        }
    }

    mod color_tests {
        use super::*;

        #[test]
        fn test_forced_choices() {
            assert!(ColorChoice::Always.should_color());
            assert!(!ColorChoice::Never.should_color());
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = CliConfig::new();
            assert_eq!(config.items_per_line, 4);
            assert_eq!(config.border_width, 120);
            assert!(config.detailed);
            assert!(config.log_file.is_none());
            assert_eq!(config.log_format, LogFormat::Text);
        }

        #[test]
        fn test_builders() {
            let config = CliConfig::new()
                .with_verbosity(Verbosity::Debug)
                .with_color(ColorChoice::Never)
                .with_log_file("run.log")
                .with_log_format(LogFormat::Json)
                .with_items_per_line(0)
                .with_detailed(false)
                .with_border_width(40);
            assert_eq!(config.verbosity, Verbosity::Debug);
            assert_eq!(config.color, ColorChoice::Never);
            assert_eq!(config.log_file, Some(PathBuf::from("run.log")));
            assert_eq!(config.items_per_line, 1);
            assert!(!config.detailed);

            let engine = config.engine_config();
            assert_eq!(engine.border_width, 40);
            assert_eq!(engine.items_per_line, 1);
        }

        #[test]
        fn test_load_partial_file() {
            let temp = TempDir::new().unwrap();
            let path = temp.path().join("flowprobe.yaml");
            std::fs::write(&path, "items_per_line: 6\nlog_format: json\n").unwrap();

            let config = CliConfig::load(&path).unwrap();
            assert_eq!(config.items_per_line, 6);
            assert_eq!(config.log_format, LogFormat::Json);
            assert_eq!(config.border_width, 120);
        }

        #[test]
        fn test_load_errors() {
            let temp = TempDir::new().unwrap();
            let missing = CliConfig::load(&temp.path().join("absent.yaml")).unwrap_err();
            assert!(matches!(missing, CliError::Config { .. }));

            let path = temp.path().join("bad.yaml");
            std::fs::write(&path, "items_per_line: many\n").unwrap();
            let invalid = CliConfig::load(&path).unwrap_err();
            assert!(invalid.to_string().contains("invalid config"));
        }

        #[test]
        fn test_yaml_round_trip() {
            let config = CliConfig::new().with_border_width(80);
            let yaml = config.to_yaml().unwrap();
            assert!(yaml.contains("border_width: 80"));
            let parsed: CliConfig = serde_yaml_ng::from_str(&yaml).unwrap();
            assert_eq!(parsed, config);
        }
    }
}
