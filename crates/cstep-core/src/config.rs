//! Configuration handling for cstep.
//!
//! Settings come from `--config <path>`, else `cstep.toml` in the working
//! directory, else the defaults below.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CstepError;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "cstep.toml";

/// cstep configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Instrumentation settings
    #[serde(default)]
    pub instrument: InstrumentConfig,

    /// Output file settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// How generated code is named and shaped
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstrumentConfig {
    /// Prefix of the runtime hook functions (`notify_0` .. `notify_N`)
    #[serde(default = "default_notify_prefix")]
    pub notify_prefix: String,

    /// Prefix of generated temporaries (`temp0`, `temp1`, ...)
    #[serde(default = "default_temp_prefix")]
    pub temp_prefix: String,

    /// Largest pointer arity a single hook call may carry
    #[serde(default = "default_max_notify_arity")]
    pub max_notify_arity: usize,

    /// Prepend forward declarations of the hook functions
    #[serde(default = "default_true")]
    pub emit_prelude: bool,

    /// Report `sizeof` of every captured type when `main` is entered
    #[serde(default = "default_true")]
    pub emit_type_events: bool,
}

/// Where and how results are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Pretty-print metadata JSON
    #[serde(default = "default_true")]
    pub pretty: bool,

    /// Suffix replacing `.c` for the instrumented source
    #[serde(default = "default_instrumented_suffix")]
    pub instrumented_suffix: String,

    /// Suffix replacing `.c` for the metadata document
    #[serde(default = "default_metadata_suffix")]
    pub metadata_suffix: String,
}

fn default_notify_prefix() -> String {
    "notify_".to_string()
}

fn default_temp_prefix() -> String {
    "temp".to_string()
}

fn default_max_notify_arity() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_instrumented_suffix() -> String {
    ".g.c".to_string()
}

fn default_metadata_suffix() -> String {
    ".json".to_string()
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            notify_prefix: default_notify_prefix(),
            temp_prefix: default_temp_prefix(),
            max_notify_arity: default_max_notify_arity(),
            emit_prelude: true,
            emit_type_events: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            instrumented_suffix: default_instrumented_suffix(),
            metadata_suffix: default_metadata_suffix(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, CstepError> {
        let content = fs::read_to_string(path).map_err(|e| CstepError::Config {
            path: path.display().to_string(),
            message: format!("failed to read config file: {}", e),
        })?;
        Self::parse(&content).map_err(|message| CstepError::Config {
            path: path.display().to_string(),
            message,
        })
    }

    /// Parse configuration text
    pub fn parse(content: &str) -> Result<Self, String> {
        let config: Config =
            toml::from_str(content).map_err(|e| format!("failed to parse config file: {}", e))?;
        if config.instrument.max_notify_arity == 0 {
            return Err("instrument.max_notify_arity must be at least 1".to_string());
        }
        Ok(config)
    }

    /// Resolve configuration: an explicit path must exist; otherwise
    /// `cstep.toml` in `dir` is used when present.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, CstepError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "loading configuration");
            Self::load(&candidate)
        } else {
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.instrument.notify_prefix, "notify_");
        assert_eq!(config.instrument.temp_prefix, "temp");
        assert_eq!(config.instrument.max_notify_arity, 10);
        assert!(config.instrument.emit_prelude);
        assert_eq!(config.output.instrumented_suffix, ".g.c");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = Config::parse("[instrument]\ntemp_prefix = \"__t\"\n").unwrap();
        assert_eq!(config.instrument.temp_prefix, "__t");
        assert_eq!(config.instrument.notify_prefix, "notify_");
        assert!(config.output.pretty);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::parse("[instrument]\nprefix = \"x\"\n").unwrap_err();
        assert!(err.contains("unknown field"), "{}", err);
    }

    #[test]
    fn zero_arity_is_rejected() {
        assert!(Config::parse("[instrument]\nmax_notify_arity = 0\n").is_err());
    }

    #[test]
    fn discover_reads_file_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[output]\npretty = false\n",
        )
        .unwrap();
        let config = Config::discover(None, dir.path()).unwrap();
        assert!(!config.output.pretty);
    }

    #[test]
    fn discover_without_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::discover(None, dir.path()).unwrap();
        assert!(config.output.pretty);
    }

    #[test]
    fn explicit_missing_path_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::discover(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, CstepError::Config { .. }));
    }
}
