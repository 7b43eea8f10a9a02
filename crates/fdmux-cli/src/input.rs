//! Run configuration loading.
//!
//! A run is driven either by a JSON configuration file or by the built-in
//! defaults. Relative input paths are resolved against the configuration
//! file's directory, or against the working directory when no file is given.

use fdmux_spec::{RunConfig, SpecError};
use std::path::{Path, PathBuf};

/// Where a run configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A configuration file on disk.
    File(PathBuf),
    /// Built-in defaults.
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// A loaded configuration together with its provenance.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The run configuration.
    pub config: RunConfig,
    /// Origin of the configuration.
    pub source: ConfigSource,
    /// Directory that relative input paths are resolved against.
    pub base_dir: PathBuf,
    /// BLAKE3 hash of the configuration file content (hex string).
    pub source_hash: Option<String>,
}

impl LoadedConfig {
    /// Replaces the configured inputs with paths given on the command line.
    ///
    /// Command-line paths are relative to the working directory, not to the
    /// configuration file. An empty list leaves the configuration unchanged.
    pub fn with_inputs(mut self, inputs: &[String]) -> Self {
        if !inputs.is_empty() {
            self.config.inputs = inputs.to_vec();
            self.base_dir = PathBuf::from(".");
        }
        self
    }

    /// Disables plot output.
    pub fn without_plots(mut self) -> Self {
        self.config.output.plots = false;
        self
    }
}

/// Errors that can occur while loading a configuration.
#[derive(Debug)]
pub enum InputError {
    /// File could not be read.
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON parsing failed.
    JsonParse { message: String },
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::FileRead { path, source } => {
                write!(f, "failed to read file '{}': {}", path.display(), source)
            }
            InputError::JsonParse { message } => {
                write!(f, "JSON parse error: {}", message)
            }
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::FileRead { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Loads a run configuration, falling back to defaults when no path is given.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use fdmux_cli::input::load_config;
///
/// let loaded = load_config(Some(Path::new("fdmux.json"))).unwrap();
/// println!("{} channel(s)", loaded.config.inputs.len());
/// ```
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig, InputError> {
    let Some(path) = path else {
        return Ok(LoadedConfig {
            config: RunConfig::default(),
            source: ConfigSource::Defaults,
            base_dir: PathBuf::from("."),
            source_hash: None,
        });
    };

    let content = std::fs::read(path).map_err(|e| InputError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let source_hash = blake3::hash(&content).to_hex().to_string();

    let text = String::from_utf8(content).map_err(|e| InputError::JsonParse {
        message: format!("config is not valid UTF-8: {}", e.utf8_error()),
    })?;
    let config = RunConfig::from_json(&text).map_err(|e| match e {
        SpecError::JsonParse(inner) => InputError::JsonParse {
            message: inner.to_string(),
        },
        other => InputError::JsonParse {
            message: other.to_string(),
        },
    })?;

    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(LoadedConfig {
        config,
        source: ConfigSource::File(path.to_path_buf()),
        base_dir,
        source_hash: Some(source_hash),
    })
}
