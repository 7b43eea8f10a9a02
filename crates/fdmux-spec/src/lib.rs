//! fdmux Run Configuration Library
//!
//! This crate provides the configuration data model for fdmux runs and the
//! validation that guards every run before any audio is touched.
//!
//! # Overview
//!
//! A run multiplexes a fixed set of channels onto distinct carriers and
//! recovers each one with a Butterworth low-pass filter. Everything that shapes
//! the run lives in one immutable [`RunConfig`]:
//!
//! - **Inputs**: ordered resource identifiers, one per channel
//! - **Carriers**: one frequency per channel, matched by index
//! - **Filter**: cutoff and order of the recovery filter
//! - **Output**: plot rendering and WAV sample encodings
//!
//! # Example
//!
//! ```
//! use fdmux_spec::{validate_config, RunConfig};
//!
//! let config = RunConfig::from_json(r#"{
//!     "inputs": ["voice.wav", "music.wav"],
//!     "carrier_frequencies": [5000, 15000]
//! }"#).unwrap();
//!
//! let result = validate_config(&config);
//! assert!(result.is_ok());
//! assert_eq!(config.channels().len(), 2);
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration types and JSON loading
//! - [`error`]: Error and warning types, stable codes
//! - [`validation`]: Configuration validation

pub mod config;
pub mod error;
pub mod validation;

// Re-export commonly used types at the crate root
pub use config::{
    ChannelConfig, FilterSettings, FilterSpec, OutputSettings, RunConfig, WavEncoding,
    DEFAULT_CARRIER_FREQUENCIES, DEFAULT_FILTER_CUTOFF_HZ, DEFAULT_FILTER_ORDER,
    DEFAULT_MAX_DURATION_SECONDS, DEFAULT_SAMPLE_RATE, MAX_FILTER_ORDER,
};
pub use error::{
    CodedError, ErrorCode, SpecError, ValidationError, ValidationResult, ValidationWarning,
    WarningCode,
};
pub use validation::validate_config;
