//! drivenc configuration library.
//!
//! This crate is the configuration layer of the drivenc training
//! harness: one strongly-typed [`TrainingConfig`] record, loaded
//! fail-fast from a YAML document and handed out read-only to the
//! external training pipeline. The binaries (`drivenc`, `confcheck`)
//! are thin front ends around these components.
//!
//! Loading runs a staged pipeline (read, parse, key audit, field
//! decode, validate); the first failing stage aborts with a
//! [`ConfigError`] naming the offending key or field.

pub mod config;
pub mod model_spec;
pub mod output;
pub mod resolve;
pub mod schedule;
pub mod schema;
pub mod types;

// --- Re-exports for ergonomic external use ---------------------------------

pub use config::{ConfigError, TrainingConfig};

pub use model_spec::{EncoderModelConfiguration, KNOWN_MODEL_TYPES};

pub use output::{config_fingerprint, write_config_resolved, write_load_info, LoadInfo};

pub use resolve::{
    resolve_config_path, EffectiveConfigPath, PathSource, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH,
};

pub use schedule::SaveSchedule;

pub use schema::{OPTIONAL_KEYS, REQUIRED_KEYS};

pub use types::{ImageCut, SensorShape, ThresholdRange};
