// src/config.rs
//
// Training configuration record and loader.
//
// A TrainingConfig fully describes one encoder training run:
// - checkpoint schedule and iteration budget
// - dataset pointers (name, subset selector, episode index files)
// - input geometry (sensors, crop, temporal windowing)
// - measurement / command wiring (targets vs. conditioning inputs)
// - optimizer schedule (learning rate decay)
// - encoder model selection and per-module architecture
//
// Documents are YAML with SCREAMING_SNAKE_CASE keys. Loading is
// fail-fast: read -> parse -> key audit -> field decode -> validate,
// and the first failing stage aborts the load. The loader performs no
// side effects beyond reading the input document.

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model_spec::{self, EncoderModelConfiguration};
use crate::schedule::SaveSchedule;
use crate::schema;
use crate::types::{ImageCut, SensorShape, ThresholdRange};

/// Canonical baseline document, embedded at build time.
const BASELINE_YAML: &str = include_str!("../configs/stdim_baseline.yaml");

/// Immutable training configuration record.
///
/// Populated once at process start and never mutated; plain owned data,
/// so a loaded record can be shared by reference across threads without
/// synchronization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TrainingConfig {
    /// Iterations at which a checkpoint is persisted.
    pub save_schedule: SaveSchedule,
    /// Worker processes feeding the data loader.
    pub num_loading_workers: usize,
    /// RNG seed for the run.
    pub seed: u64,
    /// Expected tensor shape per named sensor, channels first.
    pub sensors: BTreeMap<String, SensorShape>,
    /// Scalar feature count per measurement group.
    pub measurements: BTreeMap<String, u32>,
    /// Cardinality per discrete command (e.g. number of directions).
    pub commands: BTreeMap<String, u32>,
    /// Samples per optimizer step.
    pub batch_size: usize,
    /// Total optimizer steps in the run.
    #[serde(rename = "NUMBER_ITERATIONS")]
    pub num_iterations: u64,
    /// Measurements the model regresses.
    pub targets: Vec<String>,
    /// Measurements fed to the model as conditioning input.
    pub inputs: Vec<String>,
    /// Consecutive frames stacked along the channel axis.
    pub frame_fusion_count: u32,
    /// Frames per temporal sample.
    pub image_sequence_length: u32,
    /// Raw-frame distance between consecutive sequence frames.
    pub sequence_stride: u32,
    /// Steering correction scale for laterally shifted camera views.
    pub augment_lateral_steerings: f64,
    /// Speed normalization divisor (m/s).
    pub speed_factor: f64,
    /// Dataset identifier, resolved externally to a storage location.
    pub dataset_name: String,
    /// Image augmentation policy name, if any.
    ///
    /// Documents may write this as an absent key, a YAML null, or the
    /// legacy sentinel string "None"; all load as `None` and serialize
    /// back as null.
    pub augmentation: Option<String>,
    /// Subset selector over the recorded cameras (e.g. "central", "all").
    pub data_used: String,
    /// Include episodes recorded with steering-noise injection.
    pub use_noise_data: bool,
    /// Episode index files, relative to the dataset root.
    pub experience_files: Vec<PathBuf>,
    /// Inclusive bounds on the frame distance of a positive pair.
    pub positive_consecutive_threshold: ThresholdRange,
    /// Start from pretrained backbone weights.
    pub pretrained: bool,
    /// Tag selecting the model-assembly code path.
    pub encoder_model_type: String,
    /// Per-module architecture mapping, opaque beyond structural checks.
    pub encoder_model_configuration: EncoderModelConfiguration,
    /// Optimizer step size.
    pub learning_rate: f64,
    /// Iterations between scheduled learning-rate decays.
    pub learning_rate_decay_interval: u64,
    /// Plateau window in iterations before an adaptive decay.
    pub learning_rate_threshold: u64,
    /// Multiplicative factor applied at each decay, in (0, 1].
    pub learning_rate_decay_level: f64,
    /// Vertical crop bounds on the raw camera frame.
    pub image_cut: ImageCut,
    /// Let the simulator oracle overwrite predicted controls.
    pub use_oracle: bool,
    /// Drive entirely from the simulator oracle.
    pub use_full_oracle: bool,
    /// Suppress predicted braking when the oracle reports a clear road.
    pub avoid_stopping: bool,
}

impl TrainingConfig {
    /// Load a configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            source: e.to_string(),
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse a configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let doc: Value = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse {
            source: e.to_string(),
        })?;
        let doc = match doc {
            Value::Mapping(map) => map,
            other => {
                return Err(ConfigError::Parse {
                    source: format!("document root must be a mapping, got {}", value_kind(&other)),
                })
            }
        };
        schema::audit_keys(&doc)?;
        let config = Self::from_document(&doc)?;
        config.validate()?;
        Ok(config)
    }

    /// The canonical stdim baseline configuration, embedded at build
    /// time. Panics if the embedded document is invalid.
    pub fn baseline() -> Self {
        Self::from_yaml_str(BASELINE_YAML).expect("embedded baseline config is invalid")
    }

    /// Serialize the record back to a document using the canonical keys.
    ///
    /// Loading the result yields an equal record: range shorthand, key
    /// order, and sentinel spellings all normalize away.
    pub fn to_yaml_string(&self) -> serde_yaml::Result<String> {
        serde_yaml::to_string(self)
    }

    /// Decode an audited document mapping into the typed record.
    fn from_document(doc: &Mapping) -> Result<Self, ConfigError> {
        Ok(Self {
            save_schedule: field(doc, "SAVE_SCHEDULE")?,
            num_loading_workers: field(doc, "NUM_LOADING_WORKERS")?,
            seed: field(doc, "SEED")?,
            sensors: field(doc, "SENSORS")?,
            measurements: field(doc, "MEASUREMENTS")?,
            commands: field(doc, "COMMANDS")?,
            batch_size: field(doc, "BATCH_SIZE")?,
            num_iterations: field(doc, "NUMBER_ITERATIONS")?,
            targets: field(doc, "TARGETS")?,
            inputs: field(doc, "INPUTS")?,
            frame_fusion_count: field(doc, "FRAME_FUSION_COUNT")?,
            image_sequence_length: field(doc, "IMAGE_SEQUENCE_LENGTH")?,
            sequence_stride: field(doc, "SEQUENCE_STRIDE")?,
            augment_lateral_steerings: field(doc, "AUGMENT_LATERAL_STEERINGS")?,
            speed_factor: field(doc, "SPEED_FACTOR")?,
            dataset_name: field(doc, "DATASET_NAME")?,
            augmentation: optional_name(doc, "AUGMENTATION")?,
            data_used: field(doc, "DATA_USED")?,
            use_noise_data: field(doc, "USE_NOISE_DATA")?,
            experience_files: field(doc, "EXPERIENCE_FILES")?,
            positive_consecutive_threshold: field(doc, "POSITIVE_CONSECUTIVE_THRESHOLD")?,
            pretrained: field(doc, "PRETRAINED")?,
            encoder_model_type: field(doc, "ENCODER_MODEL_TYPE")?,
            encoder_model_configuration: field(doc, "ENCODER_MODEL_CONFIGURATION")?,
            learning_rate: field(doc, "LEARNING_RATE")?,
            learning_rate_decay_interval: field(doc, "LEARNING_RATE_DECAY_INTERVAL")?,
            learning_rate_threshold: field(doc, "LEARNING_RATE_THRESHOLD")?,
            learning_rate_decay_level: field(doc, "LEARNING_RATE_DECAY_LEVEL")?,
            image_cut: field(doc, "IMAGE_CUT")?,
            use_oracle: field(doc, "USE_ORACLE")?,
            use_full_oracle: field(doc, "USE_FULL_ORACLE")?,
            avoid_stopping: field(doc, "AVOID_STOPPING")?,
        })
    }

    /// Validate the record invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Iteration budget and checkpoint schedule
        if self.num_iterations == 0 {
            return Err(ConfigError::Validation {
                field: "NUMBER_ITERATIONS".to_string(),
                message: "must be >= 1".to_string(),
            });
        }
        if !self.save_schedule.is_strictly_increasing() {
            return Err(ConfigError::Validation {
                field: "SAVE_SCHEDULE".to_string(),
                message: "iterations must be strictly increasing".to_string(),
            });
        }
        if let Some(last) = self.save_schedule.last() {
            if last > self.num_iterations {
                return Err(ConfigError::Validation {
                    field: "SAVE_SCHEDULE".to_string(),
                    message: format!(
                        "iteration {} exceeds NUMBER_ITERATIONS ({})",
                        last, self.num_iterations
                    ),
                });
            }
        }

        // Batching and loader parallelism
        if self.batch_size == 0 {
            return Err(ConfigError::Validation {
                field: "BATCH_SIZE".to_string(),
                message: "must be >= 1".to_string(),
            });
        }
        if self.num_loading_workers == 0 {
            return Err(ConfigError::Validation {
                field: "NUM_LOADING_WORKERS".to_string(),
                message: "must be >= 1".to_string(),
            });
        }

        // Input geometry
        if self.sensors.is_empty() {
            return Err(ConfigError::Validation {
                field: "SENSORS".to_string(),
                message: "at least one sensor is required".to_string(),
            });
        }
        for (name, shape) in &self.sensors {
            if shape.channels == 0 || shape.height == 0 || shape.width == 0 {
                return Err(ConfigError::Validation {
                    field: format!("SENSORS.{}", name),
                    message: "all dimensions must be >= 1".to_string(),
                });
            }
        }
        if self.image_cut.top >= self.image_cut.bottom {
            return Err(ConfigError::Validation {
                field: "IMAGE_CUT".to_string(),
                message: format!(
                    "top bound {} must be less than bottom bound {}",
                    self.image_cut.top, self.image_cut.bottom
                ),
            });
        }

        // Temporal windowing
        if self.frame_fusion_count == 0 {
            return Err(ConfigError::Validation {
                field: "FRAME_FUSION_COUNT".to_string(),
                message: "must be >= 1".to_string(),
            });
        }
        if self.image_sequence_length == 0 {
            return Err(ConfigError::Validation {
                field: "IMAGE_SEQUENCE_LENGTH".to_string(),
                message: "must be >= 1".to_string(),
            });
        }
        if self.sequence_stride == 0 {
            return Err(ConfigError::Validation {
                field: "SEQUENCE_STRIDE".to_string(),
                message: "must be >= 1".to_string(),
            });
        }

        // Measurement and command wiring
        if self.commands.is_empty() {
            return Err(ConfigError::Validation {
                field: "COMMANDS".to_string(),
                message: "at least one command is required".to_string(),
            });
        }
        for (name, cardinality) in &self.commands {
            if *cardinality == 0 {
                return Err(ConfigError::Validation {
                    field: format!("COMMANDS.{}", name),
                    message: "cardinality must be >= 1".to_string(),
                });
            }
        }
        if self.targets.is_empty() {
            return Err(ConfigError::Validation {
                field: "TARGETS".to_string(),
                message: "at least one target is required".to_string(),
            });
        }
        check_selection(&self.targets, "TARGETS", &self.measurements)?;
        check_selection(&self.inputs, "INPUTS", &self.measurements)?;

        // Dataset pointers
        if self.dataset_name.is_empty() {
            return Err(ConfigError::Validation {
                field: "DATASET_NAME".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.data_used.is_empty() {
            return Err(ConfigError::Validation {
                field: "DATA_USED".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        for (i, file) in self.experience_files.iter().enumerate() {
            if file.as_os_str().is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("EXPERIENCE_FILES[{}]", i),
                    message: "path cannot be empty".to_string(),
                });
            }
        }
        if let Some(name) = &self.augmentation {
            if name.is_empty() {
                return Err(ConfigError::Validation {
                    field: "AUGMENTATION".to_string(),
                    message: "augmentation name cannot be empty".to_string(),
                });
            }
        }
        if self.positive_consecutive_threshold.lower > self.positive_consecutive_threshold.upper {
            return Err(ConfigError::Validation {
                field: "POSITIVE_CONSECUTIVE_THRESHOLD".to_string(),
                message: format!(
                    "lower bound {} exceeds upper bound {}",
                    self.positive_consecutive_threshold.lower,
                    self.positive_consecutive_threshold.upper
                ),
            });
        }

        // Augmentation scale and speed normalization
        if !self.augment_lateral_steerings.is_finite() || self.augment_lateral_steerings < 0.0 {
            return Err(ConfigError::Validation {
                field: "AUGMENT_LATERAL_STEERINGS".to_string(),
                message: "must be finite and >= 0".to_string(),
            });
        }
        if !self.speed_factor.is_finite() || self.speed_factor <= 0.0 {
            return Err(ConfigError::Validation {
                field: "SPEED_FACTOR".to_string(),
                message: "must be finite and > 0".to_string(),
            });
        }

        // Optimizer schedule
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ConfigError::Validation {
                field: "LEARNING_RATE".to_string(),
                message: "must be finite and > 0".to_string(),
            });
        }
        if self.learning_rate_decay_interval == 0 {
            return Err(ConfigError::Validation {
                field: "LEARNING_RATE_DECAY_INTERVAL".to_string(),
                message: "must be >= 1".to_string(),
            });
        }
        if !(self.learning_rate_decay_level > 0.0 && self.learning_rate_decay_level <= 1.0) {
            return Err(ConfigError::Validation {
                field: "LEARNING_RATE_DECAY_LEVEL".to_string(),
                message: "must be in (0, 1]".to_string(),
            });
        }

        // Encoder model
        if !model_spec::is_known_model_type(&self.encoder_model_type) {
            return Err(ConfigError::Validation {
                field: "ENCODER_MODEL_TYPE".to_string(),
                message: format!(
                    "unknown model type '{}'. Known types are: {}",
                    self.encoder_model_type,
                    model_spec::KNOWN_MODEL_TYPES.join(", ")
                ),
            });
        }
        self.encoder_model_configuration
            .validate(&self.encoder_model_type)
            .map_err(|e| ConfigError::Validation {
                field: if e.field.is_empty() {
                    "ENCODER_MODEL_CONFIGURATION".to_string()
                } else {
                    format!("ENCODER_MODEL_CONFIGURATION.{}", e.field)
                },
                message: e.message,
            })?;

        Ok(())
    }

    /// Whether a checkpoint is persisted at `iteration`.
    pub fn is_save_iteration(&self, iteration: u64) -> bool {
        self.save_schedule.contains(iteration)
    }

    /// Shape of a named sensor, if declared.
    pub fn sensor(&self, name: &str) -> Option<SensorShape> {
        self.sensors.get(name).copied()
    }

    /// Whether a measurement group is declared.
    pub fn has_measurement(&self, name: &str) -> bool {
        self.measurements.contains_key(name)
    }

    /// Tensor shape of a sensor after frame fusion: consecutive frames
    /// stack along the channel axis.
    pub fn fused_shape(&self, name: &str) -> Option<SensorShape> {
        self.sensors.get(name).map(|s| SensorShape {
            channels: s.channels.saturating_mul(self.frame_fusion_count),
            ..*s
        })
    }

    /// Raw-frame extent covered by one temporal sample.
    pub fn sequence_span(&self) -> u32 {
        self.image_sequence_length
            .saturating_sub(1)
            .saturating_mul(self.sequence_stride)
            .saturating_add(1)
    }
}

/// Decode one document value into its typed field, naming the key on a
/// shape mismatch.
fn field<T: serde::de::DeserializeOwned>(doc: &Mapping, key: &str) -> Result<T, ConfigError> {
    let value = doc.get(key).ok_or_else(|| ConfigError::Schema {
        field: key.to_string(),
        message: "required key is missing".to_string(),
    })?;
    serde_yaml::from_value(value.clone()).map_err(|e| ConfigError::Schema {
        field: key.to_string(),
        message: e.to_string(),
    })
}

/// Decode an optional name key. Absent, null, and the legacy sentinel
/// string "None" all mean no value.
fn optional_name(doc: &Mapping, key: &str) -> Result<Option<String>, ConfigError> {
    match doc.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s == "None" => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ConfigError::Schema {
            field: key.to_string(),
            message: format!("expected a string or null, got {}", value_kind(other)),
        }),
    }
}

/// Check a measurement selection list: no duplicates, every name
/// declared under MEASUREMENTS.
fn check_selection(
    selection: &[String],
    key: &str,
    measurements: &BTreeMap<String, u32>,
) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for (i, name) in selection.iter().enumerate() {
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::Validation {
                field: format!("{}[{}]", key, i),
                message: format!("duplicate entry '{}'", name),
            });
        }
        if !measurements.contains_key(name) {
            return Err(ConfigError::Validation {
                field: format!("{}[{}]", key, i),
                message: format!("'{}' is not declared under MEASUREMENTS", name),
            });
        }
    }
    Ok(())
}

/// YAML node kind for error messages.
fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Errors surfaced by the configuration loader.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// The document could not be read.
    Io { path: String, source: String },
    /// The document is not well-formed YAML, or its root is not a mapping.
    Parse { source: String },
    /// A required key is missing, a key is unknown, or a value has the
    /// wrong shape. Names the offending key.
    Schema { field: String, message: String },
    /// A decoded value violates a record invariant. Names the field,
    /// dotted for nested locations.
    Validation { field: String, message: String },
}

impl ConfigError {
    /// Key or field the error names, where one exists.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::Schema { field, .. } | ConfigError::Validation { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path, source)
            }
            ConfigError::Parse { source } => {
                write!(f, "Failed to parse config YAML: {}", source)
            }
            ConfigError::Schema { field, message } => {
                write!(f, "Config schema error in '{}': {}", field, message)
            }
            ConfigError::Validation { field, message } => {
                write!(f, "Config validation error in '{}': {}", field, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_loads() {
        let config = TrainingConfig::baseline();
        assert_eq!(config.batch_size, 120);
        assert_eq!(config.num_iterations, 100_001);
        assert_eq!(config.encoder_model_type, "stdim");
        assert_eq!(
            config.save_schedule.iterations(),
            &[0, 20_000, 40_000, 60_000, 80_000, 100_000]
        );
        assert_eq!(config.sensor("rgb"), Some(SensorShape::new(3, 88, 200)));
        assert!(config.augmentation.is_none());
        assert!(config.has_measurement("steer"));
        assert!(!config.has_measurement("yaw"));
    }

    #[test]
    fn test_is_save_iteration() {
        let config = TrainingConfig::baseline();
        assert!(config.is_save_iteration(0));
        assert!(config.is_save_iteration(20_000));
        assert!(!config.is_save_iteration(20_001));
    }

    #[test]
    fn test_fused_shape_multiplies_channels() {
        let mut config = TrainingConfig::baseline();
        config.frame_fusion_count = 3;
        assert_eq!(config.fused_shape("rgb"), Some(SensorShape::new(9, 88, 200)));
        assert_eq!(config.fused_shape("lidar"), None);
    }

    #[test]
    fn test_sequence_span() {
        let mut config = TrainingConfig::baseline();
        assert_eq!(config.sequence_span(), 1);
        config.image_sequence_length = 4;
        config.sequence_stride = 3;
        assert_eq!(config.sequence_span(), 10);
    }

    #[test]
    fn test_validate_zero_batch_size() {
        let mut config = TrainingConfig::baseline();
        config.batch_size = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("BATCH_SIZE"));
    }

    #[test]
    fn test_validate_schedule_order() {
        let mut config = TrainingConfig::baseline();
        config.save_schedule = SaveSchedule::from_iterations(vec![0, 10, 10]);
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("SAVE_SCHEDULE"));
    }

    #[test]
    fn test_validate_schedule_bound() {
        let mut config = TrainingConfig::baseline();
        config.save_schedule = SaveSchedule::from_iterations(vec![0, 200_000]);
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("SAVE_SCHEDULE"));
    }

    #[test]
    fn test_validate_duplicate_target() {
        let mut config = TrainingConfig::baseline();
        config.targets = vec!["steer".to_string(), "steer".to_string()];
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("TARGETS[1]"));
    }

    #[test]
    fn test_validate_unknown_model_type() {
        let mut config = TrainingConfig::baseline();
        config.encoder_model_type = "vae".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("ENCODER_MODEL_TYPE"));
        assert!(format!("{}", err).contains("stdim"));
    }

    #[test]
    fn test_targets_and_inputs_may_overlap() {
        let mut config = TrainingConfig::baseline();
        config.inputs = vec!["speed_module".to_string(), "steer".to_string()];
        config.validate().unwrap();
    }

    #[test]
    fn test_error_display_names_field() {
        let err = ConfigError::Validation {
            field: "LEARNING_RATE".to_string(),
            message: "must be finite and > 0".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("LEARNING_RATE"));
        assert!(msg.contains("> 0"));
    }
}
