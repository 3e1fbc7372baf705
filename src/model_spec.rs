// src/model_spec.rs
//
// Encoder model selection and the per-module architecture mapping.
//
// The architecture mapping is intentionally loose: its deep shape varies
// per model type and is consumed by the external model assembler. This
// module pins down only what every consumer relies on:
// - the model type tag is one of the known, stable strings
// - the modules required by that type are present
// - any `fc` block declares matching `neurons` / `dropouts` lists

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;

/// All known encoder model type tags.
/// These are stable strings that must not change across versions.
pub const KNOWN_MODEL_TYPES: &[&str] = &["stdim", "coil-icra"];

/// Model type descriptions for the `keys` subcommand.
pub const MODEL_TYPE_DESCRIPTIONS: &[(&str, &str)] = &[
    (
        "stdim",
        "Spatio-temporal contrastive encoder over stacked camera frames",
    ),
    (
        "coil-icra",
        "Conditional imitation branches over a perception backbone",
    ),
];

/// Module keys each model type requires in its architecture mapping.
const REQUIRED_MODULES: &[(&str, &[&str])] = &[
    ("stdim", &["perception"]),
    ("coil-icra", &["perception", "measurements", "join", "branches"]),
];

/// Whether a model type tag is registered.
pub fn is_known_model_type(tag: &str) -> bool {
    KNOWN_MODEL_TYPES.contains(&tag)
}

/// Module keys required by a model type (empty for unknown tags).
pub fn required_modules(tag: &str) -> &'static [&'static str] {
    REQUIRED_MODULES
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, modules)| *modules)
        .unwrap_or(&[])
}

/// Print the known model types and their descriptions.
pub fn print_model_types() {
    println!("Known encoder model types:");
    println!();
    for (tag, desc) in MODEL_TYPE_DESCRIPTIONS {
        println!("  {:<12} {}", tag, desc);
    }
}

/// Per-module architecture mapping (module name -> module spec).
///
/// Opaque beyond the structural checks in [`validate`](Self::validate).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncoderModelConfiguration {
    modules: BTreeMap<String, Value>,
}

impl EncoderModelConfiguration {
    /// Spec of a named module, if declared.
    pub fn module(&self, name: &str) -> Option<&Value> {
        self.modules.get(name)
    }

    /// Declared module names, sorted.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Structural checks for the given model type.
    ///
    /// Error fields are dotted paths relative to the mapping root, e.g.
    /// `branches.fc.dropouts`; an empty field refers to the mapping
    /// itself.
    pub fn validate(&self, model_type: &str) -> Result<(), ModelSpecError> {
        if self.modules.is_empty() {
            return Err(ModelSpecError {
                field: String::new(),
                message: "at least one module is required".to_string(),
            });
        }

        for required in required_modules(model_type) {
            if !self.modules.contains_key(*required) {
                return Err(ModelSpecError {
                    field: (*required).to_string(),
                    message: format!("module is required by model type '{}'", model_type),
                });
            }
        }

        for (name, spec) in &self.modules {
            let map = spec.as_mapping().ok_or_else(|| ModelSpecError {
                field: name.clone(),
                message: "module spec must be a mapping".to_string(),
            })?;
            if let Some(fc) = map.get("fc") {
                validate_fc_block(name, fc)?;
            }
        }

        Ok(())
    }
}

/// Check an `fc` block: `neurons` (positive integers) and `dropouts`
/// (floats in [0, 1)) must both be present, with equal lengths.
fn validate_fc_block(module: &str, fc: &Value) -> Result<(), ModelSpecError> {
    let err = |field: String, message: String| ModelSpecError { field, message };

    let map = fc.as_mapping().ok_or_else(|| {
        err(
            format!("{}.fc", module),
            "fc block must be a mapping".to_string(),
        )
    })?;

    let neurons = map.get("neurons").ok_or_else(|| {
        err(
            format!("{}.fc.neurons", module),
            "fc block must declare neurons".to_string(),
        )
    })?;
    let neurons = neurons.as_sequence().ok_or_else(|| {
        err(
            format!("{}.fc.neurons", module),
            "neurons must be a sequence of integers".to_string(),
        )
    })?;
    for (i, width) in neurons.iter().enumerate() {
        match width.as_u64() {
            Some(w) if w >= 1 => {}
            _ => {
                return Err(err(
                    format!("{}.fc.neurons[{}]", module, i),
                    "layer width must be an integer >= 1".to_string(),
                ))
            }
        }
    }

    let dropouts = map.get("dropouts").ok_or_else(|| {
        err(
            format!("{}.fc.dropouts", module),
            "fc block must declare dropouts".to_string(),
        )
    })?;
    let dropouts = dropouts.as_sequence().ok_or_else(|| {
        err(
            format!("{}.fc.dropouts", module),
            "dropouts must be a sequence of floats".to_string(),
        )
    })?;
    for (i, rate) in dropouts.iter().enumerate() {
        match rate.as_f64() {
            Some(r) if (0.0..1.0).contains(&r) => {}
            _ => {
                return Err(err(
                    format!("{}.fc.dropouts[{}]", module, i),
                    "dropout rate must be in [0, 1)".to_string(),
                ))
            }
        }
    }

    if neurons.len() != dropouts.len() {
        return Err(err(
            format!("{}.fc", module),
            format!(
                "neurons ({}) and dropouts ({}) must have the same length",
                neurons.len(),
                dropouts.len()
            ),
        ));
    }

    Ok(())
}

/// Structural error in a model architecture mapping.
#[derive(Debug, Clone)]
pub struct ModelSpecError {
    /// Dotted path relative to the mapping root; empty for the root.
    pub field: String,
    pub message: String,
}

impl fmt::Display for ModelSpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "Model configuration error: {}", self.message)
        } else {
            write!(
                f,
                "Model configuration error in '{}': {}",
                self.field, self.message
            )
        }
    }
}

impl std::error::Error for ModelSpecError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> EncoderModelConfiguration {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_stdim_minimal() {
        let config = parse(
            r#"
perception:
  res:
    name: resnet34
    num_classes: 512
"#,
        );
        config.validate("stdim").unwrap();
        assert!(config.module("perception").is_some());
        assert!(config.module("branches").is_none());
    }

    #[test]
    fn test_stdim_missing_perception() {
        let config = parse(
            r#"
backbone:
  res:
    name: resnet34
"#,
        );
        let err = config.validate("stdim").unwrap_err();
        assert_eq!(err.field, "perception");
    }

    #[test]
    fn test_coil_icra_full() {
        let config = parse(
            r#"
perception:
  res:
    name: resnet34
    num_classes: 512
measurements:
  fc:
    neurons: [128, 128]
    dropouts: [0.0, 0.0]
join:
  fc:
    neurons: [512]
    dropouts: [0.0]
branches:
  number_of_branches: 4
  fc:
    neurons: [256, 256]
    dropouts: [0.0, 0.5]
"#,
        );
        config.validate("coil-icra").unwrap();
    }

    #[test]
    fn test_coil_icra_missing_branches() {
        let config = parse(
            r#"
perception:
  res:
    name: resnet34
measurements:
  fc:
    neurons: [128]
    dropouts: [0.0]
join:
  fc:
    neurons: [512]
    dropouts: [0.0]
"#,
        );
        let err = config.validate("coil-icra").unwrap_err();
        assert_eq!(err.field, "branches");
    }

    #[test]
    fn test_empty_mapping_rejected() {
        let config = EncoderModelConfiguration::default();
        let err = config.validate("stdim").unwrap_err();
        assert!(err.field.is_empty());
    }

    #[test]
    fn test_module_must_be_mapping() {
        let config = parse(
            r#"
perception: resnet34
"#,
        );
        let err = config.validate("stdim").unwrap_err();
        assert_eq!(err.field, "perception");
        assert!(err.message.contains("mapping"));
    }

    #[test]
    fn test_fc_length_mismatch() {
        let config = parse(
            r#"
perception:
  fc:
    neurons: [256, 256]
    dropouts: [0.0]
"#,
        );
        let err = config.validate("stdim").unwrap_err();
        assert_eq!(err.field, "perception.fc");
        assert!(err.message.contains("same length"));
    }

    #[test]
    fn test_fc_dropout_out_of_range() {
        let config = parse(
            r#"
perception:
  fc:
    neurons: [256, 256]
    dropouts: [0.0, 1.0]
"#,
        );
        let err = config.validate("stdim").unwrap_err();
        assert_eq!(err.field, "perception.fc.dropouts[1]");
    }

    #[test]
    fn test_fc_zero_width_layer() {
        let config = parse(
            r#"
perception:
  fc:
    neurons: [256, 0]
    dropouts: [0.0, 0.0]
"#,
        );
        let err = config.validate("stdim").unwrap_err();
        assert_eq!(err.field, "perception.fc.neurons[1]");
    }

    #[test]
    fn test_fc_missing_dropouts() {
        let config = parse(
            r#"
perception:
  fc:
    neurons: [256]
"#,
        );
        let err = config.validate("stdim").unwrap_err();
        assert_eq!(err.field, "perception.fc.dropouts");
    }

    #[test]
    fn test_registry() {
        assert!(is_known_model_type("stdim"));
        assert!(is_known_model_type("coil-icra"));
        assert!(!is_known_model_type("resnet"));
        assert_eq!(required_modules("stdim"), &["perception"]);
        assert!(required_modules("unknown").is_empty());
        // every known type has a description and a module table
        for tag in KNOWN_MODEL_TYPES {
            assert!(MODEL_TYPE_DESCRIPTIONS.iter().any(|(t, _)| t == tag));
            assert!(!required_modules(tag).is_empty());
        }
    }
}
