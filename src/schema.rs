// src/schema.rs
//
// Document key registry for the training configuration.
//
// Keys are SCREAMING_SNAKE_CASE and case-sensitive; the tables below are
// the single source of truth for which keys a document may carry. Order
// follows the record fields, and missing keys are reported in that
// order.

use serde_yaml::Mapping;

use crate::config::ConfigError;

/// Keys every document must carry.
/// These are stable strings that must not change across versions.
pub const REQUIRED_KEYS: &[&str] = &[
    "SAVE_SCHEDULE",
    "NUM_LOADING_WORKERS",
    "SEED",
    "SENSORS",
    "MEASUREMENTS",
    "COMMANDS",
    "BATCH_SIZE",
    "NUMBER_ITERATIONS",
    "TARGETS",
    "INPUTS",
    "FRAME_FUSION_COUNT",
    "IMAGE_SEQUENCE_LENGTH",
    "SEQUENCE_STRIDE",
    "AUGMENT_LATERAL_STEERINGS",
    "SPEED_FACTOR",
    "DATASET_NAME",
    "DATA_USED",
    "USE_NOISE_DATA",
    "EXPERIENCE_FILES",
    "POSITIVE_CONSECUTIVE_THRESHOLD",
    "PRETRAINED",
    "ENCODER_MODEL_TYPE",
    "ENCODER_MODEL_CONFIGURATION",
    "LEARNING_RATE",
    "LEARNING_RATE_DECAY_INTERVAL",
    "LEARNING_RATE_THRESHOLD",
    "LEARNING_RATE_DECAY_LEVEL",
    "IMAGE_CUT",
    "USE_ORACLE",
    "USE_FULL_ORACLE",
    "AVOID_STOPPING",
];

/// Keys a document may carry.
pub const OPTIONAL_KEYS: &[&str] = &["AUGMENTATION"];

/// Whether a key is in either table.
pub fn is_known_key(name: &str) -> bool {
    REQUIRED_KEYS.contains(&name) || OPTIONAL_KEYS.contains(&name)
}

/// Audit a parsed document against the key tables.
///
/// Checks, in order: all keys are strings, every required key is
/// present (first missing wins, table order), no unknown keys. Value
/// shapes are not checked here.
pub fn audit_keys(doc: &Mapping) -> Result<(), ConfigError> {
    for key in doc.keys() {
        if key.as_str().is_none() {
            return Err(ConfigError::Schema {
                field: format!("{:?}", key),
                message: "document keys must be strings".to_string(),
            });
        }
    }

    for required in REQUIRED_KEYS {
        if !doc.contains_key(*required) {
            return Err(ConfigError::Schema {
                field: (*required).to_string(),
                message: "required key is missing".to_string(),
            });
        }
    }

    for key in doc.keys() {
        if let Some(name) = key.as_str() {
            if !is_known_key(name) {
                return Err(ConfigError::Schema {
                    field: name.to_string(),
                    message: "unknown key".to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Print the key tables and the known model types.
pub fn print_keys() {
    println!("Required document keys:");
    for key in REQUIRED_KEYS {
        println!("  {}", key);
    }
    println!();
    println!("Optional document keys:");
    for key in OPTIONAL_KEYS {
        println!("  {}", key);
    }
    println!();
    crate::model_spec::print_model_types();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;

    fn mapping_with_all_keys() -> Mapping {
        let mut doc = Mapping::new();
        for key in REQUIRED_KEYS {
            doc.insert(Value::from(*key), Value::Null);
        }
        doc
    }

    #[test]
    fn test_audit_accepts_all_required() {
        let doc = mapping_with_all_keys();
        audit_keys(&doc).unwrap();
    }

    #[test]
    fn test_audit_accepts_optional() {
        let mut doc = mapping_with_all_keys();
        doc.insert(Value::from("AUGMENTATION"), Value::Null);
        audit_keys(&doc).unwrap();
    }

    #[test]
    fn test_audit_reports_first_missing_in_table_order() {
        let mut doc = mapping_with_all_keys();
        doc.remove("NUMBER_ITERATIONS");
        doc.remove("BATCH_SIZE");
        let err = audit_keys(&doc).unwrap_err();
        match err {
            ConfigError::Schema { field, .. } => assert_eq!(field, "BATCH_SIZE"),
            other => panic!("expected Schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_audit_rejects_unknown_key() {
        let mut doc = mapping_with_all_keys();
        doc.insert(Value::from("BATCH_SIZES"), Value::from(8));
        let err = audit_keys(&doc).unwrap_err();
        match err {
            ConfigError::Schema { field, message } => {
                assert_eq!(field, "BATCH_SIZES");
                assert!(message.contains("unknown"));
            }
            other => panic!("expected Schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_audit_rejects_non_string_key() {
        let mut doc = mapping_with_all_keys();
        doc.insert(Value::from(42), Value::Null);
        assert!(audit_keys(&doc).is_err());
    }

    #[test]
    fn test_key_tables_disjoint() {
        for key in OPTIONAL_KEYS {
            assert!(!REQUIRED_KEYS.contains(key));
        }
    }
}
