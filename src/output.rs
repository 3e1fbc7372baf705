// src/output.rs
//
// Provenance artifacts for a resolved training configuration.
//
// The loader itself never writes. These helpers are invoked explicitly
// by the front-end binaries (or an external trainer) to record what a
// run was configured with:
// - config_resolved.yaml: normalized document (range shorthand expanded,
//   sentinels gone, keys in canonical order)
// - load_info.json: crate version, source path, fingerprint
// - <base>/<dataset>/<fp[..8]>/: per-config artifact directory

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::TrainingConfig;

/// Name of the normalized document artifact.
pub const CONFIG_RESOLVED_FILE: &str = "config_resolved.yaml";

/// Name of the load provenance artifact.
pub const LOAD_INFO_FILE: &str = "load_info.json";

/// SHA-256 fingerprint of a configuration record, lowercase hex.
///
/// Hashes the normalized YAML serialization, so equal records
/// fingerprint identically regardless of the document text they were
/// loaded from.
pub fn config_fingerprint(config: &TrainingConfig) -> serde_yaml::Result<String> {
    let canonical = config.to_yaml_string()?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let hash = hasher.finalize();
    Ok(hex_encode(&hash))
}

/// Provenance for one configuration load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadInfo {
    /// Crate version that performed the load.
    pub version: String,
    /// Document the record was loaded from.
    pub source_path: String,
    /// SHA-256 fingerprint of the loaded record.
    pub sha256: String,
}

impl LoadInfo {
    /// Capture load info for a record loaded from `source_path`.
    pub fn capture(source_path: &Path, fingerprint: &str) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            source_path: source_path.display().to_string(),
            sha256: fingerprint.to_string(),
        }
    }
}

/// Write the normalized YAML document for a record.
pub fn write_config_resolved<P: AsRef<Path>>(
    path: P,
    config: &TrainingConfig,
) -> std::io::Result<()> {
    let text = config
        .to_yaml_string()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let mut file = File::create(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

/// Write load_info.json.
pub fn write_load_info<P: AsRef<Path>>(path: P, info: &LoadInfo) -> std::io::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, info)?;
    Ok(())
}

/// Create the artifact directory for a record.
///
/// Creates: <base>/<dataset_name>/<fingerprint[..8]>/
pub fn create_resolved_dir(
    base_dir: &Path,
    dataset_name: &str,
    fingerprint: &str,
) -> std::io::Result<PathBuf> {
    let short = &fingerprint[..fingerprint.len().min(8)];
    let path = base_dir.join(dataset_name).join(short);
    fs::create_dir_all(&path)?;
    Ok(path)
}

/// Hex-encode bytes.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
