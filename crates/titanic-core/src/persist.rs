//! Binary artifact codec for fitted models.
//!
//! Layout: `TTNC` magic, little-endian `u32` format version, little-endian
//! `u32` CRC-32 of the payload, then the bincode-encoded model state.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{Result, TitanicError};
use crate::features::{ColumnSelector, FeatureEncoder};
use crate::forest::RandomForest;
use crate::model::{Fitted, ModelParams, TitanicModel};

const MAGIC: &[u8; 4] = b"TTNC";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 12;

#[derive(Serialize)]
struct ArtifactRef<'a> {
    params: &'a ModelParams,
    selector: &'a ColumnSelector,
    encoder: &'a FeatureEncoder,
    forest: &'a RandomForest,
}

#[derive(Deserialize)]
struct Artifact {
    params: ModelParams,
    selector: ColumnSelector,
    encoder: FeatureEncoder,
    forest: RandomForest,
}

/// Serializes a fitted model. Unfit models cannot be encoded.
pub fn encode(model: &TitanicModel) -> Result<Vec<u8>> {
    let fitted = model.fitted()?;
    let params = model.params();
    let artifact = ArtifactRef {
        params: &params,
        selector: model.selector(),
        encoder: &fitted.encoder,
        forest: &fitted.forest,
    };

    let payload = bincode::serde::encode_to_vec(&artifact, bincode::config::standard())
        .map_err(|e| TitanicError::ArtifactCorrupt(format!("failed to encode model: {e}")))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Reconstructs a fitted model from bytes produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<TitanicModel> {
    if bytes.len() < HEADER_LEN {
        return Err(TitanicError::ArtifactCorrupt(format!(
            "artifact is {} bytes, shorter than its header",
            bytes.len()
        )));
    }
    let (header, payload) = bytes.split_at(HEADER_LEN);

    if &header[0..4] != MAGIC {
        return Err(TitanicError::ArtifactCorrupt("bad magic".into()));
    }
    let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if version != FORMAT_VERSION {
        return Err(TitanicError::ArtifactCorrupt(format!(
            "unsupported format version {version}"
        )));
    }
    let expected_crc = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);
    let actual_crc = crc32fast::hash(payload);
    if expected_crc != actual_crc {
        return Err(TitanicError::ArtifactCorrupt(format!(
            "checksum mismatch: expected {expected_crc:08x}, got {actual_crc:08x}"
        )));
    }

    let (artifact, consumed): (Artifact, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())
            .map_err(|e| TitanicError::ArtifactCorrupt(e.to_string()))?;
    if consumed != payload.len() {
        return Err(TitanicError::ArtifactCorrupt(format!(
            "{} trailing bytes after model state",
            payload.len() - consumed
        )));
    }

    artifact.params.validate()?;
    check_consistency(&artifact)?;

    Ok(TitanicModel::from_parts(
        artifact.params,
        artifact.selector,
        Fitted {
            encoder: artifact.encoder,
            forest: artifact.forest,
        },
    ))
}

/// Cross-checks the decoded parts so a loaded model can always predict.
fn check_consistency(artifact: &Artifact) -> Result<()> {
    let encoded: Vec<&str> = artifact
        .encoder
        .encodings()
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();
    if artifact.selector.columns().iter().map(String::as_str).ne(encoded.iter().copied()) {
        return Err(TitanicError::ArtifactCorrupt(format!(
            "selector columns {:?} do not match encoder columns {encoded:?}",
            artifact.selector.columns()
        )));
    }
    if artifact.forest.n_features() != artifact.encoder.n_features() {
        return Err(TitanicError::ArtifactCorrupt(format!(
            "forest expects {} features but encoder produces {}",
            artifact.forest.n_features(),
            artifact.encoder.n_features()
        )));
    }
    if artifact.forest.n_trees() != artifact.params.n_trees {
        return Err(TitanicError::ArtifactCorrupt(format!(
            "forest holds {} trees but parameters ask for {}",
            artifact.forest.n_trees(),
            artifact.params.n_trees
        )));
    }
    artifact.forest.validate()
}

/// Writes `bytes` to `path` through a temporary file in the same directory,
/// so readers never observe a partially written artifact.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent)?;
            parent
        }
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| TitanicError::Io(e.error))?;
    Ok(())
}

/// Reads the raw artifact bytes, mapping a missing file to
/// [`TitanicError::ArtifactNotFound`].
pub fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TitanicError::ArtifactNotFound {
            path: path.to_path_buf(),
        },
        _ => TitanicError::Io(e),
    })
}
