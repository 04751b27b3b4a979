//! Encoder Store - persisted per-attribute encoders
//!
//! One JSON artifact per categorical attribute, `<attribute>_encoder.json`,
//! inside the artifact directory. Training writes them, every later process
//! reads them back verbatim.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use serde::Serialize;

use super::categorical::{CategoricalEncoder, Encoded, EncoderArtifact};
use crate::error::{ArtifactKind, NidsError, Result};
use crate::logic::features::layout::{is_categorical, CATEGORICAL_ATTRIBUTES};

/// Path of the artifact for `attribute` inside `dir`
pub fn artifact_path(dir: &Path, attribute: &str) -> PathBuf {
    dir.join(format!("{}_encoder.json", attribute))
}

/// Write-new-then-rename so readers never see a half-written file
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = staging_path(path);
    let json = serde_json::to_vec_pretty(value)?;
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[derive(Debug, Clone)]
pub struct EncoderStore {
    dir: PathBuf,
    encoders: BTreeMap<String, CategoricalEncoder>,
}

impl EncoderStore {
    /// Empty store rooted at `dir`; nothing is read yet
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            encoders: BTreeMap::new(),
        }
    }

    /// Load every categorical attribute. Any missing artifact is fatal.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self::new(dir);
        for attribute in CATEGORICAL_ATTRIBUTES {
            store.load(attribute)?;
        }
        Ok(store)
    }

    /// Load what is available and report the attributes that are not.
    /// Only for the explicitly degraded mode; see `EngineConfig::allow_degraded_encoders`.
    pub fn open_partial(dir: impl Into<PathBuf>) -> Result<(Self, Vec<&'static str>)> {
        let mut store = Self::new(dir);
        let mut missing = Vec::new();

        for attribute in CATEGORICAL_ATTRIBUTES {
            match store.load(attribute) {
                Ok(_) => {}
                Err(NidsError::MissingArtifact { path, .. }) => {
                    log::warn!(
                        "Encoder for '{}' not found at {} - column will be flat 0 (degraded)",
                        attribute,
                        path.display()
                    );
                    missing.push(attribute);
                }
                Err(e) => return Err(e),
            }
        }

        Ok((store, missing))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a persisted artifact exists for `attribute`
    pub fn exists(&self, attribute: &str) -> bool {
        artifact_path(&self.dir, attribute).is_file()
    }

    /// Read the persisted artifact for `attribute` and keep it in memory
    pub fn load(&mut self, attribute: &str) -> Result<&CategoricalEncoder> {
        ensure_categorical(attribute)?;

        let path = artifact_path(&self.dir, attribute);
        if !path.is_file() {
            return Err(NidsError::MissingArtifact {
                kind: ArtifactKind::Encoder,
                path,
            });
        }

        let data = fs::read(&path)?;
        let artifact: EncoderArtifact = serde_json::from_slice(&data)?;

        if artifact.attribute != attribute {
            return Err(NidsError::invalid_encoder(format!(
                "{} holds encoder for '{}', expected '{}'",
                path.display(),
                artifact.attribute,
                attribute
            )));
        }

        let encoder = CategoricalEncoder::from_artifact(artifact)?;
        log::info!(
            "Loaded encoder '{}' ({} classes) from {}",
            attribute,
            encoder.len(),
            path.display()
        );

        self.encoders.insert(attribute.to_string(), encoder);
        Ok(&self.encoders[attribute])
    }

    /// Build a fresh mapping and persist it, replacing any previous one
    pub fn fit<I, S>(&mut self, attribute: &str, values: I) -> Result<&CategoricalEncoder>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ensure_categorical(attribute)?;

        let encoder = CategoricalEncoder::fit(attribute, values)?;
        let path = artifact_path(&self.dir, attribute);
        write_json_atomic(&path, &encoder.to_artifact())?;

        log::info!(
            "Fitted encoder '{}' ({} classes) -> {}",
            attribute,
            encoder.len(),
            path.display()
        );

        self.encoders.insert(attribute.to_string(), encoder);
        Ok(&self.encoders[attribute])
    }

    /// Persist already-fitted encoders as one set. Every artifact is staged
    /// before any is renamed into place; a staging failure leaves the
    /// previous artifacts untouched.
    pub fn install(&mut self, encoders: Vec<CategoricalEncoder>) -> Result<()> {
        for encoder in &encoders {
            ensure_categorical(encoder.attribute())?;
        }
        fs::create_dir_all(&self.dir)?;

        let mut staged = Vec::with_capacity(encoders.len());
        for encoder in &encoders {
            let path = artifact_path(&self.dir, encoder.attribute());
            let tmp = staging_path(&path);
            let written = serde_json::to_vec_pretty(&encoder.to_artifact())
                .map_err(NidsError::from)
                .and_then(|json| fs::write(&tmp, json).map_err(NidsError::from));
            if let Err(e) = written {
                for (tmp, _) in &staged {
                    let _ = fs::remove_file(tmp);
                }
                let _ = fs::remove_file(&tmp);
                return Err(e);
            }
            staged.push((tmp, path));
        }

        for (tmp, path) in &staged {
            fs::rename(tmp, path)?;
        }

        for encoder in encoders {
            log::info!(
                "Fitted encoder '{}' ({} classes) -> {}",
                encoder.attribute(),
                encoder.len(),
                artifact_path(&self.dir, encoder.attribute()).display()
            );
            self.encoders.insert(encoder.attribute().to_string(), encoder);
        }
        Ok(())
    }

    pub fn get(&self, attribute: &str) -> Option<&CategoricalEncoder> {
        self.encoders.get(attribute)
    }

    /// Encode `value`. An unseen value is `Encoded::Unknown`, never an error;
    /// an attribute with no loaded encoder is.
    pub fn transform(&self, attribute: &str, value: &str) -> Result<Encoded> {
        match self.encoders.get(attribute) {
            Some(encoder) => Ok(encoder.transform(value)),
            None => Err(NidsError::MissingArtifact {
                kind: ArtifactKind::Encoder,
                path: artifact_path(&self.dir, attribute),
            }),
        }
    }

    pub fn is_complete(&self) -> bool {
        CATEGORICAL_ATTRIBUTES
            .iter()
            .all(|a| self.encoders.contains_key(*a))
    }

    /// Vocabulary sizes, for status output
    pub fn summary(&self) -> BTreeMap<String, usize> {
        self.encoders
            .iter()
            .map(|(name, enc)| (name.clone(), enc.len()))
            .collect()
    }
}

fn ensure_categorical(attribute: &str) -> Result<()> {
    if is_categorical(attribute) {
        Ok(())
    } else {
        Err(NidsError::UnknownAttribute(attribute.to_string()))
    }
}
