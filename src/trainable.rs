//! Shared training contract for intents and entities.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::train_data::TrainData;

/// 4-byte content hash of an object's source lines.
pub type SourceHash = [u8; 4];

/// An object the [`TrainingManager`](crate::training_manager::TrainingManager)
/// can build, retrain, persist and reload. The source hash decides
/// whether a persisted artifact is still current.
pub trait Trainable: Sized {
    fn name(&self) -> &str;
    fn source_hash(&self) -> SourceHash;

    /// Fresh untrained object.
    fn create(name: &str, hash: SourceHash) -> Self;

    /// Rebuild from artifacts under `cache`. Any missing file is fatal
    /// for this object and forces a retrain.
    fn from_file(name: &str, hash: SourceHash, cache: &Path) -> Result<Self>;

    fn train(&mut self, data: &TrainData);

    /// Persist everything except the hash file; the manager writes that
    /// last, so a crash mid-save never marks a stale artifact clean.
    fn save(&self, cache: &Path) -> Result<()>;
}

pub fn hash_path(cache: &Path, name: &str) -> PathBuf {
    cache.join(format!("{name}.hash"))
}

pub fn read_hash(cache: &Path, name: &str) -> Option<SourceHash> {
    let bytes = fs::read(hash_path(cache, name)).ok()?;
    bytes.try_into().ok()
}

pub fn write_hash(cache: &Path, name: &str, hash: SourceHash) -> Result<()> {
    fs::write(hash_path(cache, name), hash)?;
    Ok(())
}
