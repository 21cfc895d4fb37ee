//! Generic owner of a set of trainables with hash-gated retraining.

use std::path::PathBuf;

use crate::error::Result;
use crate::train_data::TrainData;
use crate::trainable::{read_hash, write_hash, Trainable};
use crate::util::lines_hash;

/// Holds trained objects plus the queue of objects whose source lines
/// changed since their artifacts were written.
#[derive(Debug)]
pub struct TrainingManager<T: Trainable> {
    cache: PathBuf,
    objects: Vec<T>,
    to_train: Vec<T>,
    train_data: TrainData,
}

impl<T: Trainable> TrainingManager<T> {
    pub fn new(cache: PathBuf) -> Self {
        Self {
            cache,
            objects: Vec::new(),
            to_train: Vec::new(),
            train_data: TrainData::new(),
        }
    }

    /// Register (or re-register) an object's source lines. When the
    /// on-disk hash matches, the persisted artifacts are loaded instead
    /// of queueing a retrain.
    pub fn add(&mut self, name: &str, lines: &[String]) {
        self.objects.retain(|o| o.name() != name);
        self.to_train.retain(|o| o.name() != name);
        self.train_data.add_lines(name, lines);

        let hash = lines_hash(lines);
        if read_hash(&self.cache, name) == Some(hash) {
            match T::from_file(name, hash, &self.cache) {
                Ok(obj) => {
                    self.objects.push(obj);
                    return;
                }
                Err(err) => {
                    log::warn!("cached model for {name} unusable ({err}); retraining");
                }
            }
        }
        self.to_train.push(T::create(name, hash));
    }

    pub fn remove(&mut self, name: &str) {
        self.objects.retain(|o| o.name() != name);
        self.to_train.retain(|o| o.name() != name);
        self.train_data.remove_lines(name);
    }

    /// Train and persist every stale object. The hash file is written
    /// after the artifacts, so an interrupted run retrains next time.
    pub fn train(&mut self) -> Result<()> {
        if !self.is_dirty() {
            return Ok(());
        }
        while let Some(mut obj) = self.to_train.pop() {
            log::debug!("training {}", obj.name());
            obj.train(&self.train_data);
            let persisted = obj
                .save(&self.cache)
                .and_then(|_| write_hash(&self.cache, obj.name(), obj.source_hash()));
            if let Err(err) = persisted {
                self.to_train.push(obj);
                return Err(err);
            }
            self.objects.push(obj);
        }
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        !self.to_train.is_empty()
    }

    pub fn objects(&self) -> &[T] {
        &self.objects
    }

    pub fn find(&self, name: &str) -> Option<&T> {
        self.objects.iter().find(|o| o.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.objects
            .iter()
            .map(|o| o.name())
            .chain(self.to_train.iter().map(|o| o.name()))
            .collect()
    }
}
