//! Analysis results keyed by analysis name

use std::collections::BTreeMap;
use std::path::Path;

use super::types::AnalysisResult;
use crate::data::{read_json_or_default, write_json};
use crate::error::StoreError;
use crate::movement::UpsertOutcome;

/// Latest result per analysis name, iterated in name order
#[derive(Debug, Clone, Default)]
pub struct AnalysisStore {
    results: BTreeMap<String, AnalysisResult>,
}

impl AnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; a missing file is an empty store
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let results: Vec<AnalysisResult> = read_json_or_default(path.as_ref())?;
        let mut store = Self::new();
        store.upsert_all(results);
        Ok(store)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let results: Vec<&AnalysisResult> = self.results.values().collect();
        write_json(path.as_ref(), &results)
    }

    pub fn upsert(&mut self, result: AnalysisResult) -> UpsertOutcome {
        match self.results.insert(result.analysis_name.clone(), result) {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        }
    }

    /// Upsert a batch, returning (inserted, updated)
    pub fn upsert_all(&mut self, results: impl IntoIterator<Item = AnalysisResult>) -> (usize, usize) {
        results
            .into_iter()
            .fold((0, 0), |(inserted, updated), result| match self.upsert(result) {
                UpsertOutcome::Inserted => (inserted + 1, updated),
                UpsertOutcome::Updated => (inserted, updated + 1),
            })
    }

    pub fn get(&self, name: &str) -> Option<&AnalysisResult> {
        self.results.get(name)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.results.values()
    }

    pub fn to_vec(&self) -> Vec<AnalysisResult> {
        self.iter().cloned().collect()
    }
}
