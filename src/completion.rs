use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use tracing::{info, warn};

use crate::storage::{Persisted, Storage};

pub const COMPLETED_MODULES_KEY: &str = "completedModules";

/// workshop id -> passed module indices, stored as strings
pub type CompletionRecord = BTreeMap<String, BTreeSet<String>>;

/// Passed modules per learner. Entries only grow, except when a workshop's
/// record is cleared as a whole.
pub struct CompletionTracker {
    storage: Arc<dyn Storage>,
    records: Persisted<BTreeMap<String, CompletionRecord>>,
}

impl CompletionTracker {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let records = Persisted::load(storage.as_ref(), COMPLETED_MODULES_KEY);
        Self { storage, records }
    }

    /// Returns true if the module was not complete before.
    pub fn mark_complete(&mut self, learner: &str, workshop_id: &str, module: u32) -> bool {
        if self.is_complete(learner, workshop_id, module) {
            return false;
        }
        self.records.update(self.storage.as_ref(), |records| {
            records
                .entry(learner.to_string())
                .or_default()
                .entry(workshop_id.to_string())
                .or_default()
                .insert(module.to_string())
        });
        info!("{} completed {} module {}", learner, workshop_id, module);
        true
    }

    /// Forget every passed module of a workshop. Returns whether anything was removed.
    pub fn clear(&mut self, learner: &str, workshop_id: &str) -> bool {
        let present = self
            .records
            .get()
            .get(learner)
            .is_some_and(|r| r.contains_key(workshop_id));
        if !present {
            return false;
        }
        self.records.update(self.storage.as_ref(), |records| {
            if let Some(record) = records.get_mut(learner) {
                record.remove(workshop_id);
                if record.is_empty() {
                    records.remove(learner);
                }
            }
        });
        info!("cleared completion of {} for {}", workshop_id, learner);
        true
    }

    /// Clear a workshop for every learner.
    pub fn clear_workshop(&mut self, workshop_id: &str) {
        let learners: Vec<String> = self
            .records
            .get()
            .iter()
            .filter(|(_, r)| r.contains_key(workshop_id))
            .map(|(learner, _)| learner.clone())
            .collect();
        for learner in learners {
            self.clear(&learner, workshop_id);
        }
    }

    pub fn is_complete(&self, learner: &str, workshop_id: &str, module: u32) -> bool {
        self.records
            .get()
            .get(learner)
            .and_then(|r| r.get(workshop_id))
            .is_some_and(|m| m.contains(&module.to_string()))
    }

    pub fn completed_modules(&self, learner: &str, workshop_id: &str) -> BTreeSet<u32> {
        let Some(modules) = self
            .records
            .get()
            .get(learner)
            .and_then(|r| r.get(workshop_id))
        else {
            return BTreeSet::new();
        };
        modules
            .iter()
            .filter_map(|m| match m.parse() {
                Ok(index) => Some(index),
                Err(_) => {
                    warn!("ignoring malformed module index {:?} in {}", m, workshop_id);
                    None
                }
            })
            .collect()
    }

    pub fn refresh(&mut self) -> bool {
        self.records.refresh(self.storage.as_ref())
    }
}
