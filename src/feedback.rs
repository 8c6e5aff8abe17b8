use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;

use crate::{
    error::{Error, Result},
    session::Session,
    storage::{Persisted, Storage},
    utils::local_now,
};

pub const FEEDBACK_KEY: &str = "feedback";

/// What a learner fills in after a workshop or module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackForm {
    /// 1 to 5
    pub overall_satisfaction: u8,
    pub content_clarity: u8,
    pub instructor_effectiveness: u8,
    pub would_recommend: bool,
    #[serde(default)]
    pub comments: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    pub learner: String,
    pub workshop_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub module: Option<u32>,
    #[serde(flatten)]
    pub form: FeedbackForm,
    #[serde(default = "local_now", with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeedbackSummary {
    pub responses: usize,
    pub overall_satisfaction: f64,
    pub content_clarity: f64,
    pub instructor_effectiveness: f64,
    /// Share of responses that would recommend, 0..=1
    pub recommend_rate: f64,
}

impl FeedbackForm {
    fn validate(&self) -> Result<()> {
        for (name, rating) in [
            ("overall satisfaction", self.overall_satisfaction),
            ("content clarity", self.content_clarity),
            ("instructor effectiveness", self.instructor_effectiveness),
        ] {
            if !(1..=5).contains(&rating) {
                return Err(Error::InvalidFeedback(format!(
                    "{} must be between 1 and 5, got {}",
                    name, rating
                )));
            }
        }
        Ok(())
    }
}

pub struct FeedbackBoard {
    storage: Arc<dyn Storage>,
    entries: Persisted<Vec<FeedbackEntry>>,
}

impl FeedbackBoard {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let entries = Persisted::load(storage.as_ref(), FEEDBACK_KEY);
        Self { storage, entries }
    }

    /// Store feedback, replacing the learner's earlier entry for the same
    /// workshop and module.
    pub fn submit(
        &mut self,
        session: &Session,
        workshop_id: &str,
        module: Option<u32>,
        form: FeedbackForm,
    ) -> Result<FeedbackEntry> {
        let (learner, _) = session.require_login()?;
        form.validate()?;
        let entry = FeedbackEntry {
            learner: learner.to_string(),
            workshop_id: workshop_id.to_string(),
            module,
            form,
            submitted_at: local_now(),
        };
        self.entries.update(self.storage.as_ref(), |v| {
            v.retain(|e| {
                !(e.learner == entry.learner && e.workshop_id == entry.workshop_id && e.module == module)
            });
            v.push(entry.clone());
        });
        info!("{} left feedback on {}", entry.learner, workshop_id);
        Ok(entry)
    }

    pub fn for_workshop(&self, workshop_id: &str) -> Vec<&FeedbackEntry> {
        self.entries
            .get()
            .iter()
            .filter(|e| e.workshop_id == workshop_id)
            .collect()
    }

    pub fn summary(&self, workshop_id: &str) -> Option<FeedbackSummary> {
        let entries = self.for_workshop(workshop_id);
        if entries.is_empty() {
            return None;
        }
        let n = entries.len() as f64;
        let mean = |f: fn(&FeedbackForm) -> u8| {
            entries.iter().map(|e| f(&e.form) as f64).sum::<f64>() / n
        };
        Some(FeedbackSummary {
            responses: entries.len(),
            overall_satisfaction: mean(|f| f.overall_satisfaction),
            content_clarity: mean(|f| f.content_clarity),
            instructor_effectiveness: mean(|f| f.instructor_effectiveness),
            recommend_rate: entries.iter().filter(|e| e.form.would_recommend).count() as f64 / n,
        })
    }

    pub fn purge_workshop(&mut self, workshop_id: &str) {
        if self.entries.get().iter().any(|e| e.workshop_id == workshop_id) {
            self.entries.update(self.storage.as_ref(), |v| {
                v.retain(|e| e.workshop_id != workshop_id)
            });
        }
    }

    pub fn refresh(&mut self) -> bool {
        self.entries.refresh(self.storage.as_ref())
    }
}
