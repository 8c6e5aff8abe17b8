use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;

use crate::{
    catalog::Workshop,
    error::{Error, Result},
    session::Session,
    storage::{Persisted, Storage},
    utils::local_now,
};

pub const REGISTRATIONS_KEY: &str = "registrations";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationStatus::Pending => write!(f, "pending"),
            RegistrationStatus::Approved => write!(f, "approved"),
            RegistrationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for RegistrationStatus {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => anyhow::bail!("unknown registration status: {}", other),
        }
    }
}

/// A learner's enrollment in a workshop. Title and schedule are copied at
/// registration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub learner: String,
    pub workshop_id: String,
    #[serde(default)]
    pub workshop_title: String,
    #[serde(default)]
    pub schedule: String,
    #[serde(default = "local_now", with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
    #[serde(default)]
    pub status: RegistrationStatus,
}

impl Registration {
    pub fn is_for(&self, learner: &str, workshop_id: &str) -> bool {
        self.learner == learner && self.workshop_id == workshop_id
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationFilter {
    pub status: Option<RegistrationStatus>,
    /// Case-insensitive match on learner, workshop title or workshop id
    pub search: Option<String>,
}

impl RegistrationFilter {
    fn matches(&self, r: &Registration) -> bool {
        if self.status.is_some_and(|s| s != r.status) {
            return false;
        }
        let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return true;
        };
        let search = search.to_lowercase();
        [&r.learner, &r.workshop_title, &r.workshop_id]
            .iter()
            .any(|field| field.to_lowercase().contains(&search))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationStats {
    pub approved: usize,
    pub pending: usize,
    pub rejected: usize,
}

impl RegistrationStats {
    pub fn total(&self) -> usize {
        self.approved + self.pending + self.rejected
    }
}

/// Ordered list of registrations, rewritten in full on every change.
pub struct RegistrationLedger {
    storage: Arc<dyn Storage>,
    entries: Persisted<Vec<Registration>>,
}

impl RegistrationLedger {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let entries = Persisted::load(storage.as_ref(), REGISTRATIONS_KEY);
        Self { storage, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.get().is_empty()
    }

    pub fn get(&self, learner: &str, workshop_id: &str) -> Option<&Registration> {
        self.entries
            .get()
            .iter()
            .find(|r| r.is_for(learner, workshop_id))
    }

    pub fn is_registered(&self, learner: &str, workshop_id: &str) -> bool {
        self.get(learner, workshop_id).is_some()
    }

    /// Registrations of one learner, in registration order.
    pub fn registrations_for(&self, learner: &str) -> Vec<&Registration> {
        self.entries
            .get()
            .iter()
            .filter(|r| r.learner == learner)
            .collect()
    }

    /// Enroll the session's student. Only logged-in students may register,
    /// and only once per workshop.
    pub fn register(
        &mut self,
        session: &Session,
        workshop: &Workshop,
        status: RegistrationStatus,
    ) -> Result<Registration> {
        let learner = session.require_student()?;
        if self.is_registered(learner, &workshop.id) {
            return Err(Error::AlreadyRegistered(workshop.id.clone()));
        }
        let registration = Registration {
            learner: learner.to_string(),
            workshop_id: workshop.id.clone(),
            workshop_title: workshop.title.clone(),
            schedule: workshop.schedule.to_string(),
            registered_at: local_now(),
            status,
        };
        self.entries
            .update(self.storage.as_ref(), |v| v.push(registration.clone()));
        info!(
            "{} registered for {} ({})",
            registration.learner, registration.workshop_id, registration.status
        );
        Ok(registration)
    }

    /// Drop the session's own registration.
    pub fn unregister(&mut self, session: &Session, workshop_id: &str) -> Result<Registration> {
        let learner = session.require_student()?.to_string();
        let removed = self.take(&learner, workshop_id)?;
        info!("{} unregistered from {}", learner, workshop_id);
        Ok(removed)
    }

    pub fn approve(&mut self, session: &Session, learner: &str, workshop_id: &str) -> Result<()> {
        self.set_status(session, learner, workshop_id, RegistrationStatus::Approved)
    }

    pub fn reject(&mut self, session: &Session, learner: &str, workshop_id: &str) -> Result<()> {
        self.set_status(session, learner, workshop_id, RegistrationStatus::Rejected)
    }

    fn set_status(
        &mut self,
        session: &Session,
        learner: &str,
        workshop_id: &str,
        status: RegistrationStatus,
    ) -> Result<()> {
        let admin = session.require_admin()?;
        let pos = self.position(learner, workshop_id)?;
        self.entries
            .update(self.storage.as_ref(), |v| v[pos].status = status);
        info!("{} set {}/{} to {}", admin, learner, workshop_id, status);
        Ok(())
    }

    /// Admin removal of any learner's registration.
    pub fn remove(
        &mut self,
        session: &Session,
        learner: &str,
        workshop_id: &str,
    ) -> Result<Registration> {
        let admin = session.require_admin()?.to_string();
        let removed = self.take(learner, workshop_id)?;
        info!("{} removed registration {}/{}", admin, learner, workshop_id);
        Ok(removed)
    }

    /// Remove every registration of a workshop, returning the affected learners.
    pub fn purge_workshop(&mut self, workshop_id: &str) -> Vec<String> {
        let learners: Vec<String> = self
            .entries
            .get()
            .iter()
            .filter(|r| r.workshop_id == workshop_id)
            .map(|r| r.learner.clone())
            .collect();
        if !learners.is_empty() {
            self.entries.update(self.storage.as_ref(), |v| {
                v.retain(|r| r.workshop_id != workshop_id)
            });
        }
        learners
    }

    pub fn list(&self, filter: &RegistrationFilter) -> Vec<&Registration> {
        self.entries
            .get()
            .iter()
            .filter(|r| filter.matches(r))
            .collect()
    }

    pub fn stats(&self) -> RegistrationStats {
        let mut stats = RegistrationStats::default();
        for r in self.entries.get() {
            match r.status {
                RegistrationStatus::Approved => stats.approved += 1,
                RegistrationStatus::Pending => stats.pending += 1,
                RegistrationStatus::Rejected => stats.rejected += 1,
            }
        }
        stats
    }

    pub fn refresh(&mut self) -> bool {
        self.entries.refresh(self.storage.as_ref())
    }

    fn position(&self, learner: &str, workshop_id: &str) -> Result<usize> {
        self.entries
            .get()
            .iter()
            .position(|r| r.is_for(learner, workshop_id))
            .ok_or_else(|| Error::NotRegistered(workshop_id.to_string()))
    }

    fn take(&mut self, learner: &str, workshop_id: &str) -> Result<Registration> {
        let pos = self.position(learner, workshop_id)?;
        Ok(self.entries.update(self.storage.as_ref(), |v| v.remove(pos)))
    }
}
