pub mod builtin;
pub mod workshop;

use std::{collections::BTreeSet, sync::Arc};

pub use workshop::{Instructor, Lesson, LessonKind, Module, Schedule, Workshop, WorkshopDraft};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{Error, Result},
    session::Session,
    storage::{Persisted, Storage},
    utils::unix_millis,
};

pub const CUSTOM_WORKSHOPS_KEY: &str = "customWorkshops";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogQuery {
    /// Case-insensitive substring over title, description, instructor and topic
    pub text: Option<String>,
    pub topic: Option<String>,
    pub audience: Option<String>,
}

/// Built-in workshops plus the ones admins created, in that order.
pub struct Catalog {
    storage: Arc<dyn Storage>,
    builtin: Vec<Workshop>,
    custom: Persisted<Vec<Workshop>>,
}

impl Catalog {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_builtin(storage, builtin::workshops())
    }

    pub fn with_builtin(storage: Arc<dyn Storage>, builtin: Vec<Workshop>) -> Self {
        let custom = Persisted::load(storage.as_ref(), CUSTOM_WORKSHOPS_KEY);
        Self {
            storage,
            builtin,
            custom,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Workshop> {
        self.builtin.iter().chain(self.custom.get().iter())
    }

    pub fn get(&self, id: &str) -> Option<&Workshop> {
        self.iter().find(|w| w.id == id)
    }

    pub fn is_builtin(&self, id: &str) -> bool {
        self.builtin.iter().any(|w| w.id == id)
    }

    pub fn search(&self, query: &CatalogQuery) -> Vec<&Workshop> {
        let eq = |field: &str, want: &Option<String>| match want {
            Some(want) => field.eq_ignore_ascii_case(want.trim()),
            None => true,
        };
        self.iter()
            .filter(|w| query.text.as_deref().is_none_or(|t| w.matches_text(t)))
            .filter(|w| eq(w.topic.as_str(), &query.topic))
            .filter(|w| eq(w.audience.as_str(), &query.audience))
            .collect()
    }

    pub fn topics(&self) -> BTreeSet<&str> {
        self.iter()
            .map(|w| w.topic.as_str())
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn create(&mut self, session: &Session, draft: WorkshopDraft) -> Result<Workshop> {
        let admin = session.require_admin()?;
        let modules = validate_draft(&draft)?;
        let mut millis = unix_millis();
        let id = loop {
            let id = format!("wk-custom-{}", millis);
            if self.get(&id).is_none() {
                break id;
            }
            millis += 1;
        };
        let workshop = Workshop {
            id,
            title: draft.title.trim().to_string(),
            topic: draft.topic,
            audience: draft.audience,
            description: draft.description,
            instructor: draft.instructor,
            schedule: draft.schedule,
            modules,
        };
        self.custom
            .update(self.storage.as_ref(), |v| v.push(workshop.clone()));
        info!("{} created workshop {} {}", admin, workshop.id, workshop.title);
        Ok(workshop)
    }

    /// Remove an admin-created workshop. Built-in workshops are read-only.
    pub fn delete(&mut self, session: &Session, id: &str) -> Result<Workshop> {
        let admin = session.require_admin()?;
        if self.is_builtin(id) {
            return Err(Error::BuiltinWorkshop(id.to_string()));
        }
        let pos = self
            .custom
            .get()
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| Error::WorkshopNotFound(id.to_string()))?;
        let removed = self.custom.update(self.storage.as_ref(), |v| v.remove(pos));
        info!("{} deleted workshop {}", admin, id);
        Ok(removed)
    }

    pub fn refresh(&mut self) -> bool {
        self.custom.refresh(self.storage.as_ref())
    }
}

/// Check a draft and return its modules with indices assigned.
fn validate_draft(draft: &WorkshopDraft) -> Result<Vec<Module>> {
    let invalid = |msg: &str| Err(Error::InvalidWorkshop(msg.to_string()));
    if draft.title.trim().is_empty() {
        return invalid("title is required");
    }
    if draft.schedule.date.trim().is_empty() {
        return invalid("schedule date is required");
    }
    if draft.instructor.name.trim().is_empty() {
        return invalid("instructor name is required");
    }
    if draft.modules.is_empty() {
        return invalid("at least one module is required");
    }
    let mut modules = draft.modules.clone();
    if modules.iter().all(|m| m.index == 0) {
        for (i, m) in modules.iter_mut().enumerate() {
            m.index = i as u32 + 1;
        }
    }
    let mut seen = BTreeSet::new();
    for m in &modules {
        if m.title.trim().is_empty() {
            return invalid("every module needs a title");
        }
        if m.index == 0 {
            return invalid("module index must be at least 1");
        }
        if !seen.insert(m.index) {
            return Err(Error::InvalidWorkshop(format!(
                "duplicate module index {}",
                m.index
            )));
        }
    }
    modules.sort_by_key(|m| m.index);
    Ok(modules)
}
