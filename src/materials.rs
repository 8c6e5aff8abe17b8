use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;

use crate::{
    error::{Error, Result},
    session::Session,
    storage::{Persisted, Storage},
    utils::{local_now, unix_millis},
};

pub const TRAINING_MATERIALS_KEY: &str = "trainingMaterials";
pub const POST_TRAINING_RESOURCES_KEY: &str = "postTrainingResources";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    #[default]
    Document,
    Video,
    Resource,
    Template,
    Link,
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MaterialKind::Document => "document",
            MaterialKind::Video => "video",
            MaterialKind::Resource => "resource",
            MaterialKind::Template => "template",
            MaterialKind::Link => "link",
        };
        f.pad(s)
    }
}

impl FromStr for MaterialKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" => Ok(Self::Document),
            "video" => Ok(Self::Video),
            "resource" => Ok(Self::Resource),
            "template" => Ok(Self::Template),
            "link" => Ok(Self::Link),
            other => anyhow::bail!("unknown material type: {}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Empty for resources open to every workshop
    #[serde(default)]
    pub workshop_id: String,
    #[serde(rename = "type", default)]
    pub kind: MaterialKind,
    pub url: String,
    #[serde(default = "local_now", with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDraft {
    pub title: String,
    pub description: String,
    pub workshop_id: String,
    #[serde(rename = "type")]
    pub kind: MaterialKind,
    pub url: String,
}

/// Admin-managed list of downloadable items stored under one key.
///
/// Two shelves exist: training materials, which always belong to a
/// workshop, and post-training resources, which may be open to everyone.
pub struct MaterialShelf {
    storage: Arc<dyn Storage>,
    id_prefix: &'static str,
    workshop_required: bool,
    items: Persisted<Vec<Material>>,
}

impl MaterialShelf {
    pub fn training(storage: Arc<dyn Storage>) -> Self {
        Self::new(storage, TRAINING_MATERIALS_KEY, "material-", true)
    }

    pub fn resources(storage: Arc<dyn Storage>) -> Self {
        Self::new(storage, POST_TRAINING_RESOURCES_KEY, "res-", false)
    }

    fn new(
        storage: Arc<dyn Storage>,
        key: &'static str,
        id_prefix: &'static str,
        workshop_required: bool,
    ) -> Self {
        let items = Persisted::load(storage.as_ref(), key);
        Self {
            storage,
            id_prefix,
            workshop_required,
            items,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Material> {
        self.items.get().iter().find(|m| m.id == id)
    }

    pub fn add(&mut self, session: &Session, draft: MaterialDraft) -> Result<Material> {
        let admin = session.require_admin()?;
        if draft.title.trim().is_empty() {
            return Err(Error::InvalidMaterial("title is required".to_string()));
        }
        if draft.url.trim().is_empty() {
            return Err(Error::InvalidMaterial("url is required".to_string()));
        }
        if self.workshop_required && draft.workshop_id.trim().is_empty() {
            return Err(Error::InvalidMaterial("workshop is required".to_string()));
        }
        let mut millis = unix_millis();
        let id = loop {
            let id = format!("{}{}", self.id_prefix, millis);
            if self.get(&id).is_none() {
                break id;
            }
            millis += 1;
        };
        let material = Material {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description,
            workshop_id: draft.workshop_id.trim().to_string(),
            kind: draft.kind,
            url: draft.url.trim().to_string(),
            added_at: local_now(),
        };
        self.items
            .update(self.storage.as_ref(), |v| v.push(material.clone()));
        info!(
            "{} added {} {} to {}",
            admin,
            self.items.key(),
            material.id,
            material.workshop_id
        );
        Ok(material)
    }

    pub fn delete(&mut self, session: &Session, id: &str) -> Result<Material> {
        let admin = session.require_admin()?;
        let pos = self
            .items
            .get()
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| Error::MaterialNotFound(id.to_string()))?;
        let removed = self.items.update(self.storage.as_ref(), |v| v.remove(pos));
        info!("{} deleted {} {}", admin, self.items.key(), id);
        Ok(removed)
    }

    /// Items in insertion order, optionally narrowed to one workshop and
    /// one kind. Open items (no workshop) match any workshop.
    pub fn list(&self, workshop_id: Option<&str>, kind: Option<MaterialKind>) -> Vec<&Material> {
        self.items
            .get()
            .iter()
            .filter(|m| {
                workshop_id.is_none_or(|w| m.workshop_id.is_empty() || m.workshop_id == w)
            })
            .filter(|m| kind.is_none_or(|k| m.kind == k))
            .collect()
    }

    pub fn count(&self, kind: MaterialKind) -> usize {
        self.items.get().iter().filter(|m| m.kind == kind).count()
    }

    pub fn purge_workshop(&mut self, workshop_id: &str) {
        if self.items.get().iter().any(|m| m.workshop_id == workshop_id) {
            self.items.update(self.storage.as_ref(), |v| {
                v.retain(|m| m.workshop_id != workshop_id)
            });
        }
    }

    pub fn refresh(&mut self) -> bool {
        self.items.refresh(self.storage.as_ref())
    }
}
