use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonKind {
    Video,
    Article,
    Quiz,
}

/// Leaf content of a module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub kind: LessonKind,
    pub name: String,
    /// Video id, article body or quiz id
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reference: Option<String>,
}

impl Lesson {
    pub fn new(kind: LessonKind, name: &str, reference: Option<&str>) -> Self {
        Self {
            kind,
            name: name.to_string(),
            reference: reference.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// 1-based position within the workshop
    pub index: u32,
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub lessons: Vec<Lesson>,
}

impl Module {
    pub fn has_quiz(&self) -> bool {
        self.lessons.iter().any(|l| l.kind == LessonKind::Quiz)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instructor {
    pub name: String,
    #[serde(default)]
    pub expertise: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub duration: String,
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.date)?;
        if !self.time.is_empty() {
            write!(f, " {}", self.time)?;
        }
        if !self.duration.is_empty() {
            write!(f, " ({})", self.duration)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workshop {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructor: Instructor,
    pub schedule: Schedule,
    #[serde(default)]
    pub modules: Vec<Module>,
}

impl Workshop {
    pub fn module(&self, index: u32) -> Option<&Module> {
        self.modules.iter().find(|m| m.index == index)
    }

    /// Indices of the modules that carry a quiz lesson.
    pub fn quiz_modules(&self) -> BTreeSet<u32> {
        self.modules
            .iter()
            .filter(|m| m.has_quiz())
            .map(|m| m.index)
            .collect()
    }

    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            &self.title,
            &self.description,
            &self.instructor.name,
            &self.topic,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Admin input for a new workshop, validated by the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkshopDraft {
    pub title: String,
    pub topic: String,
    pub audience: String,
    pub description: String,
    pub instructor: Instructor,
    pub schedule: Schedule,
    pub modules: Vec<Module>,
}
