use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use tracing::info;

use super::QuizDefinition;
use crate::{
    error::{Error, Result},
    session::Session,
    storage::{Persisted, Storage},
};

pub const CUSTOM_QUIZZES_KEY: &str = "customQuizzes";

/// Question sets added by admins, keyed by workshop id then module index.
/// They take precedence over the built-in bank.
pub struct CustomQuizzes {
    storage: Arc<dyn Storage>,
    quizzes: Persisted<BTreeMap<String, BTreeMap<u32, QuizDefinition>>>,
}

impl CustomQuizzes {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let quizzes = Persisted::load(storage.as_ref(), CUSTOM_QUIZZES_KEY);
        Self { storage, quizzes }
    }

    pub fn get(&self, workshop_id: &str, module: u32) -> Option<&QuizDefinition> {
        self.quizzes
            .get()
            .get(workshop_id)
            .and_then(|m| m.get(&module))
    }

    /// Store a question set, replacing any earlier one for the module.
    pub fn insert(
        &mut self,
        session: &Session,
        workshop_id: &str,
        module: u32,
        quiz: QuizDefinition,
    ) -> Result<()> {
        let admin = session.require_admin()?;
        validate(&quiz)?;
        let quiz_id = quiz.id.clone();
        self.quizzes.update(self.storage.as_ref(), |v| {
            v.entry(workshop_id.to_string())
                .or_default()
                .insert(module, quiz)
        });
        info!(
            "{} set quiz {} for {} module {}",
            admin, quiz_id, workshop_id, module
        );
        Ok(())
    }

    pub fn purge_workshop(&mut self, workshop_id: &str) {
        if self.quizzes.get().contains_key(workshop_id) {
            self.quizzes.update(self.storage.as_ref(), |v| {
                v.remove(workshop_id);
            });
        }
    }

    pub fn refresh(&mut self) -> bool {
        self.quizzes.refresh(self.storage.as_ref())
    }
}

fn validate(quiz: &QuizDefinition) -> Result<()> {
    if quiz.questions.is_empty() {
        return Err(Error::InvalidQuiz(format!("{} has no questions", quiz.id)));
    }
    let mut ids = BTreeSet::new();
    for q in &quiz.questions {
        if !ids.insert(q.id.as_str()) {
            return Err(Error::InvalidQuiz(format!("duplicate question id {}", q.id)));
        }
        if !q.has_option(&q.correct_answer) {
            return Err(Error::InvalidQuiz(format!(
                "answer of {} is not one of its options",
                q.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{quiz::Question, storage::MemoryStorage};

    fn quiz(correct: &str) -> QuizDefinition {
        QuizDefinition {
            id: "wk5-m1".to_string(),
            title: "Funnels".to_string(),
            questions: vec![Question::new(
                "f1",
                "First A in AARRR?",
                ["Acquisition", "Activation", "Awareness", "Advocacy"],
                correct,
            )],
        }
    }

    #[test]
    fn persisted_for_other_holders() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut quizzes = CustomQuizzes::new(storage.clone());
        assert!(matches!(
            quizzes.insert(&Session::student("alice"), "wk-5", 1, quiz("Acquisition")),
            Err(Error::Unauthorized)
        ));
        quizzes
            .insert(&Session::admin("root"), "wk-5", 1, quiz("Acquisition"))
            .unwrap();

        let mut other = CustomQuizzes::new(storage);
        assert_eq!(other.get("wk-5", 1).unwrap().id, "wk5-m1");
        assert!(other.get("wk-5", 2).is_none());

        quizzes.purge_workshop("wk-5");
        assert!(other.refresh());
        assert!(other.get("wk-5", 1).is_none());
    }

    #[test]
    fn rejects_broken_sets() {
        let mut quizzes = CustomQuizzes::new(Arc::new(MemoryStorage::new()));
        let admin = Session::admin("root");
        assert!(matches!(
            quizzes.insert(&admin, "wk-5", 1, quiz("Attention")),
            Err(Error::InvalidQuiz(_))
        ));
        let mut empty = quiz("Acquisition");
        empty.questions.clear();
        assert!(matches!(
            quizzes.insert(&admin, "wk-5", 1, empty),
            Err(Error::InvalidQuiz(_))
        ));
        let mut twice = quiz("Acquisition");
        twice.questions.push(twice.questions[0].clone());
        assert!(matches!(
            quizzes.insert(&admin, "wk-5", 1, twice),
            Err(Error::InvalidQuiz(_))
        ));
    }
}
