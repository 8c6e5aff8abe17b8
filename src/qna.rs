use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    session::{Role, Session},
    storage::{Persisted, Storage},
    utils::local_now,
};

pub const QNA_KEY: &str = "sessionQnA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Author {
    Instructor,
    Student,
}

impl From<Role> for Author {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => Author::Instructor,
            Role::Student => Author::Student,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QnaAnswer {
    pub id: String,
    pub text: String,
    pub author: Author,
    pub author_name: String,
    #[serde(default = "local_now", with = "time::serde::rfc3339")]
    pub answered_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QnaQuestion {
    pub id: String,
    pub workshop_id: String,
    pub text: String,
    pub asked_by: String,
    #[serde(default = "local_now", with = "time::serde::rfc3339")]
    pub asked_at: OffsetDateTime,
    #[serde(default)]
    pub votes: u32,
    #[serde(default)]
    pub answers: Vec<QnaAnswer>,
}

impl QnaQuestion {
    pub fn is_answered(&self) -> bool {
        !self.answers.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QnaFilter {
    #[default]
    All,
    Answered,
    Unanswered,
}

/// Live-session questions across all workshops.
pub struct QnaBoard {
    storage: Arc<dyn Storage>,
    questions: Persisted<Vec<QnaQuestion>>,
}

fn non_empty(text: &str) -> Result<String> {
    match text.trim() {
        "" => Err(Error::EmptyText),
        text => Ok(text.to_string()),
    }
}

impl QnaBoard {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let questions = Persisted::load(storage.as_ref(), QNA_KEY);
        Self { storage, questions }
    }

    fn next_id(&self, prefix: &str) -> String {
        let max = self
            .questions
            .get()
            .iter()
            .flat_map(|q| std::iter::once(&q.id).chain(q.answers.iter().map(|a| &a.id)))
            .filter_map(|id| id.strip_prefix(prefix)?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("{}{}", prefix, max + 1)
    }

    pub fn ask(&mut self, session: &Session, workshop_id: &str, text: &str) -> Result<QnaQuestion> {
        let (name, _) = session.require_login()?;
        let question = QnaQuestion {
            id: self.next_id("q-"),
            workshop_id: workshop_id.to_string(),
            text: non_empty(text)?,
            asked_by: name.to_string(),
            asked_at: local_now(),
            votes: 0,
            answers: vec![],
        };
        self.questions
            .update(self.storage.as_ref(), |v| v.push(question.clone()));
        info!("{} asked {} on {}", name, question.id, workshop_id);
        Ok(question)
    }

    pub fn answer(&mut self, session: &Session, question_id: &str, text: &str) -> Result<QnaAnswer> {
        let (name, role) = session.require_login()?;
        let text = non_empty(text)?;
        let pos = self.position(question_id)?;
        let answer = QnaAnswer {
            id: self.next_id("a-"),
            text,
            author: role.into(),
            author_name: name.to_string(),
            answered_at: local_now(),
        };
        self.questions
            .update(self.storage.as_ref(), |v| v[pos].answers.push(answer.clone()));
        info!("{} answered {}", name, question_id);
        Ok(answer)
    }

    pub fn vote(&mut self, session: &Session, question_id: &str) -> Result<u32> {
        let (name, _) = session.require_login()?;
        let pos = self.position(question_id)?;
        let votes = self.questions.update(self.storage.as_ref(), |v| {
            v[pos].votes += 1;
            v[pos].votes
        });
        debug!("{} voted for {}", name, question_id);
        Ok(votes)
    }

    /// Questions of one workshop, most votes first, then oldest first.
    pub fn list(&self, workshop_id: &str, filter: QnaFilter) -> Vec<&QnaQuestion> {
        let mut questions: Vec<&QnaQuestion> = self
            .questions
            .get()
            .iter()
            .filter(|q| q.workshop_id == workshop_id)
            .filter(|q| match filter {
                QnaFilter::All => true,
                QnaFilter::Answered => q.is_answered(),
                QnaFilter::Unanswered => !q.is_answered(),
            })
            .collect();
        // stable sort keeps asking order among ties
        questions.sort_by(|a, b| b.votes.cmp(&a.votes));
        questions
    }

    pub fn purge_workshop(&mut self, workshop_id: &str) {
        if self.questions.get().iter().any(|q| q.workshop_id == workshop_id) {
            self.questions.update(self.storage.as_ref(), |v| {
                v.retain(|q| q.workshop_id != workshop_id)
            });
        }
    }

    pub fn refresh(&mut self) -> bool {
        self.questions.refresh(self.storage.as_ref())
    }

    fn position(&self, question_id: &str) -> Result<usize> {
        self.questions
            .get()
            .iter()
            .position(|q| q.id == question_id)
            .ok_or_else(|| Error::QuestionNotFound(question_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn ask_answer_vote() {
        let mut board = QnaBoard::new(Arc::new(MemoryStorage::new()));
        let alice = Session::student("alice");
        let q1 = board.ask(&alice, "wk-1", "What is useMemo for?").unwrap();
        let q2 = board.ask(&alice, "wk-1", "Slides?").unwrap();
        board.ask(&alice, "wk-2", "Figma license?").unwrap();
        assert_eq!(q1.id, "q-1");
        assert_eq!(q2.id, "q-2");

        let a = board
            .answer(&Session::admin("gopi"), &q1.id, "Memoizing derived values")
            .unwrap();
        assert_eq!(a.author, Author::Instructor);
        assert_eq!(board.vote(&alice, &q2.id).unwrap(), 1);
        assert_eq!(board.vote(&Session::student("bob"), &q2.id).unwrap(), 2);

        let all: Vec<_> = board
            .list("wk-1", QnaFilter::All)
            .iter()
            .map(|q| q.id.clone())
            .collect();
        assert_eq!(all, vec!["q-2", "q-1"]);
        assert_eq!(board.list("wk-1", QnaFilter::Answered).len(), 1);
        assert_eq!(board.list("wk-1", QnaFilter::Unanswered)[0].id, "q-2");
    }

    #[test]
    fn rejects_empty_and_anonymous() {
        let mut board = QnaBoard::new(Arc::new(MemoryStorage::new()));
        assert!(matches!(
            board.ask(&Session::anonymous(), "wk-1", "hi"),
            Err(Error::Unauthorized)
        ));
        assert!(matches!(
            board.ask(&Session::student("alice"), "wk-1", "   "),
            Err(Error::EmptyText)
        ));
        assert!(matches!(
            board.answer(&Session::student("alice"), "q-9", "x"),
            Err(Error::QuestionNotFound(_))
        ));
        assert!(matches!(
            board.vote(&Session::student("alice"), "q-9"),
            Err(Error::QuestionNotFound(_))
        ));
    }

    #[test]
    fn anonymous_cannot_vote() {
        let mut board = QnaBoard::new(Arc::new(MemoryStorage::new()));
        let q = board
            .ask(&Session::student("alice"), "wk-1", "Is there a recording?")
            .unwrap();
        assert!(matches!(
            board.vote(&Session::anonymous(), &q.id),
            Err(Error::Unauthorized)
        ));
        assert_eq!(board.list("wk-1", QnaFilter::All)[0].votes, 0);
    }
}
