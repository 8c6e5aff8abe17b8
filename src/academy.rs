use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::{
    catalog::{CUSTOM_WORKSHOPS_KEY, Catalog, CatalogQuery, Workshop, WorkshopDraft},
    certificate::{self, Certificate},
    completion::{COMPLETED_MODULES_KEY, CompletionTracker},
    config::Config,
    error::{Error, Result},
    feedback::{FEEDBACK_KEY, FeedbackBoard, FeedbackEntry, FeedbackForm, FeedbackSummary},
    ledger::{
        REGISTRATIONS_KEY, Registration, RegistrationFilter, RegistrationLedger,
        RegistrationStats, RegistrationStatus,
    },
    materials::{
        Material, MaterialDraft, MaterialKind, MaterialShelf, POST_TRAINING_RESOURCES_KEY,
        TRAINING_MATERIALS_KEY,
    },
    qna::{QNA_KEY, QnaAnswer, QnaBoard, QnaFilter, QnaQuestion},
    quiz::{
        CUSTOM_QUIZZES_KEY, CustomQuizzes, QuestionBank, QuizAttempt, QuizDefinition, QuizOutcome,
    },
    session::{Role, Session},
    storage::{FileStorage, MemoryStorage, Storage},
};

/// The one state store every screen talks to. Holds the session, the
/// catalog and every persisted holder over a single storage adapter.
pub struct Academy {
    config: Config,
    session: RwLock<Session>,
    catalog: RwLock<Catalog>,
    ledger: RwLock<RegistrationLedger>,
    completion: RwLock<CompletionTracker>,
    bank: QuestionBank,
    custom_quizzes: RwLock<CustomQuizzes>,
    feedback: RwLock<FeedbackBoard>,
    qna: RwLock<QnaBoard>,
    materials: RwLock<MaterialShelf>,
    resources: RwLock<MaterialShelf>,
}

impl Academy {
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Self {
        Self::with_parts(
            config,
            Catalog::new(storage.clone()),
            QuestionBank::builtin(),
            storage,
        )
    }

    pub fn with_parts(
        config: Config,
        catalog: Catalog,
        bank: QuestionBank,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            config,
            session: RwLock::new(Session::anonymous()),
            catalog: RwLock::new(catalog),
            ledger: RwLock::new(RegistrationLedger::new(storage.clone())),
            completion: RwLock::new(CompletionTracker::new(storage.clone())),
            bank,
            custom_quizzes: RwLock::new(CustomQuizzes::new(storage.clone())),
            feedback: RwLock::new(FeedbackBoard::new(storage.clone())),
            qna: RwLock::new(QnaBoard::new(storage.clone())),
            materials: RwLock::new(MaterialShelf::training(storage.clone())),
            resources: RwLock::new(MaterialShelf::resources(storage)),
        }
    }

    /// Open over `config.storage_dir`, or an ephemeral in-memory store when
    /// unset or unusable.
    pub fn open(config: Config) -> Self {
        let storage: Arc<dyn Storage> = match &config.storage_dir {
            Some(dir) => match FileStorage::open(dir) {
                Ok(storage) => Arc::new(storage),
                Err(e) => {
                    warn!("{}, continuing without persistence", e);
                    Arc::new(MemoryStorage::new())
                }
            },
            None => Arc::new(MemoryStorage::new()),
        };
        Self::new(config, storage)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ---- session ----

    pub fn login(&self, role: Role, name: &str) {
        self.session.write().login(role, name);
    }

    pub fn logout(&self) {
        self.session.write().logout();
    }

    pub fn session(&self) -> Session {
        self.session.read().clone()
    }

    // ---- catalog ----

    pub fn workshops(&self) -> Vec<Workshop> {
        self.catalog.read().iter().cloned().collect()
    }

    pub fn workshop(&self, id: &str) -> Option<Workshop> {
        self.catalog.read().get(id).cloned()
    }

    pub fn search(&self, query: &CatalogQuery) -> Vec<Workshop> {
        self.catalog
            .read()
            .search(query)
            .into_iter()
            .cloned()
            .collect()
    }

    fn require_workshop(&self, id: &str) -> Result<Workshop> {
        self.workshop(id)
            .ok_or_else(|| Error::WorkshopNotFound(id.to_string()))
    }

    pub fn create_workshop(&self, draft: WorkshopDraft) -> Result<Workshop> {
        let session = self.session();
        self.catalog.write().create(&session, draft)
    }

    /// Delete an admin-created workshop along with its registrations,
    /// completion records, quizzes, feedback, questions and materials.
    pub fn delete_workshop(&self, id: &str) -> Result<Workshop> {
        let session = self.session();
        let removed = self.catalog.write().delete(&session, id)?;
        let learners = self.ledger.write().purge_workshop(id);
        self.completion.write().clear_workshop(id);
        self.custom_quizzes.write().purge_workshop(id);
        self.feedback.write().purge_workshop(id);
        self.qna.write().purge_workshop(id);
        self.materials.write().purge_workshop(id);
        self.resources.write().purge_workshop(id);
        info!(
            "workshop {} deleted, {} registration(s) dropped",
            id,
            learners.len()
        );
        Ok(removed)
    }

    // ---- registration ----

    pub fn register(&self, workshop_id: &str) -> Result<Registration> {
        let session = self.session();
        // authorization first, so anonymous users see "Login Required"
        session.require_student()?;
        let workshop = self.require_workshop(workshop_id)?;
        let status = if self.config.registration.auto_approve {
            RegistrationStatus::Approved
        } else {
            RegistrationStatus::Pending
        };
        self.ledger.write().register(&session, &workshop, status)
    }

    /// Drop the current student's registration and forget the completed
    /// modules of that workshop.
    pub fn unregister(&self, workshop_id: &str) -> Result<Registration> {
        let session = self.session();
        let removed = self.ledger.write().unregister(&session, workshop_id)?;
        self.completion
            .write()
            .clear(&removed.learner, workshop_id);
        Ok(removed)
    }

    pub fn is_registered(&self, workshop_id: &str) -> bool {
        let session = self.session();
        match session.require_student() {
            Ok(learner) => self.ledger.read().is_registered(learner, workshop_id),
            Err(_) => false,
        }
    }

    pub fn my_registrations(&self) -> Result<Vec<Registration>> {
        let session = self.session();
        let learner = session.require_student()?;
        Ok(self
            .ledger
            .read()
            .registrations_for(learner)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn registrations(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>> {
        self.session().require_admin()?;
        Ok(self
            .ledger
            .read()
            .list(filter)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn registration_stats(&self) -> Result<RegistrationStats> {
        self.session().require_admin()?;
        Ok(self.ledger.read().stats())
    }

    pub fn approve_registration(&self, learner: &str, workshop_id: &str) -> Result<()> {
        let session = self.session();
        self.ledger.write().approve(&session, learner, workshop_id)
    }

    pub fn reject_registration(&self, learner: &str, workshop_id: &str) -> Result<()> {
        let session = self.session();
        self.ledger.write().reject(&session, learner, workshop_id)
    }

    pub fn remove_registration(&self, learner: &str, workshop_id: &str) -> Result<Registration> {
        let session = self.session();
        let removed = self.ledger.write().remove(&session, learner, workshop_id)?;
        self.completion.write().clear(learner, workshop_id);
        Ok(removed)
    }

    // ---- quizzes ----

    /// Check that the module exists and carries a quiz lesson.
    fn require_quiz_module(&self, workshop_id: &str, module: u32) -> Result<()> {
        let workshop = self.require_workshop(workshop_id)?;
        match workshop.module(module) {
            Some(m) if m.has_quiz() => Ok(()),
            Some(_) => Err(Error::NoQuiz {
                workshop_id: workshop_id.to_string(),
                module,
            }),
            None => Err(Error::ModuleNotFound {
                workshop_id: workshop_id.to_string(),
                module,
            }),
        }
    }

    /// Question set of a quiz module: an admin-added set first, then the
    /// built-in bank, which falls back to the generic questions.
    fn quiz_for(&self, workshop_id: &str, module: u32) -> QuizDefinition {
        match self.custom_quizzes.read().get(workshop_id, module) {
            Some(quiz) => quiz.clone(),
            None => self.bank.get(workshop_id, module).clone(),
        }
    }

    /// Start an attempt on a module quiz.
    pub fn open_quiz(&self, workshop_id: &str, module: u32) -> Result<QuizAttempt> {
        self.session().require_student()?;
        self.require_quiz_module(workshop_id, module)?;
        let quiz = self.quiz_for(workshop_id, module);
        Ok(QuizAttempt::new(workshop_id, module, quiz))
    }

    /// Grade an attempt. A pass marks the module complete; a fail leaves
    /// earlier completion untouched.
    pub fn submit_attempt(&self, attempt: &mut QuizAttempt) -> Result<QuizOutcome> {
        let session = self.session();
        let learner = session.require_student()?;
        let outcome = attempt.submit(self.config.passing_score)?;
        if outcome.passed {
            self.completion
                .write()
                .mark_complete(learner, &attempt.workshop_id, attempt.module);
        }
        info!(
            "{} scored {:.1}% on {} module {} ({})",
            learner,
            outcome.display_score(),
            attempt.workshop_id,
            attempt.module,
            if outcome.passed { "passed" } else { "failed" }
        );
        Ok(outcome)
    }

    pub fn submit_quiz(
        &self,
        workshop_id: &str,
        module: u32,
        answers: &BTreeMap<String, String>,
    ) -> Result<QuizOutcome> {
        let mut attempt = self.open_quiz(workshop_id, module)?;
        for (question_id, option) in answers {
            attempt.answer(question_id, option)?;
        }
        self.submit_attempt(&mut attempt)
    }

    pub fn is_module_complete(&self, workshop_id: &str, module: u32) -> bool {
        let session = self.session();
        match session.require_student() {
            Ok(learner) => self
                .completion
                .read()
                .is_complete(learner, workshop_id, module),
            Err(_) => false,
        }
    }

    /// Set the questions of a quiz module. The set is persisted and shared
    /// with every instance on the same storage.
    pub fn add_quiz(&self, workshop_id: &str, module: u32, quiz: QuizDefinition) -> Result<()> {
        let session = self.session();
        session.require_admin()?;
        self.require_quiz_module(workshop_id, module)?;
        self.custom_quizzes
            .write()
            .insert(&session, workshop_id, module, quiz)
    }

    // ---- certificates ----

    pub fn is_certificate_eligible(&self, workshop_id: &str) -> bool {
        let session = self.session();
        let (Ok(learner), Some(workshop)) = (session.require_student(), self.workshop(workshop_id))
        else {
            return false;
        };
        let ledger = self.ledger.read();
        let completed = self.completion.read().completed_modules(learner, workshop_id);
        certificate::is_eligible(
            &workshop,
            ledger.get(learner, workshop_id),
            &completed,
            self.config.certificate,
        )
    }

    /// (passed, required) quiz modules for the current student
    pub fn certificate_progress(&self, workshop_id: &str) -> Result<(usize, usize)> {
        let session = self.session();
        let learner = session.require_student()?;
        let workshop = self.require_workshop(workshop_id)?;
        let completed = self.completion.read().completed_modules(learner, workshop_id);
        Ok(certificate::progress(&workshop, &completed))
    }

    pub fn issue_certificate(&self, workshop_id: &str) -> Result<Certificate> {
        let session = self.session();
        let learner = session.require_student()?;
        let workshop = self.require_workshop(workshop_id)?;
        let ledger = self.ledger.read();
        let completed = self.completion.read().completed_modules(learner, workshop_id);
        let cert = certificate::issue(
            &workshop,
            ledger.get(learner, workshop_id),
            &completed,
            self.config.certificate,
        )?;
        info!("certificate issued to {} for {}", learner, workshop_id);
        Ok(cert)
    }

    // ---- feedback and Q&A ----

    pub fn submit_feedback(
        &self,
        workshop_id: &str,
        module: Option<u32>,
        form: FeedbackForm,
    ) -> Result<FeedbackEntry> {
        let session = self.session();
        session.require_login()?;
        self.require_workshop(workshop_id)?;
        self.feedback
            .write()
            .submit(&session, workshop_id, module, form)
    }

    pub fn feedback_summary(&self, workshop_id: &str) -> Option<FeedbackSummary> {
        self.feedback.read().summary(workshop_id)
    }

    pub fn ask_question(&self, workshop_id: &str, text: &str) -> Result<QnaQuestion> {
        let session = self.session();
        session.require_login()?;
        self.require_workshop(workshop_id)?;
        self.qna.write().ask(&session, workshop_id, text)
    }

    pub fn answer_question(&self, question_id: &str, text: &str) -> Result<QnaAnswer> {
        let session = self.session();
        self.qna.write().answer(&session, question_id, text)
    }

    pub fn vote_question(&self, question_id: &str) -> Result<u32> {
        let session = self.session();
        self.qna.write().vote(&session, question_id)
    }

    pub fn questions(&self, workshop_id: &str, filter: QnaFilter) -> Vec<QnaQuestion> {
        self.qna
            .read()
            .list(workshop_id, filter)
            .into_iter()
            .cloned()
            .collect()
    }

    // ---- materials ----

    pub fn add_material(&self, draft: MaterialDraft) -> Result<Material> {
        let session = self.session();
        session.require_admin()?;
        if !draft.workshop_id.trim().is_empty() {
            self.require_workshop(draft.workshop_id.trim())?;
        }
        self.materials.write().add(&session, draft)
    }

    pub fn delete_material(&self, id: &str) -> Result<Material> {
        let session = self.session();
        self.materials.write().delete(&session, id)
    }

    /// Admin view of every training material.
    pub fn materials(
        &self,
        workshop_id: Option<&str>,
        kind: Option<MaterialKind>,
    ) -> Result<Vec<Material>> {
        self.session().require_admin()?;
        Ok(self
            .materials
            .read()
            .list(workshop_id, kind)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Training materials of the workshops the current student has
    /// completed, i.e. is certificate-eligible for.
    pub fn my_materials(&self, workshop_id: Option<&str>) -> Result<Vec<Material>> {
        let session = self.session();
        session.require_student()?;
        let materials = self.materials.read();
        Ok(materials
            .list(workshop_id, None)
            .into_iter()
            .filter(|m| self.is_certificate_eligible(&m.workshop_id))
            .cloned()
            .collect())
    }

    /// Open post-training resource. An empty workshop id makes it visible
    /// for every workshop.
    pub fn add_resource(&self, draft: MaterialDraft) -> Result<Material> {
        let session = self.session();
        session.require_admin()?;
        if !draft.workshop_id.trim().is_empty() {
            self.require_workshop(draft.workshop_id.trim())?;
        }
        self.resources.write().add(&session, draft)
    }

    pub fn delete_resource(&self, id: &str) -> Result<Material> {
        let session = self.session();
        self.resources.write().delete(&session, id)
    }

    /// Post-training resources for any logged-in user.
    pub fn resources(&self, workshop_id: Option<&str>) -> Result<Vec<Material>> {
        self.session().require_login()?;
        Ok(self
            .resources
            .read()
            .list(workshop_id, None)
            .into_iter()
            .cloned()
            .collect())
    }

    // ---- cross-instance sync ----

    /// Storage-change notification from another instance sharing the same
    /// storage. `None` refreshes everything. Returns whether any local copy
    /// changed.
    pub fn on_storage_changed(&self, key: Option<&str>) -> bool {
        let all = key.is_none();
        let mut changed = false;
        if all || key == Some(CUSTOM_WORKSHOPS_KEY) {
            changed |= self.catalog.write().refresh();
        }
        if all || key == Some(REGISTRATIONS_KEY) {
            changed |= self.ledger.write().refresh();
        }
        if all || key == Some(COMPLETED_MODULES_KEY) {
            changed |= self.completion.write().refresh();
        }
        if all || key == Some(FEEDBACK_KEY) {
            changed |= self.feedback.write().refresh();
        }
        if all || key == Some(QNA_KEY) {
            changed |= self.qna.write().refresh();
        }
        if all || key == Some(CUSTOM_QUIZZES_KEY) {
            changed |= self.custom_quizzes.write().refresh();
        }
        if all || key == Some(TRAINING_MATERIALS_KEY) {
            changed |= self.materials.write().refresh();
        }
        if all || key == Some(POST_TRAINING_RESOURCES_KEY) {
            changed |= self.resources.write().refresh();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::Schedule, config::CertificatePolicy};

    fn academy() -> Academy {
        Academy::new(Config::default(), Arc::new(MemoryStorage::new()))
    }

    fn correct_answers(academy: &Academy, workshop_id: &str, module: u32) -> BTreeMap<String, String> {
        academy
            .quiz_for(workshop_id, module)
            .questions
            .iter()
            .map(|q| (q.id.clone(), q.correct_answer.clone()))
            .collect()
    }

    fn wrong_answers(academy: &Academy, workshop_id: &str, module: u32) -> BTreeMap<String, String> {
        academy
            .quiz_for(workshop_id, module)
            .questions
            .iter()
            .map(|q| {
                let wrong = q.options.iter().find(|o| **o != q.correct_answer).unwrap();
                (q.id.clone(), wrong.clone())
            })
            .collect()
    }

    #[test]
    fn anonymous_register_is_login_required() {
        let academy = academy();
        let err = academy.register("wk-1").unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
        assert_eq!(err.to_string(), "Login Required");
        academy.login(Role::Admin, "root");
        assert!(academy.registrations(&RegistrationFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn student_completes_workshop() {
        let academy = academy();
        academy.login(Role::Student, "alice");
        academy.register("wk-1").unwrap();
        assert!(academy.is_registered("wk-1"));

        let answers = correct_answers(&academy, "wk-1", 2);
        assert_eq!(answers.len(), 5);
        let outcome = academy.submit_quiz("wk-1", 2, &answers).unwrap();
        assert_eq!(outcome.score, 100.0);
        assert!(outcome.passed);
        assert!(academy.is_module_complete("wk-1", 2));
        assert!(!academy.is_certificate_eligible("wk-1"));
        assert_eq!(academy.certificate_progress("wk-1").unwrap(), (1, 2));

        let answers = correct_answers(&academy, "wk-1", 1);
        academy.submit_quiz("wk-1", 1, &answers).unwrap();
        assert!(academy.is_certificate_eligible("wk-1"));
        let cert = academy.issue_certificate("wk-1").unwrap();
        assert_eq!(cert.learner, "alice");
    }

    #[test]
    fn register_twice() {
        let academy = academy();
        academy.login(Role::Student, "alice");
        academy.register("wk-2").unwrap();
        assert!(matches!(
            academy.register("wk-2"),
            Err(Error::AlreadyRegistered(_))
        ));
        assert_eq!(academy.my_registrations().unwrap().len(), 1);
        assert!(matches!(
            academy.register("wk-404"),
            Err(Error::WorkshopNotFound(_))
        ));
    }

    #[test]
    fn unregister_forces_recompletion() {
        let academy = academy();
        academy.login(Role::Student, "alice");
        academy.register("wk-1").unwrap();
        for module in [1, 2] {
            let answers = correct_answers(&academy, "wk-1", module);
            academy.submit_quiz("wk-1", module, &answers).unwrap();
        }
        assert!(academy.is_certificate_eligible("wk-1"));

        academy.unregister("wk-1").unwrap();
        assert!(!academy.is_registered("wk-1"));
        assert!(!academy.is_module_complete("wk-1", 1));
        assert!(matches!(
            academy.unregister("wk-1"),
            Err(Error::NotRegistered(_))
        ));

        academy.register("wk-1").unwrap();
        assert!(!academy.is_certificate_eligible("wk-1"));
        assert!(matches!(
            academy.issue_certificate("wk-1"),
            Err(Error::NotEligible(_))
        ));
    }

    #[test]
    fn failing_a_retake_keeps_completion() {
        let academy = academy();
        academy.login(Role::Student, "alice");
        let pass = correct_answers(&academy, "wk-2", 2);
        let fail = wrong_answers(&academy, "wk-2", 2);
        assert!(academy.submit_quiz("wk-2", 2, &pass).unwrap().passed);
        let outcome = academy.submit_quiz("wk-2", 2, &fail).unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.score, 0.0);
        assert!(academy.is_module_complete("wk-2", 2));
    }

    #[test]
    fn incomplete_quiz_has_no_effect() {
        let academy = academy();
        academy.login(Role::Student, "alice");
        let mut answers = correct_answers(&academy, "wk-1", 2);
        answers.remove("w1-q5");
        assert!(matches!(
            academy.submit_quiz("wk-1", 2, &answers),
            Err(Error::IncompleteSubmission { .. })
        ));
        assert!(!academy.is_module_complete("wk-1", 2));
        assert!(matches!(
            academy.submit_quiz("wk-1", 9, &answers),
            Err(Error::ModuleNotFound { .. })
        ));
    }

    #[test]
    fn attempt_flow_with_retry() {
        let academy = academy();
        academy.login(Role::Student, "alice");
        let mut attempt = academy.open_quiz("wk-3", 2).unwrap();
        assert_eq!(attempt.quiz().id, "wk3-m2");
        attempt.answer("grid-q1", "Routing").unwrap();
        attempt.answer("w3-q2", "display").unwrap();
        let outcome = academy.submit_attempt(&mut attempt).unwrap();
        assert_eq!(outcome.score, 50.0);
        assert!(!academy.is_module_complete("wk-3", 2));

        attempt.retry();
        attempt.answer("grid-q1", "Consistent spacing").unwrap();
        attempt.answer("w3-q2", "display").unwrap();
        assert!(academy.submit_attempt(&mut attempt).unwrap().passed);
        assert!(academy.is_module_complete("wk-3", 2));
    }

    #[test]
    fn workshop_without_quizzes_is_never_eligible() {
        let academy = academy();
        academy.login(Role::Student, "alice");
        academy.register("wk-5").unwrap();
        assert!(matches!(
            academy.open_quiz("wk-5", 1),
            Err(Error::NoQuiz { .. })
        ));
        assert!(!academy.is_certificate_eligible("wk-5"));
    }

    #[test]
    fn modules_without_a_quiz_cannot_be_completed() {
        let academy = academy();
        academy.login(Role::Student, "alice");
        academy.register("wk-1").unwrap();
        // module 3 of wk-1 only has an article
        let answers = correct_answers(&academy, "wk-1", 3);
        assert!(matches!(
            academy.submit_quiz("wk-1", 3, &answers),
            Err(Error::NoQuiz { module: 3, .. })
        ));
        assert!(!academy.is_module_complete("wk-1", 3));
    }

    #[test]
    fn approval_policy() {
        let mut config = Config::default();
        config.certificate = CertificatePolicy {
            require_approval: true,
        };
        let academy = Academy::new(config, Arc::new(MemoryStorage::new()));
        academy.login(Role::Student, "alice");
        academy.register("wk-4").unwrap();
        for module in [1, 2] {
            let answers = correct_answers(&academy, "wk-4", module);
            academy.submit_quiz("wk-4", module, &answers).unwrap();
        }
        assert!(!academy.is_certificate_eligible("wk-4"));

        academy.login(Role::Admin, "root");
        assert_eq!(academy.registration_stats().unwrap().pending, 1);
        academy.approve_registration("alice", "wk-4").unwrap();

        academy.login(Role::Student, "alice");
        assert!(academy.is_certificate_eligible("wk-4"));

        academy.login(Role::Admin, "root");
        academy.reject_registration("alice", "wk-4").unwrap();
        academy.login(Role::Student, "alice");
        assert!(!academy.is_certificate_eligible("wk-4"));
    }

    #[test]
    fn admin_removal_clears_completion() {
        let academy = academy();
        academy.login(Role::Student, "alice");
        academy.register("wk-2").unwrap();
        let answers = correct_answers(&academy, "wk-2", 2);
        academy.submit_quiz("wk-2", 2, &answers).unwrap();

        academy.login(Role::Admin, "root");
        academy.remove_registration("alice", "wk-2").unwrap();

        academy.login(Role::Student, "alice");
        assert!(!academy.is_registered("wk-2"));
        assert!(!academy.is_module_complete("wk-2", 2));
    }

    #[test]
    fn deleting_a_custom_workshop_cascades() {
        let academy = academy();
        academy.login(Role::Admin, "root");
        let workshop = academy
            .create_workshop(WorkshopDraft {
                title: "Pairing Clinic".to_string(),
                instructor: crate::catalog::Instructor {
                    name: "Sam".to_string(),
                    expertise: String::new(),
                },
                schedule: Schedule {
                    date: "Friday".to_string(),
                    ..Default::default()
                },
                modules: vec![crate::catalog::Module {
                    index: 1,
                    title: "Warm-up".to_string(),
                    lessons: vec![crate::catalog::Lesson::new(
                        crate::catalog::LessonKind::Quiz,
                        "Check",
                        None,
                    )],
                }],
                ..Default::default()
            })
            .unwrap();

        academy.login(Role::Student, "alice");
        academy.register(&workshop.id).unwrap();
        let answers = correct_answers(&academy, &workshop.id, 1);
        academy.submit_quiz(&workshop.id, 1, &answers).unwrap();
        assert!(academy.is_certificate_eligible(&workshop.id));
        academy.ask_question(&workshop.id, "Remote?").unwrap();

        academy.login(Role::Admin, "root");
        academy
            .add_material(MaterialDraft {
                title: "Pairing checklist".to_string(),
                workshop_id: workshop.id.clone(),
                url: "https://example.com/checklist".to_string(),
                ..Default::default()
            })
            .unwrap();
        academy.delete_workshop(&workshop.id).unwrap();
        assert!(academy.materials(Some(&workshop.id), None).unwrap().is_empty());
        assert!(academy.workshop(&workshop.id).is_none());
        assert_eq!(academy.registration_stats().unwrap().total(), 0);
        assert!(academy.questions(&workshop.id, QnaFilter::All).is_empty());

        academy.login(Role::Student, "alice");
        assert!(!academy.is_module_complete(&workshop.id, 1));
    }

    #[test]
    fn admin_adds_quiz() {
        let academy = academy();
        academy.login(Role::Admin, "root");
        let quiz = QuizDefinition {
            id: "wk5-m1".to_string(),
            title: "Funnels".to_string(),
            questions: vec![crate::quiz::Question::new(
                "f1",
                "What does the first A in AARRR stand for?",
                ["Acquisition", "Activation", "Awareness", "Advocacy"],
                "Acquisition",
            )],
        };
        assert!(matches!(
            academy.add_quiz("wk-5", 1, quiz.clone()),
            Err(Error::NoQuiz { .. })
        ));
        academy.add_quiz("wk-1", 1, quiz).unwrap();
        academy.login(Role::Student, "alice");
        assert_eq!(academy.open_quiz("wk-1", 1).unwrap().quiz().id, "wk5-m1");
        // modules without an added set keep the built-in one
        assert_eq!(academy.open_quiz("wk-1", 2).unwrap().quiz().id, "wk1-m2");
    }

    #[test]
    fn added_quizzes_reach_other_instances() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let admin = Academy::new(Config::default(), storage.clone());
        let learner = Academy::new(Config::default(), storage.clone());
        admin.login(Role::Admin, "root");
        learner.login(Role::Student, "alice");
        let quiz = QuizDefinition {
            id: "wk2-m2-v2".to_string(),
            title: "Prototyping".to_string(),
            questions: vec![crate::quiz::Question::new(
                "p1",
                "Which fidelity suits early exploration?",
                ["Low", "High", "Pixel perfect", "Production"],
                "Low",
            )],
        };
        admin.add_quiz("wk-2", 2, quiz).unwrap();
        assert_eq!(learner.open_quiz("wk-2", 2).unwrap().quiz().id, "wk2-m2");
        assert!(learner.on_storage_changed(Some(CUSTOM_QUIZZES_KEY)));
        assert_eq!(learner.open_quiz("wk-2", 2).unwrap().quiz().id, "wk2-m2-v2");

        let reopened = Academy::new(Config::default(), storage);
        reopened.login(Role::Student, "bob");
        assert_eq!(reopened.open_quiz("wk-2", 2).unwrap().quiz().id, "wk2-m2-v2");
    }

    #[test]
    fn materials_unlock_after_completion() {
        let academy = academy();
        let draft = |workshop_id: &str, kind: MaterialKind| MaterialDraft {
            title: "Cheat sheet".to_string(),
            description: String::new(),
            workshop_id: workshop_id.to_string(),
            kind,
            url: "https://example.com/sheet.pdf".to_string(),
        };

        academy.login(Role::Student, "alice");
        assert!(matches!(
            academy.add_material(draft("wk-3", MaterialKind::Document)),
            Err(Error::Unauthorized)
        ));

        academy.login(Role::Admin, "root");
        assert!(matches!(
            academy.add_material(draft("wk-404", MaterialKind::Document)),
            Err(Error::WorkshopNotFound(_))
        ));
        academy.add_material(draft("wk-3", MaterialKind::Document)).unwrap();
        academy.add_material(draft("wk-3", MaterialKind::Template)).unwrap();
        academy.add_material(draft("wk-2", MaterialKind::Video)).unwrap();
        academy.add_resource(draft("", MaterialKind::Link)).unwrap();
        assert_eq!(academy.materials(Some("wk-3"), None).unwrap().len(), 2);
        assert_eq!(
            academy.materials(None, Some(MaterialKind::Video)).unwrap().len(),
            1
        );

        academy.login(Role::Student, "alice");
        academy.register("wk-3").unwrap();
        assert!(academy.my_materials(None).unwrap().is_empty());
        let answers = correct_answers(&academy, "wk-3", 2);
        academy.submit_quiz("wk-3", 2, &answers).unwrap();
        let mine = academy.my_materials(None).unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|m| m.workshop_id == "wk-3"));
        assert_eq!(academy.resources(Some("wk-3")).unwrap().len(), 1);

        academy.logout();
        assert!(matches!(academy.resources(None), Err(Error::Unauthorized)));
        assert!(matches!(academy.my_materials(None), Err(Error::Unauthorized)));
    }

    #[test]
    fn two_instances_share_storage() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let tab_a = Academy::new(Config::default(), storage.clone());
        let tab_b = Academy::new(Config::default(), storage);
        tab_a.login(Role::Student, "alice");
        tab_b.login(Role::Student, "alice");

        tab_a.register("wk-1").unwrap();
        assert!(!tab_b.is_registered("wk-1"));
        assert!(tab_b.on_storage_changed(Some(REGISTRATIONS_KEY)));
        assert!(tab_b.is_registered("wk-1"));

        for module in [1, 2] {
            let answers = correct_answers(&tab_a, "wk-1", module);
            tab_a.submit_quiz("wk-1", module, &answers).unwrap();
        }
        tab_b.on_storage_changed(None);
        assert!(tab_b.is_certificate_eligible("wk-1"));

        // b unregisters; a stale notification on b must not bring it back
        tab_b.unregister("wk-1").unwrap();
        assert!(!tab_b.on_storage_changed(None));
        assert!(!tab_b.is_registered("wk-1"));
        assert!(tab_a.on_storage_changed(None));
        assert!(!tab_a.is_registered("wk-1"));
        assert!(!tab_a.is_module_complete("wk-1", 1));
    }

    #[test]
    fn reopened_directory_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            storage_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let academy = Academy::open(config.clone());
        academy.login(Role::Student, "alice");
        academy.register("wk-3").unwrap();
        let answers = correct_answers(&academy, "wk-3", 2);
        academy.submit_quiz("wk-3", 2, &answers).unwrap();
        drop(academy);

        let reopened = Academy::open(config);
        reopened.login(Role::Student, "alice");
        assert!(reopened.is_registered("wk-3"));
        assert!(reopened.is_certificate_eligible("wk-3"));
        reopened.login(Role::Student, "bob");
        assert!(!reopened.is_registered("wk-3"));
        assert!(!reopened.is_module_complete("wk-3", 2));
    }

    #[test]
    fn unavailable_storage_degrades_to_session_state() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_available(false);
        let academy = Academy::new(Config::default(), storage.clone());
        academy.login(Role::Student, "alice");
        academy.register("wk-1").unwrap();
        assert!(academy.is_registered("wk-1"));

        storage.set_available(true);
        let fresh = Academy::new(Config::default(), storage);
        fresh.login(Role::Student, "alice");
        assert!(!fresh.is_registered("wk-1"));
    }

    #[test]
    fn feedback_and_questions() {
        let academy = academy();
        let form = FeedbackForm {
            overall_satisfaction: 5,
            content_clarity: 4,
            instructor_effectiveness: 5,
            would_recommend: true,
            comments: "More exercises please".to_string(),
        };
        assert!(matches!(
            academy.submit_feedback("wk-1", None, form.clone()),
            Err(Error::Unauthorized)
        ));
        academy.login(Role::Student, "alice");
        academy.submit_feedback("wk-1", Some(2), form).unwrap();
        assert_eq!(academy.feedback_summary("wk-1").unwrap().responses, 1);

        let q = academy.ask_question("wk-1", "Recording available?").unwrap();
        academy.vote_question(&q.id).unwrap();
        academy.logout();
        assert!(matches!(
            academy.vote_question(&q.id),
            Err(Error::Unauthorized)
        ));
        academy.login(Role::Admin, "gopi");
        academy.answer_question(&q.id, "Yes, tomorrow").unwrap();
        let answered = academy.questions("wk-1", QnaFilter::Answered);
        assert_eq!(answered.len(), 1);
        assert_eq!(answered[0].votes, 1);
    }
}
