#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Login Required")]
    Unauthorized,
    #[error("Already registered for workshop {0}")]
    AlreadyRegistered(String),
    #[error("Not registered for workshop {0}")]
    NotRegistered(String),
    #[error("Quiz submitted with {} unanswered question(s)", unanswered.len())]
    IncompleteSubmission { unanswered: Vec<String> },
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Workshop not found: {0}")]
    WorkshopNotFound(String),
    #[error("Module {module} not found in workshop {workshop_id}")]
    ModuleNotFound { workshop_id: String, module: u32 },
    #[error("Module {module} of workshop {workshop_id} has no quiz")]
    NoQuiz { workshop_id: String, module: u32 },
    #[error("Invalid quiz: {0}")]
    InvalidQuiz(String),
    #[error("Material not found: {0}")]
    MaterialNotFound(String),
    #[error("Invalid material: {0}")]
    InvalidMaterial(String),
    #[error("Built-in workshop {0} cannot be modified")]
    BuiltinWorkshop(String),
    #[error("Invalid workshop: {0}")]
    InvalidWorkshop(String),
    #[error("Unknown question: {0}")]
    UnknownQuestion(String),
    #[error("Option {option:?} is not a choice of question {question_id}")]
    InvalidOption { question_id: String, option: String },
    #[error("Quiz attempt already graded, retry to answer again")]
    AttemptGraded,
    #[error("Not eligible for a certificate of workshop {0}")]
    NotEligible(String),
    #[error("Invalid feedback: {0}")]
    InvalidFeedback(String),
    #[error("Text must not be empty")]
    EmptyText,
    #[error("Question not found: {0}")]
    QuestionNotFound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
