use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: [String; 4],
    pub correct_answer: String,
}

impl Question {
    pub fn new(id: &str, text: &str, options: [&str; 4], correct_answer: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            options: options.map(str::to_string),
            correct_answer: correct_answer.to_string(),
        }
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizDefinition {
    pub id: String,
    pub title: String,
    pub questions: Vec<Question>,
}

/// Static question sets keyed by workshop id then module index, with a
/// generic set for every other module.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    quizzes: BTreeMap<String, BTreeMap<u32, QuizDefinition>>,
    default: QuizDefinition,
}

impl QuestionBank {
    pub fn new(default: QuizDefinition) -> Self {
        Self {
            quizzes: BTreeMap::new(),
            default,
        }
    }

    pub fn insert(&mut self, workshop_id: &str, module: u32, quiz: QuizDefinition) {
        self.quizzes
            .entry(workshop_id.to_string())
            .or_default()
            .insert(module, quiz);
    }

    pub fn get(&self, workshop_id: &str, module: u32) -> &QuizDefinition {
        self.get_specific(workshop_id, module)
            .unwrap_or(&self.default)
    }

    pub fn get_specific(&self, workshop_id: &str, module: u32) -> Option<&QuizDefinition> {
        self.quizzes.get(workshop_id).and_then(|m| m.get(&module))
    }

    pub fn default_quiz(&self) -> &QuizDefinition {
        &self.default
    }

    pub fn builtin() -> Self {
        let mut bank = Self::new(QuizDefinition {
            id: "default-e1".to_string(),
            title: "General Module Quiz".to_string(),
            questions: vec![
                Question::new(
                    "d-q1",
                    "What does UI stand for?",
                    ["User Interface", "Unified Input", "Unique Identifier", "User Integration"],
                    "User Interface",
                ),
                Question::new(
                    "d-q2",
                    "Which is a React hook?",
                    ["useWatch", "useState", "useFetch", "useRoute"],
                    "useState",
                ),
                Question::new(
                    "d-q3",
                    "What is semantic HTML useful for?",
                    ["Styling", "Accessibility", "Faster JS", "Bundling"],
                    "Accessibility",
                ),
            ],
        });
        bank.insert(
            "wk-1",
            2,
            QuizDefinition {
                id: "wk1-m2".to_string(),
                title: "Module 2 Quiz: Context & State".to_string(),
                questions: vec![
                    Question::new(
                        "w1-q1",
                        "Which API is best for lightweight state sharing?",
                        ["Redux", "Context API", "jQuery", "Flux"],
                        "Context API",
                    ),
                    Question::new(
                        "w1-q2",
                        "Which hook avoids unnecessary re-renders?",
                        ["useState", "useEffect", "useMemo", "useRef"],
                        "useMemo",
                    ),
                    Question::new(
                        "w1-q3",
                        "What is a selector in state management?",
                        ["A UI element", "A function to derive state", "An API call", "A CSS rule"],
                        "A function to derive state",
                    ),
                    Question::new(
                        "w1-q4",
                        "When should you prefer Context over Redux?",
                        ["Tiny apps", "Large complex apps only", "Never", "Only for animations"],
                        "Tiny apps",
                    ),
                    Question::new(
                        "w1-q5",
                        "What does immutability help prevent?",
                        [
                            "Styling issues",
                            "Unexpected state mutations",
                            "Slower bundling",
                            "Missing props",
                        ],
                        "Unexpected state mutations",
                    ),
                ],
            },
        );
        bank.insert(
            "wk-2",
            2,
            QuizDefinition {
                id: "wk2-m2".to_string(),
                title: "Module 2 Quiz: Wireframing & Prototyping".to_string(),
                questions: vec![
                    Question::new(
                        "w2-q1",
                        "What is the primary goal of wireframing?",
                        ["Final UI polish", "Define layout and flow", "Write tests", "Optimize images"],
                        "Define layout and flow",
                    ),
                    Question::new(
                        "w2-q2",
                        "Which fidelity is best for fast iteration?",
                        ["High", "Low", "Production", "None"],
                        "Low",
                    ),
                    Question::new(
                        "w2-q3",
                        "What tool is commonly used for interactive prototypes?",
                        ["Figma", "Node.js", "Git", "VS Code"],
                        "Figma",
                    ),
                    Question::new(
                        "w2-q4",
                        "What is a usability test used for?",
                        [
                            "Measure performance",
                            "Validate design with users",
                            "Compress images",
                            "Login flows only",
                        ],
                        "Validate design with users",
                    ),
                ],
            },
        );
        let grid = Question::new(
            "grid-q1",
            "What is the 8-point grid primarily used for?",
            ["Typography only", "Consistent spacing", "Routing", "State management"],
            "Consistent spacing",
        );
        bank.insert(
            "wk-3",
            2,
            QuizDefinition {
                id: "wk3-m2".to_string(),
                title: "Module 2 Quiz: Layouts & Grids".to_string(),
                questions: vec![
                    grid.clone(),
                    Question::new(
                        "w3-q2",
                        "Which CSS property controls layout flow?",
                        ["display", "color", "font-size", "alt"],
                        "display",
                    ),
                ],
            },
        );
        bank.insert(
            "wk-4",
            1,
            QuizDefinition {
                id: "wk4-m1".to_string(),
                title: "Module 1 Quiz: Color & Typography".to_string(),
                questions: vec![Question::new(
                    "w4-q1",
                    "Which contrast ratio does WCAG AA require for body text?",
                    ["2:1", "3:1", "4.5:1", "7:1"],
                    "4.5:1",
                )],
            },
        );
        bank.insert(
            "wk-4",
            2,
            QuizDefinition {
                id: "wk4-m2".to_string(),
                title: "Module 2 Quiz: Layouts & Grids".to_string(),
                questions: vec![grid],
            },
        );
        bank
    }
}
