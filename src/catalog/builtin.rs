use super::workshop::{Instructor, Lesson, LessonKind, Module, Schedule, Workshop};

fn module(index: u32, title: &str, lessons: Vec<Lesson>) -> Module {
    Module {
        index,
        title: title.to_string(),
        lessons,
    }
}

fn video(name: &str, id: &str) -> Lesson {
    Lesson::new(LessonKind::Video, name, Some(id))
}

fn article(name: &str) -> Lesson {
    Lesson::new(LessonKind::Article, name, None)
}

fn quiz(name: &str) -> Lesson {
    Lesson::new(LessonKind::Quiz, name, None)
}

fn schedule(date: &str, time: &str, duration: &str) -> Schedule {
    Schedule {
        date: date.to_string(),
        time: time.to_string(),
        duration: duration.to_string(),
    }
}

fn instructor(name: &str, expertise: &str) -> Instructor {
    Instructor {
        name: name.to_string(),
        expertise: expertise.to_string(),
    }
}

/// Workshops shipped with the application.
pub fn workshops() -> Vec<Workshop> {
    vec![
        Workshop {
            id: "wk-1".to_string(),
            title: "Advanced React Patterns".to_string(),
            topic: "Technology".to_string(),
            audience: "Professionals".to_string(),
            description: "Dive deep into advanced React patterns, including hooks, context, \
                and performance optimization techniques."
                .to_string(),
            instructor: instructor("Arepalli Gopi", "Technology"),
            schedule: schedule("Thursday, August 15, 2024", "7:30 PM", "120 minutes"),
            modules: vec![
                module(
                    1,
                    "Custom Hooks & Performance",
                    vec![
                        video("Building custom hooks", "hooks-101"),
                        article("Memoization in practice"),
                        quiz("Module 1 Quiz"),
                    ],
                ),
                module(
                    2,
                    "Advanced Context & State",
                    vec![
                        video("Context without re-renders", "context-201"),
                        quiz("Module 2 Quiz: Context & State"),
                    ],
                ),
                module(3, "Wrap-up", vec![article("Further reading")]),
            ],
        },
        Workshop {
            id: "wk-2".to_string(),
            title: "UI/UX Design Fundamentals".to_string(),
            topic: "Arts".to_string(),
            audience: "Beginners".to_string(),
            description: "Learn the core principles of UI and UX design, focusing on \
                wireframing, prototyping, and user-centered design methodologies."
                .to_string(),
            instructor: instructor("Jane Smith", "Design"),
            schedule: schedule("Tuesday, August 20, 2024", "11:50 AM", "90 minutes"),
            modules: vec![
                module(
                    1,
                    "Design Thinking",
                    vec![video("What is UX", "ux-intro"), article("Personas")],
                ),
                module(
                    2,
                    "Wireframing & Prototyping",
                    vec![
                        video("Low fidelity first", "wireframes"),
                        quiz("Module 2 Quiz: Wireframing & Prototyping"),
                    ],
                ),
            ],
        },
        Workshop {
            id: "wk-3".to_string(),
            title: "Responsive Layout Systems".to_string(),
            topic: "Technology".to_string(),
            audience: "Students".to_string(),
            description: "Spacing systems, grids and CSS layout flow for interfaces that \
                adapt to every screen."
                .to_string(),
            instructor: instructor("Arepalli Gopi", "Front-end"),
            schedule: schedule("Saturday, September 1, 2024", "9:30 AM", "90 minutes"),
            modules: vec![
                module(1, "Box Model Refresher", vec![article("Margins and padding")]),
                module(
                    2,
                    "Layouts & Grids",
                    vec![
                        video("The 8-point grid", "grid-8pt"),
                        quiz("Module 2 Quiz: Layouts & Grids"),
                    ],
                ),
            ],
        },
        Workshop {
            id: "wk-4".to_string(),
            title: "Visual Design Essentials".to_string(),
            topic: "Arts".to_string(),
            audience: "Beginners".to_string(),
            description: "Color, typography and layout fundamentals for product teams."
                .to_string(),
            instructor: instructor("Jane Smith", "Design"),
            schedule: schedule("Monday, September 9, 2024", "6:00 PM", "60 minutes"),
            modules: vec![
                module(
                    1,
                    "Color & Typography",
                    vec![
                        video("Building a palette", "color"),
                        quiz("Module 1 Quiz: Color & Typography"),
                    ],
                ),
                module(
                    2,
                    "Layouts & Grids",
                    vec![quiz("Module 2 Quiz: Layouts & Grids")],
                ),
            ],
        },
        Workshop {
            id: "wk-5".to_string(),
            title: "Growth Hacking for Startups".to_string(),
            topic: "Marketing".to_string(),
            audience: "Students".to_string(),
            description: "Strategies for rapid business growth using low-cost digital \
                techniques. Understand AARRR metrics and how to scale a startup."
                .to_string(),
            instructor: instructor("Arepalli Gopi", "Marketing"),
            schedule: schedule("Saturday, September 14, 2024", "9:30 PM", "90 minutes"),
            modules: vec![module(
                1,
                "Funnels & Metrics",
                vec![video("AARRR explained", "aarrr"), article("Case studies")],
            )],
        },
    ]
}
