use std::{collections::BTreeMap, path::PathBuf};

use clap::Parser;
use workshop_hub::{
    Academy,
    catalog::CatalogQuery,
    config::Config,
    feedback::FeedbackForm,
    ledger::{RegistrationFilter, RegistrationStatus},
    materials::{Material, MaterialDraft, MaterialKind},
    qna::QnaFilter,
    session::Role,
    utils::init_log,
};

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
    /// Directory holding the persisted store, overrides the config file
    #[arg(short, long)]
    storage: Option<PathBuf>,
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Learner or admin name to act as
    #[arg(short, long)]
    user: Option<String>,
    #[arg(short, long, default_value = "student")]
    role: Role,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// List the catalog
    Workshops {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        audience: Option<String>,
    },
    Show {
        id: String,
    },
    Register {
        id: String,
    },
    Unregister {
        id: String,
    },
    /// The current student's registrations
    Registrations,
    /// Print a module quiz, or grade it when answers are given as `question=option`
    Quiz {
        workshop: String,
        module: u32,
        #[arg(value_parser = parse_answer)]
        answers: Vec<(String, String)>,
    },
    Certificate {
        id: String,
    },
    Feedback {
        id: String,
        #[arg(long)]
        module: Option<u32>,
        #[arg(long)]
        overall: u8,
        #[arg(long)]
        clarity: u8,
        #[arg(long)]
        instructor: u8,
        #[arg(long)]
        recommend: bool,
        #[arg(long, default_value = "")]
        comments: String,
    },
    Ask {
        id: String,
        text: String,
    },
    Answer {
        question: String,
        text: String,
    },
    Vote {
        question: String,
    },
    Questions {
        id: String,
        #[arg(long, value_enum, default_value = "all")]
        filter: QuestionFilter,
    },
    /// Training materials of completed workshops
    Materials {
        #[arg(long)]
        workshop: Option<String>,
    },
    /// Post-training resources
    Resources {
        #[arg(long)]
        workshop: Option<String>,
    },
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Debug, clap::Subcommand)]
enum AdminCommand {
    List {
        #[arg(long)]
        status: Option<RegistrationStatus>,
        #[arg(long)]
        search: Option<String>,
    },
    Approve { learner: String, workshop: String },
    Reject { learner: String, workshop: String },
    Remove { learner: String, workshop: String },
    Stats,
    DeleteWorkshop { id: String },
    Feedback { id: String },
    Materials {
        #[arg(long)]
        workshop: Option<String>,
        #[arg(long = "type")]
        kind: Option<MaterialKind>,
    },
    AddMaterial {
        #[command(flatten)]
        material: MaterialArgs,
    },
    DeleteMaterial { id: String },
    AddResource {
        #[command(flatten)]
        material: MaterialArgs,
    },
    DeleteResource { id: String },
}

#[derive(Debug, clap::Args)]
struct MaterialArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    url: String,
    #[arg(long, default_value = "")]
    workshop: String,
    #[arg(long = "type", default_value = "document")]
    kind: MaterialKind,
    #[arg(long, default_value = "")]
    description: String,
}

impl From<MaterialArgs> for MaterialDraft {
    fn from(args: MaterialArgs) -> Self {
        MaterialDraft {
            title: args.title,
            description: args.description,
            workshop_id: args.workshop,
            kind: args.kind,
            url: args.url,
        }
    }
}

fn print_materials(materials: &[Material]) {
    for m in materials {
        println!("{:<24} {:<10} {:<12} {} <{}>", m.id, m.kind, m.workshop_id, m.title, m.url);
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum QuestionFilter {
    All,
    Answered,
    Unanswered,
}

impl From<QuestionFilter> for QnaFilter {
    fn from(filter: QuestionFilter) -> Self {
        match filter {
            QuestionFilter::All => QnaFilter::All,
            QuestionFilter::Answered => QnaFilter::Answered,
            QuestionFilter::Unanswered => QnaFilter::Unanswered,
        }
    }
}

fn parse_answer(s: &str) -> anyhow::Result<(String, String)> {
    let (question, option) = s
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("expected question=option, got {:?}", s))?;
    Ok((question.trim().to_string(), option.trim().to_string()))
}

const DEFAULT_STORAGE_DIR: &str = "workshop-data";

fn main() {
    let args = Args::parse();
    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:?}", e);
            std::process::exit(1);
        }
    };
    let guard = init_log(config.log_dir.clone());
    let code = match run(args, config) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{:?}", e);
            1
        }
    };
    // flush buffered log lines before exiting
    drop(guard);
    std::process::exit(code);
}

/// `--storage` wins over the config file and environment, which win over
/// the default directory.
fn storage_dir(flag: Option<PathBuf>, configured: Option<PathBuf>) -> PathBuf {
    flag.or(configured)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR))
}

fn run(args: Args, mut config: Config) -> anyhow::Result<()> {
    config.storage_dir = Some(storage_dir(args.storage, config.storage_dir.take()));
    let academy = Academy::open(config);
    if let Some(user) = &args.user {
        academy.login(args.role, user);
    }

    match args.command {
        Commands::Workshops {
            search,
            topic,
            audience,
        } => {
            let query = CatalogQuery {
                text: search,
                topic,
                audience,
            };
            for w in academy.search(&query) {
                println!("{:<24} {:<40} {}", w.id, w.title, w.schedule);
            }
        }
        Commands::Show { id } => {
            let w = academy
                .workshop(&id)
                .ok_or_else(|| anyhow::anyhow!("workshop not found: {}", id))?;
            println!("{} [{}]", w.title, w.id);
            println!("{}", w.schedule);
            println!("Instructor: {}", w.instructor.name);
            println!("{}", w.description);
            for m in &w.modules {
                let done = if academy.is_module_complete(&w.id, m.index) {
                    " (completed)"
                } else {
                    ""
                };
                println!("  Module {}: {}{}", m.index, m.title, done);
                for lesson in &m.lessons {
                    println!("    - {:?} {}", lesson.kind, lesson.name);
                }
            }
            if academy.session().role() == Some(Role::Student) {
                let (passed, required) = academy.certificate_progress(&w.id)?;
                println!("Quizzes passed: {}/{}", passed, required);
            }
        }
        Commands::Register { id } => {
            let r = academy.register(&id)?;
            println!("Registered for {} ({})", r.workshop_title, r.status);
        }
        Commands::Unregister { id } => {
            academy.unregister(&id)?;
            println!("Unregistered from {}", id);
        }
        Commands::Registrations => {
            for r in academy.my_registrations()? {
                println!("{:<24} {:<40} {}", r.workshop_id, r.workshop_title, r.status);
            }
        }
        Commands::Quiz {
            workshop,
            module,
            answers,
        } => {
            if answers.is_empty() {
                let attempt = academy.open_quiz(&workshop, module)?;
                println!("{}", attempt.quiz().title);
                for q in &attempt.quiz().questions {
                    println!("[{}] {}", q.id, q.text);
                    for option in &q.options {
                        println!("    {}", option);
                    }
                }
            } else {
                let answers: BTreeMap<String, String> = answers.into_iter().collect();
                let outcome = academy.submit_quiz(&workshop, module, &answers)?;
                println!(
                    "Score: {}% ({}/{}) - {}",
                    outcome.display_score(),
                    outcome.correct,
                    outcome.total,
                    if outcome.passed { "passed" } else { "failed" }
                );
            }
        }
        Commands::Certificate { id } => {
            let cert = academy.issue_certificate(&id)?;
            println!("{}", serde_json::to_string_pretty(&cert)?);
        }
        Commands::Feedback {
            id,
            module,
            overall,
            clarity,
            instructor,
            recommend,
            comments,
        } => {
            let form = FeedbackForm {
                overall_satisfaction: overall,
                content_clarity: clarity,
                instructor_effectiveness: instructor,
                would_recommend: recommend,
                comments,
            };
            academy.submit_feedback(&id, module, form)?;
            println!("Thanks for your feedback on {}", id);
        }
        Commands::Ask { id, text } => {
            let q = academy.ask_question(&id, &text)?;
            println!("Question {} posted", q.id);
        }
        Commands::Answer { question, text } => {
            let a = academy.answer_question(&question, &text)?;
            println!("Answer {} posted", a.id);
        }
        Commands::Vote { question } => {
            let votes = academy.vote_question(&question)?;
            println!("{} now has {} vote(s)", question, votes);
        }
        Commands::Questions { id, filter } => {
            for q in academy.questions(&id, filter.into()) {
                println!("[{}] ({} votes) {}: {}", q.id, q.votes, q.asked_by, q.text);
                for a in &q.answers {
                    println!("    {} ({:?}): {}", a.author_name, a.author, a.text);
                }
            }
        }
        Commands::Materials { workshop } => {
            print_materials(&academy.my_materials(workshop.as_deref())?);
        }
        Commands::Resources { workshop } => {
            print_materials(&academy.resources(workshop.as_deref())?);
        }
        Commands::Admin { command } => match command {
            AdminCommand::List { status, search } => {
                let filter = RegistrationFilter { status, search };
                for r in academy.registrations(&filter)? {
                    println!(
                        "{:<16} {:<24} {:<10} {}",
                        r.learner, r.workshop_id, r.status, r.workshop_title
                    );
                }
            }
            AdminCommand::Approve { learner, workshop } => {
                academy.approve_registration(&learner, &workshop)?;
                println!("Approved {} for {}", learner, workshop);
            }
            AdminCommand::Reject { learner, workshop } => {
                academy.reject_registration(&learner, &workshop)?;
                println!("Rejected {} for {}", learner, workshop);
            }
            AdminCommand::Remove { learner, workshop } => {
                academy.remove_registration(&learner, &workshop)?;
                println!("Removed {} from {}", learner, workshop);
            }
            AdminCommand::Stats => {
                let stats = academy.registration_stats()?;
                println!(
                    "total {}, approved {}, pending {}, rejected {}",
                    stats.total(),
                    stats.approved,
                    stats.pending,
                    stats.rejected
                );
            }
            AdminCommand::DeleteWorkshop { id } => {
                let w = academy.delete_workshop(&id)?;
                println!("Deleted workshop {} ({})", w.id, w.title);
            }
            AdminCommand::Feedback { id } => match academy.feedback_summary(&id) {
                Some(s) => println!(
                    "{} response(s): satisfaction {:.1}, clarity {:.1}, instructor {:.1}, recommend {:.0}%",
                    s.responses,
                    s.overall_satisfaction,
                    s.content_clarity,
                    s.instructor_effectiveness,
                    s.recommend_rate * 100.0
                ),
                None => println!("No feedback for {}", id),
            },
            AdminCommand::Materials { workshop, kind } => {
                print_materials(&academy.materials(workshop.as_deref(), kind)?);
            }
            AdminCommand::AddMaterial { material } => {
                let m = academy.add_material(material.into())?;
                println!("Added material {}", m.id);
            }
            AdminCommand::DeleteMaterial { id } => {
                academy.delete_material(&id)?;
                println!("Deleted material {}", id);
            }
            AdminCommand::AddResource { material } => {
                let m = academy.add_resource(material.into())?;
                println!("Added resource {}", m.id);
            }
            AdminCommand::DeleteResource { id } => {
                academy.delete_resource(&id)?;
                println!("Deleted resource {}", id);
            }
        },
    }
    Ok(())
}
