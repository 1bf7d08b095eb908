use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use examrank::appeal::Verdict;
use examrank::ranking::{self, RankingView};
use examrank::scoring::{validate_exam, ExamConfig};
use examrank::state::{
    self, apply, parse_answer_entries, AnswerOption, AppealDecision, Candidate, Command as StateCommand,
    ExamState,
};

const EXIT_SUCCESS: u8 = 0;
const EXIT_VALIDATION: u8 = 1;
const EXIT_STORAGE: u8 = 2;
const EXIT_CONFIG: u8 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit a candidate's answer sheet
    Submit {
        #[command(flatten)]
        identification: Identification,

        /// Answers as question=letter pairs, e.g. "1=A,2=C,41=E"
        answers: String,
    },
    /// Show a candidate's stored result and rank
    Results {
        /// National id used at submission time
        national_id: String,
    },
    /// Show the ranking for a view
    Ranking {
        /// Which candidates to rank
        #[arg(long, value_enum, default_value = "all")]
        view: ViewArg,
    },
    /// Inspect or replace the answer key
    #[command(subcommand)]
    Key(KeyCommands),
    /// File, list or resolve appeals
    #[command(subcommand)]
    Appeal(AppealCommands),
    /// Set or clear the appeal deadline
    SetDeadline {
        /// RFC 3339 timestamp, e.g. 2026-09-30T23:59:59Z
        deadline: Option<DateTime<Utc>>,

        /// Remove the deadline entirely
        #[arg(long, conflicts_with = "deadline")]
        clear: bool,
    },
    /// Rename the assessment form
    SetTitle { title: String },
    /// Wipe all submissions, appeals and the answer key
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct Identification {
    /// Unique national id
    #[arg(long)]
    national_id: String,

    /// Unique display nickname (case-insensitive)
    #[arg(long)]
    nickname: String,

    /// Contact email
    #[arg(long)]
    email: String,

    /// Date of birth, YYYY-MM-DD
    #[arg(long)]
    dob: NaiveDate,
}

#[derive(Subcommand, Debug)]
enum KeyCommands {
    /// Print the current answer key
    Show,
    /// Replace the whole key; every question must get an entry
    Set {
        /// Entries as question=letter pairs; X marks an annulled question
        entries: String,
    },
}

#[derive(Subcommand, Debug)]
enum AppealCommands {
    /// File an appeal against one question
    File {
        /// Question number being contested
        question: u32,

        /// National id of the appellant (must have a submission)
        #[arg(long)]
        national_id: String,

        /// Why the key entry is wrong
        #[arg(long)]
        justification: String,
    },
    /// List all appeals
    List,
    /// Rule on a pending appeal
    Resolve {
        /// Appeal id, e.g. appeal-3
        id: String,

        /// Approve without touching the key
        #[arg(long, conflicts_with_all = ["reject", "annul", "change_to"])]
        approve: bool,

        /// Reject the appeal
        #[arg(long, conflicts_with_all = ["annul", "change_to"])]
        reject: bool,

        /// Approve and annul the contested question
        #[arg(long, conflicts_with = "change_to")]
        annul: bool,

        /// Approve and change the correct answer to this option
        #[arg(long, value_name = "LETTER")]
        change_to: Option<AnswerOption>,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ViewArg {
    All,
    Approved,
    Reproved,
}

impl From<ViewArg> for RankingView {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::All => RankingView::All,
            ViewArg::Approved => RankingView::Approved,
            ViewArg::Reproved => RankingView::Reproved,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "examrank")]
#[command(about = "Score and rank multiple-choice exam submissions", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/examrank/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to state file (defaults to ~/.config/examrank/state.json)
    #[arg(short, long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match examrank::config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if let Err(errors) = validate_exam(&config) {
        eprintln!("Exam config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return ExitCode::from(EXIT_CONFIG);
    }

    let state_path = cli.state.clone().unwrap_or_else(state::get_state_path);
    let current = match state::load_state(&state_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("State error: {}", e);
            return ExitCode::from(EXIT_STORAGE);
        }
    };

    if cli.verbose {
        eprintln!(
            "Loaded state from {}: {} submissions, {} appeals, key entries {}/{}",
            state_path.display(),
            current.submissions.len(),
            current.appeals.len(),
            current.answer_key.len(),
            config.total_questions
        );
    }

    run(cli, config, current, state_path)
}

fn run(cli: Cli, config: ExamConfig, current: ExamState, state_path: PathBuf) -> ExitCode {
    let use_colors = examrank::output::should_use_colors();
    let now = Utc::now();
    let today = now.date_naive();

    match cli.command {
        Commands::Submit { identification, answers } => {
            let answers = match parse_answer_entries(&answers) {
                Ok(sheet) => sheet,
                Err(e) => {
                    eprintln!("Invalid answers: {}", e);
                    return ExitCode::from(EXIT_VALIDATION);
                }
            };
            let candidate = Candidate {
                national_id: identification.national_id.clone(),
                nickname: identification.nickname,
                email: identification.email,
                date_of_birth: identification.dob,
            };
            let command = StateCommand::SubmitAnswers { candidate, answers };

            commit(&current, command, &config, &state_path, cli.verbose, |next| {
                let submission = next
                    .find_submission(&identification.national_id)
                    .expect("submission was just stored");
                let view = status_view(submission);
                let position =
                    ranking::position_of(&next.submissions, view, today, &identification.national_id);
                println!(
                    "{}",
                    examrank::output::format_result_detail(submission, &config, position, use_colors)
                );
            })
        }
        Commands::Results { national_id } => {
            let Some(submission) = current.find_submission(&national_id) else {
                eprintln!(
                    "No submission found for national id '{}'. Submit an answer sheet first.",
                    national_id
                );
                return ExitCode::from(EXIT_VALIDATION);
            };
            // Rank within the candidate's own status view, so approved
            // and reproved candidates each compete among themselves
            let view = status_view(submission);
            let position = ranking::position_of(&current.submissions, view, today, &national_id);
            println!(
                "{}",
                examrank::output::format_result_detail(submission, &config, position, use_colors)
            );
            ExitCode::from(EXIT_SUCCESS)
        }
        Commands::Ranking { view } => {
            let entries = ranking::rank(&current.submissions, view.into(), today);
            println!("{}", examrank::output::format_ranking_table(&entries, use_colors));
            ExitCode::from(EXIT_SUCCESS)
        }
        Commands::Key(KeyCommands::Show) => {
            println!(
                "{}",
                examrank::output::format_answer_key(&current.answer_key, &config)
            );
            ExitCode::from(EXIT_SUCCESS)
        }
        Commands::Key(KeyCommands::Set { entries }) => {
            let answer_key = match parse_answer_entries(&entries) {
                Ok(key) => key,
                Err(e) => {
                    eprintln!("Invalid answer key: {}", e);
                    return ExitCode::from(EXIT_VALIDATION);
                }
            };
            let command = StateCommand::ReplaceAnswerKey { answer_key };
            commit(&current, command, &config, &state_path, cli.verbose, |next| {
                println!(
                    "Answer key updated; {} submissions recalculated.",
                    next.submissions.len()
                );
            })
        }
        Commands::Appeal(AppealCommands::File { question, national_id, justification }) => {
            let command = StateCommand::FileAppeal { question, national_id, justification };
            commit(&current, command, &config, &state_path, cli.verbose, |next| {
                let appeal = next.appeals.last().expect("appeal was just stored");
                println!("Filed {} against question {}.", appeal.id, appeal.question);
            })
        }
        Commands::Appeal(AppealCommands::List) => {
            if current.appeals.is_empty() {
                println!("No appeals filed.");
            } else {
                for appeal in &current.appeals {
                    println!("{}", examrank::output::format_appeal_line(appeal, use_colors));
                }
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Commands::Appeal(AppealCommands::Resolve { id, approve, reject, annul, change_to }) => {
            let verdict = if reject {
                Verdict::Reject
            } else if annul {
                Verdict::Approve {
                    decision: Some(AppealDecision::AnnulQuestion),
                    new_answer: None,
                }
            } else if let Some(option) = change_to {
                Verdict::Approve {
                    decision: Some(AppealDecision::ChangeAnswer),
                    new_answer: Some(option),
                }
            } else if approve {
                Verdict::Approve { decision: None, new_answer: None }
            } else {
                eprintln!("Choose one of --approve, --reject, --annul or --change-to.");
                return ExitCode::from(EXIT_VALIDATION);
            };

            let command = StateCommand::ResolveAppeal { appeal_id: id.clone(), verdict };
            commit(&current, command, &config, &state_path, cli.verbose, |next| {
                let appeal = next.find_appeal(&id).expect("appeal still stored");
                println!("{} is now {:?}.", appeal.id, appeal.status);
                if next.answer_key != current.answer_key {
                    println!(
                        "Answer key updated; {} submissions recalculated.",
                        next.submissions.len()
                    );
                }
            })
        }
        Commands::SetDeadline { deadline, clear } => {
            if deadline.is_none() && !clear {
                eprintln!("Provide a deadline or pass --clear.");
                return ExitCode::from(EXIT_VALIDATION);
            }
            let command = StateCommand::SetAppealDeadline { deadline };
            commit(&current, command, &config, &state_path, cli.verbose, |next| {
                match next.appeal_deadline {
                    Some(deadline) => println!("Appeal deadline set to {}.", deadline),
                    None => println!("Appeal deadline cleared."),
                }
            })
        }
        Commands::SetTitle { title } => {
            let command = StateCommand::SetFormTitle { title };
            commit(&current, command, &config, &state_path, cli.verbose, |next| {
                println!("Form title set to '{}'.", next.form_title);
            })
        }
        Commands::Reset { yes } => {
            if !yes {
                eprintln!("Refusing to wipe all data without --yes.");
                return ExitCode::from(EXIT_VALIDATION);
            }
            commit(&current, StateCommand::Reset, &config, &state_path, cli.verbose, |_next| {
                println!("All data restored to the initial state.");
            })
        }
    }
}

fn status_view(submission: &examrank::state::Submission) -> RankingView {
    if submission.status.is_approved() {
        RankingView::Approved
    } else {
        RankingView::Reproved
    }
}

/// Apply a command and persist the complete next state atomically.
/// On any failure the previous state file is left untouched.
fn commit(
    current: &ExamState,
    command: StateCommand,
    config: &ExamConfig,
    state_path: &PathBuf,
    verbose: bool,
    on_success: impl FnOnce(&ExamState),
) -> ExitCode {
    let next = match apply(current, command, config, Utc::now()) {
        Ok(next) => next,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_VALIDATION);
        }
    };

    if let Err(e) = state::save_state(state_path, &next) {
        eprintln!("Failed to persist state: {}", e);
        return ExitCode::from(EXIT_STORAGE);
    }

    if verbose {
        eprintln!("State saved to {}", state_path.display());
    }

    on_success(&next);
    ExitCode::from(EXIT_SUCCESS)
}
