pub mod storage;
pub mod transition;
pub mod types;

pub use storage::{get_state_path, load_state, save_state};
pub use transition::{apply, Command, TransitionError};
pub use types::{
    parse_answer_entries, AnswerKey, AnswerOption, AnswerSheet, Appeal, AppealDecision,
    AppealStatus, ApprovalStatus, Candidate, ExamState, QuestionNumber, Submission,
};
