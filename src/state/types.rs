use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 1-based question number on the answer sheet.
pub type QuestionNumber = u32;

/// A candidate's raw answers: question number -> chosen option.
/// Unanswered questions are simply absent.
pub type AnswerSheet = BTreeMap<QuestionNumber, AnswerOption>;

/// The administrator's answer key: question number -> correct option,
/// where `X` marks an annulled question.
pub type AnswerKey = BTreeMap<QuestionNumber, AnswerOption>;

/// One choice letter, or the annulment sentinel `X`.
///
/// `X` is only meaningful inside the answer key: it grants credit to
/// every candidate who answered that question, whatever they picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnswerOption {
    A,
    B,
    C,
    D,
    E,
    X,
}

impl AnswerOption {
    /// True for the annulment sentinel.
    pub fn is_annulled(&self) -> bool {
        matches!(self, AnswerOption::X)
    }
}

impl fmt::Display for AnswerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            AnswerOption::A => "A",
            AnswerOption::B => "B",
            AnswerOption::C => "C",
            AnswerOption::D => "D",
            AnswerOption::E => "E",
            AnswerOption::X => "X",
        };
        f.write_str(letter)
    }
}

impl FromStr for AnswerOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(AnswerOption::A),
            "B" => Ok(AnswerOption::B),
            "C" => Ok(AnswerOption::C),
            "D" => Ok(AnswerOption::D),
            "E" => Ok(AnswerOption::E),
            "X" => Ok(AnswerOption::X),
            other => Err(format!("invalid answer option '{}' (expected A-E or X)", other)),
        }
    }
}

/// Outcome of threshold evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Approved,
    Reproved,
}

impl ApprovalStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalStatus::Approved)
    }
}

/// Identification record captured at intake. Immutable once a
/// submission exists. Uniqueness of national id, nickname
/// (case-insensitive) and email is enforced by the transition layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub national_id: String,
    pub nickname: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
}

/// One candidate's answer sheet plus the fields derived from it.
///
/// Derived fields are a pure function of (answers, current answer key)
/// and are fully rewritten on every recalculation, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub candidate: Candidate,
    pub answers: AnswerSheet,
    pub submitted_at: DateTime<Utc>,
    pub module1_correct: u32,
    pub module2_correct: u32,
    pub module1_score: u32,
    pub module2_score: u32,
    pub total_score: u32,
    pub status: ApprovalStatus,
    #[serde(default)]
    pub reproval_reasons: Vec<String>,
}

impl Submission {
    /// Build a submission whose derived fields have not been computed
    /// yet. The scoring engine fills them in before the submission is
    /// ever stored or displayed.
    pub fn unscored(candidate: Candidate, answers: AnswerSheet, submitted_at: DateTime<Utc>) -> Self {
        Self {
            candidate,
            answers,
            submitted_at,
            module1_correct: 0,
            module2_correct: 0,
            module1_score: 0,
            module2_score: 0,
            total_score: 0,
            status: ApprovalStatus::Reproved,
            reproval_reasons: Vec::new(),
        }
    }
}

/// Lifecycle of an appeal. Pending is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppealStatus {
    Pending,
    Approved,
    Rejected,
}

/// Administrator decision attached to an approved appeal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppealDecision {
    AnnulQuestion,
    ChangeAnswer,
}

/// A candidate's request to contest one question of the answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appeal {
    pub id: String,
    pub question: QuestionNumber,
    pub national_id: String,
    pub nickname: String,
    /// Free text, opaque to the engine.
    pub justification: String,
    pub created_at: DateTime<Utc>,
    pub status: AppealStatus,
    #[serde(default)]
    pub decision: Option<AppealDecision>,
    #[serde(default)]
    pub new_answer: Option<AnswerOption>,
}

/// Current state file format version.
pub const STATE_VERSION: u32 = 1;

/// The full persisted snapshot: everything the exam knows, replaced
/// wholesale on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamState {
    pub version: u32,
    #[serde(default = "default_form_title")]
    pub form_title: String,
    #[serde(default)]
    pub appeal_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub answer_key: AnswerKey,
    #[serde(default)]
    pub submissions: Vec<Submission>,
    #[serde(default)]
    pub appeals: Vec<Appeal>,
}

fn default_form_title() -> String {
    "Assessment Form".to_string()
}

impl Default for ExamState {
    fn default() -> Self {
        Self::new()
    }
}

impl ExamState {
    /// Create a fresh empty state with the current format version.
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION,
            form_title: default_form_title(),
            appeal_deadline: None,
            answer_key: AnswerKey::new(),
            submissions: Vec::new(),
            appeals: Vec::new(),
        }
    }

    /// Look up a submission by the candidate's national id.
    pub fn find_submission(&self, national_id: &str) -> Option<&Submission> {
        self.submissions
            .iter()
            .find(|sub| sub.candidate.national_id == national_id)
    }

    /// Look up an appeal by id.
    pub fn find_appeal(&self, appeal_id: &str) -> Option<&Appeal> {
        self.appeals.iter().find(|a| a.id == appeal_id)
    }

    /// Next sequential appeal id ("appeal-1", "appeal-2", ...),
    /// derived from the highest id already present so that replaying
    /// the same commands always yields the same ids.
    pub fn next_appeal_id(&self) -> String {
        let highest = self
            .appeals
            .iter()
            .filter_map(|a| a.id.strip_prefix("appeal-"))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("appeal-{}", highest + 1)
    }
}

/// Parse an answer sheet (or answer key) from compact CLI notation:
/// comma- or whitespace-separated `question=letter` pairs, e.g.
/// `"1=A,2=C,5=E"`. Duplicate question numbers are rejected.
pub fn parse_answer_entries(input: &str) -> Result<AnswerSheet> {
    let mut sheet = AnswerSheet::new();
    for token in input.split([',', ' ', '\n', '\t']) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let Some((number, letter)) = token.split_once('=') else {
            bail!("invalid answer entry '{}' (expected question=letter, e.g. 12=C)", token);
        };
        let question: QuestionNumber = number
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid question number '{}'", number))?;
        if question == 0 {
            bail!("question numbers start at 1, got '{}'", token);
        }
        let option = AnswerOption::from_str(letter).map_err(|e| anyhow::anyhow!(e))?;
        if sheet.insert(question, option).is_some() {
            bail!("duplicate entry for question {}", question);
        }
    }
    Ok(sheet)
}
