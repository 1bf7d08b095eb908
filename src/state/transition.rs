use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

use super::types::{
    Appeal, AppealStatus, AnswerKey, AnswerSheet, Candidate, ExamState, QuestionNumber, Submission,
};
use crate::appeal::{self, Verdict};
use crate::scoring::{self, ExamConfig};

/// A state-mutating operation. Every command maps the current state to
/// a complete next state; nothing is patched in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Intake of one candidate's answer sheet.
    SubmitAnswers {
        candidate: Candidate,
        answers: AnswerSheet,
    },
    /// Administrator replaces the whole answer key.
    ReplaceAnswerKey { answer_key: AnswerKey },
    /// A candidate contests one question of the key.
    FileAppeal {
        question: QuestionNumber,
        national_id: String,
        justification: String,
    },
    /// Administrator rules on a pending appeal.
    ResolveAppeal { appeal_id: String, verdict: Verdict },
    /// Administrator sets or clears the appeal deadline.
    SetAppealDeadline { deadline: Option<DateTime<Utc>> },
    /// Administrator renames the form.
    SetFormTitle { title: String },
    /// Administrator wipes everything back to the initial state.
    Reset,
}

/// Precondition failures. These never leave a half-applied state
/// behind; the caller keeps the prior state untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("national id '{0}' already has a submission")]
    DuplicateNationalId(String),

    #[error("nickname '{0}' is already taken")]
    DuplicateNickname(String),

    #[error("email '{0}' already has a submission")]
    DuplicateEmail(String),

    #[error("question {question} is out of range 1..={total}")]
    QuestionOutOfRange { question: QuestionNumber, total: u32 },

    #[error("answer key must cover every question 1..={total}; question {missing} is missing")]
    IncompleteAnswerKey { missing: QuestionNumber, total: u32 },

    #[error("no submission found for national id '{0}'")]
    UnknownCandidate(String),

    #[error("no appeal found with id '{0}'")]
    UnknownAppeal(String),

    #[error("appeal '{0}' has already been resolved")]
    AppealAlreadyResolved(String),

    #[error("the appeal deadline has passed")]
    AppealDeadlinePassed,
}

/// Apply one command to the current state, producing the complete next
/// state. Pure: the input state is never modified, and the same
/// (state, command, config, now) always yields the same result.
///
/// Whenever a command changes the answer key, every submission's
/// derived fields are recalculated inside the same transition, so no
/// returned state ever pairs a new key with stale scores.
pub fn apply(
    state: &ExamState,
    command: Command,
    config: &ExamConfig,
    now: DateTime<Utc>,
) -> Result<ExamState, TransitionError> {
    match command {
        Command::SubmitAnswers { candidate, answers } => {
            submit_answers(state, candidate, answers, config, now)
        }
        Command::ReplaceAnswerKey { answer_key } => replace_answer_key(state, answer_key, config),
        Command::FileAppeal {
            question,
            national_id,
            justification,
        } => file_appeal(state, question, national_id, justification, config, now),
        Command::ResolveAppeal { appeal_id, verdict } => {
            resolve_appeal(state, &appeal_id, verdict, config)
        }
        Command::SetAppealDeadline { deadline } => {
            let mut next = state.clone();
            next.appeal_deadline = deadline;
            Ok(next)
        }
        Command::SetFormTitle { title } => {
            let mut next = state.clone();
            next.form_title = title;
            Ok(next)
        }
        Command::Reset => Ok(ExamState::new()),
    }
}

fn submit_answers(
    state: &ExamState,
    candidate: Candidate,
    answers: AnswerSheet,
    config: &ExamConfig,
    now: DateTime<Utc>,
) -> Result<ExamState, TransitionError> {
    check_question_range(answers.keys(), config)?;

    // Uniqueness indexes instead of per-candidate array scans
    let mut national_ids = HashSet::new();
    let mut nicknames = HashSet::new();
    let mut emails = HashSet::new();
    for sub in &state.submissions {
        national_ids.insert(sub.candidate.national_id.as_str());
        nicknames.insert(sub.candidate.nickname.to_lowercase());
        emails.insert(sub.candidate.email.as_str());
    }

    if national_ids.contains(candidate.national_id.as_str()) {
        return Err(TransitionError::DuplicateNationalId(candidate.national_id));
    }
    if nicknames.contains(&candidate.nickname.to_lowercase()) {
        return Err(TransitionError::DuplicateNickname(candidate.nickname));
    }
    if emails.contains(candidate.email.as_str()) {
        return Err(TransitionError::DuplicateEmail(candidate.email));
    }

    let mut submission = Submission::unscored(candidate, answers, now);
    scoring::score(&submission.answers, &state.answer_key, config).apply_to(&mut submission);

    let mut next = state.clone();
    next.submissions.push(submission);
    Ok(next)
}

fn replace_answer_key(
    state: &ExamState,
    answer_key: AnswerKey,
    config: &ExamConfig,
) -> Result<ExamState, TransitionError> {
    check_question_range(answer_key.keys(), config)?;
    for question in 1..=config.total_questions {
        if !answer_key.contains_key(&question) {
            return Err(TransitionError::IncompleteAnswerKey {
                missing: question,
                total: config.total_questions,
            });
        }
    }

    let mut next = state.clone();
    next.submissions = scoring::recalculate_all(&state.submissions, &answer_key, config);
    next.answer_key = answer_key;
    Ok(next)
}

fn file_appeal(
    state: &ExamState,
    question: QuestionNumber,
    national_id: String,
    justification: String,
    config: &ExamConfig,
    now: DateTime<Utc>,
) -> Result<ExamState, TransitionError> {
    if question == 0 || question > config.total_questions {
        return Err(TransitionError::QuestionOutOfRange {
            question,
            total: config.total_questions,
        });
    }
    if let Some(deadline) = state.appeal_deadline {
        if now > deadline {
            return Err(TransitionError::AppealDeadlinePassed);
        }
    }
    let Some(submission) = state.find_submission(&national_id) else {
        return Err(TransitionError::UnknownCandidate(national_id));
    };

    let appeal = Appeal {
        id: state.next_appeal_id(),
        question,
        national_id,
        nickname: submission.candidate.nickname.clone(),
        justification,
        created_at: now,
        status: AppealStatus::Pending,
        decision: None,
        new_answer: None,
    };

    let mut next = state.clone();
    next.appeals.push(appeal);
    Ok(next)
}

fn resolve_appeal(
    state: &ExamState,
    appeal_id: &str,
    verdict: Verdict,
    config: &ExamConfig,
) -> Result<ExamState, TransitionError> {
    let Some(appeal) = state.find_appeal(appeal_id) else {
        return Err(TransitionError::UnknownAppeal(appeal_id.to_string()));
    };
    if appeal.status != AppealStatus::Pending {
        return Err(TransitionError::AppealAlreadyResolved(appeal_id.to_string()));
    }

    let resolution = appeal::resolve(appeal, verdict, &state.answer_key);

    let mut next = state.clone();
    if resolution.recalculation_needed {
        // Key change and rescored submissions land in the same state
        // value; no observer can see one without the other.
        next.submissions =
            scoring::recalculate_all(&state.submissions, &resolution.answer_key, config);
        next.answer_key = resolution.answer_key;
    }
    for stored in next.appeals.iter_mut() {
        if stored.id == appeal_id {
            *stored = resolution.appeal;
            break;
        }
    }
    Ok(next)
}

fn check_question_range<'a, I>(questions: I, config: &ExamConfig) -> Result<(), TransitionError>
where
    I: IntoIterator<Item = &'a QuestionNumber>,
{
    for &question in questions {
        if question == 0 || question > config.total_questions {
            return Err(TransitionError::QuestionOutOfRange {
                question,
                total: config.total_questions,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::types::{AnswerOption, AppealDecision, ApprovalStatus};
    use chrono::{NaiveDate, TimeZone};

    fn small_config() -> ExamConfig {
        ExamConfig {
            total_questions: 4,
            module_boundary: 2,
            module1_points: 10,
            module2_points: 15,
            min_module1_correct: 1,
            min_module2_correct: 1,
            min_total_correct: 2,
        }
    }

    fn full_key() -> AnswerKey {
        [
            (1, AnswerOption::A),
            (2, AnswerOption::B),
            (3, AnswerOption::C),
            (4, AnswerOption::D),
        ]
        .into_iter()
        .collect()
    }

    fn candidate(id: &str, nickname: &str) -> Candidate {
        Candidate {
            national_id: id.to_string(),
            nickname: nickname.to_string(),
            email: format!("{}@example.com", nickname),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 3, 12).unwrap(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    fn seeded_state() -> ExamState {
        let mut state = ExamState::new();
        state.answer_key = full_key();
        state
    }

    fn sheet(entries: &[(u32, AnswerOption)]) -> AnswerSheet {
        entries.iter().copied().collect()
    }

    fn submit(state: &ExamState, id: &str, nickname: &str, answers: AnswerSheet) -> ExamState {
        apply(
            state,
            Command::SubmitAnswers {
                candidate: candidate(id, nickname),
                answers,
            },
            &small_config(),
            now(),
        )
        .unwrap()
    }

    #[test]
    fn test_submit_scores_immediately() {
        let state = submit(
            &seeded_state(),
            "1",
            "ana",
            sheet(&[(1, AnswerOption::A), (3, AnswerOption::C)]),
        );

        assert_eq!(state.submissions.len(), 1);
        let sub = &state.submissions[0];
        assert_eq!(sub.total_score, 25);
        assert_eq!(sub.status, ApprovalStatus::Approved);
    }

    #[test]
    fn test_submit_rejects_duplicate_national_id() {
        let state = submit(&seeded_state(), "1", "ana", AnswerSheet::new());
        let err = apply(
            &state,
            Command::SubmitAnswers {
                candidate: candidate("1", "other"),
                answers: AnswerSheet::new(),
            },
            &small_config(),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::DuplicateNationalId("1".to_string()));
    }

    #[test]
    fn test_submit_rejects_nickname_case_insensitively() {
        let state = submit(&seeded_state(), "1", "Ana", AnswerSheet::new());
        let err = apply(
            &state,
            Command::SubmitAnswers {
                candidate: candidate("2", "aNA"),
                answers: AnswerSheet::new(),
            },
            &small_config(),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::DuplicateNickname("aNA".to_string()));
    }

    #[test]
    fn test_submit_rejects_duplicate_email() {
        let state = submit(&seeded_state(), "1", "ana", AnswerSheet::new());
        let mut dup = candidate("2", "bruna");
        dup.email = "ana@example.com".to_string();
        let err = apply(
            &state,
            Command::SubmitAnswers {
                candidate: dup,
                answers: AnswerSheet::new(),
            },
            &small_config(),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::DuplicateEmail("ana@example.com".to_string()));
    }

    #[test]
    fn test_submit_rejects_out_of_range_question() {
        let err = apply(
            &seeded_state(),
            Command::SubmitAnswers {
                candidate: candidate("1", "ana"),
                answers: sheet(&[(5, AnswerOption::A)]),
            },
            &small_config(),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::QuestionOutOfRange { question: 5, total: 4 });
    }

    #[test]
    fn test_submit_does_not_mutate_prior_state() {
        let before = seeded_state();
        let _after = submit(&before, "1", "ana", AnswerSheet::new());
        assert!(before.submissions.is_empty());
    }

    #[test]
    fn test_replace_key_recalculates_everyone() {
        let state = submit(
            &seeded_state(),
            "1",
            "ana",
            sheet(&[(1, AnswerOption::E), (3, AnswerOption::E)]),
        );
        assert_eq!(state.submissions[0].total_score, 0);

        // New key makes both answers right
        let mut new_key = full_key();
        new_key.insert(1, AnswerOption::E);
        new_key.insert(3, AnswerOption::E);

        let next = apply(
            &state,
            Command::ReplaceAnswerKey { answer_key: new_key },
            &small_config(),
            now(),
        )
        .unwrap();

        assert_eq!(next.submissions[0].total_score, 25);
        assert_eq!(next.submissions[0].status, ApprovalStatus::Approved);
    }

    #[test]
    fn test_replace_key_must_be_complete() {
        let mut partial = full_key();
        partial.remove(&3);

        let err = apply(
            &seeded_state(),
            Command::ReplaceAnswerKey { answer_key: partial },
            &small_config(),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::IncompleteAnswerKey { missing: 3, total: 4 });
    }

    #[test]
    fn test_file_appeal_requires_submission() {
        let err = apply(
            &seeded_state(),
            Command::FileAppeal {
                question: 1,
                national_id: "999".to_string(),
                justification: "typo in the statement".to_string(),
            },
            &small_config(),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::UnknownCandidate("999".to_string()));
    }

    #[test]
    fn test_file_appeal_respects_deadline() {
        let mut state = submit(&seeded_state(), "1", "ana", AnswerSheet::new());
        state.appeal_deadline = Some(now() - chrono::Duration::hours(1));

        let err = apply(
            &state,
            Command::FileAppeal {
                question: 1,
                national_id: "1".to_string(),
                justification: "late".to_string(),
            },
            &small_config(),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::AppealDeadlinePassed);
    }

    #[test]
    fn test_file_appeal_assigns_sequential_id() {
        let state = submit(&seeded_state(), "1", "ana", AnswerSheet::new());
        let state = apply(
            &state,
            Command::FileAppeal {
                question: 2,
                national_id: "1".to_string(),
                justification: "no correct alternative".to_string(),
            },
            &small_config(),
            now(),
        )
        .unwrap();

        assert_eq!(state.appeals.len(), 1);
        let appeal = &state.appeals[0];
        assert_eq!(appeal.id, "appeal-1");
        assert_eq!(appeal.status, AppealStatus::Pending);
        assert_eq!(appeal.nickname, "ana");
    }

    #[test]
    fn test_approved_annulment_rescopes_in_the_same_transition() {
        // Appeal round-trip: wrong answer on question 3 gains exactly
        // module2_points when the question is annulled; an unanswered
        // question 3 gains nothing.
        let state = submit(&seeded_state(), "1", "ana", sheet(&[(3, AnswerOption::A)]));
        let state = submit(&state, "2", "bruna", AnswerSheet::new());
        let state = apply(
            &state,
            Command::FileAppeal {
                question: 3,
                national_id: "1".to_string(),
                justification: "both A and C are defensible".to_string(),
            },
            &small_config(),
            now(),
        )
        .unwrap();

        let wrong_before = state.submissions[0].total_score;
        let blank_before = state.submissions[1].total_score;

        let next = apply(
            &state,
            Command::ResolveAppeal {
                appeal_id: "appeal-1".to_string(),
                verdict: Verdict::Approve {
                    decision: Some(AppealDecision::AnnulQuestion),
                    new_answer: None,
                },
            },
            &small_config(),
            now(),
        )
        .unwrap();

        assert_eq!(next.answer_key[&3], AnswerOption::X);
        assert_eq!(next.appeals[0].status, AppealStatus::Approved);
        assert_eq!(next.submissions[0].total_score, wrong_before + 15);
        assert_eq!(next.submissions[1].total_score, blank_before);
    }

    #[test]
    fn test_rejected_appeal_changes_nothing_but_its_status() {
        let state = submit(&seeded_state(), "1", "ana", sheet(&[(3, AnswerOption::A)]));
        let state = apply(
            &state,
            Command::FileAppeal {
                question: 3,
                national_id: "1".to_string(),
                justification: "disagree".to_string(),
            },
            &small_config(),
            now(),
        )
        .unwrap();

        let next = apply(
            &state,
            Command::ResolveAppeal {
                appeal_id: "appeal-1".to_string(),
                verdict: Verdict::Reject,
            },
            &small_config(),
            now(),
        )
        .unwrap();

        assert_eq!(next.appeals[0].status, AppealStatus::Rejected);
        assert_eq!(next.answer_key, state.answer_key);
        assert_eq!(next.submissions, state.submissions);
    }

    #[test]
    fn test_resolved_appeals_are_terminal() {
        let state = submit(&seeded_state(), "1", "ana", AnswerSheet::new());
        let state = apply(
            &state,
            Command::FileAppeal {
                question: 1,
                national_id: "1".to_string(),
                justification: "x".to_string(),
            },
            &small_config(),
            now(),
        )
        .unwrap();
        let state = apply(
            &state,
            Command::ResolveAppeal {
                appeal_id: "appeal-1".to_string(),
                verdict: Verdict::Reject,
            },
            &small_config(),
            now(),
        )
        .unwrap();

        let err = apply(
            &state,
            Command::ResolveAppeal {
                appeal_id: "appeal-1".to_string(),
                verdict: Verdict::Reject,
            },
            &small_config(),
            now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionError::AppealAlreadyResolved("appeal-1".to_string())
        );
    }

    #[test]
    fn test_resolve_unknown_appeal() {
        let err = apply(
            &seeded_state(),
            Command::ResolveAppeal {
                appeal_id: "appeal-42".to_string(),
                verdict: Verdict::Reject,
            },
            &small_config(),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::UnknownAppeal("appeal-42".to_string()));
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let state = submit(&seeded_state(), "1", "ana", AnswerSheet::new());
        let next = apply(&state, Command::Reset, &small_config(), now()).unwrap();
        assert_eq!(next, ExamState::new());
    }

    #[test]
    fn test_set_deadline_and_title() {
        let state = seeded_state();
        let deadline = now() + chrono::Duration::days(7);

        let next = apply(
            &state,
            Command::SetAppealDeadline { deadline: Some(deadline) },
            &small_config(),
            now(),
        )
        .unwrap();
        assert_eq!(next.appeal_deadline, Some(deadline));

        let next = apply(
            &next,
            Command::SetFormTitle { title: "Annual Certification".to_string() },
            &small_config(),
            now(),
        )
        .unwrap();
        assert_eq!(next.form_title, "Annual Certification");
    }
}
