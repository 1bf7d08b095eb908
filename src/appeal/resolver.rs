use crate::state::types::{AnswerKey, AnswerOption, Appeal, AppealDecision, AppealStatus};

/// Administrator verdict on a pending appeal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approve {
        decision: Option<AppealDecision>,
        new_answer: Option<AnswerOption>,
    },
    Reject,
}

/// Outcome of applying a verdict: the updated appeal, the (possibly
/// unchanged) answer key, and whether the key actually changed, which
/// is what decides if a full recalculation is owed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub appeal: Appeal,
    pub answer_key: AnswerKey,
    pub recalculation_needed: bool,
}

/// Apply an administrator verdict to a pending appeal.
///
/// Approving with "annul question" turns the key entry into the
/// annulment sentinel; approving with "change answer" plus a
/// replacement option swaps the entry. Rejection, or approval without
/// an actionable decision (no decision kind, or "change answer" with
/// no replacement), updates only the appeal's own status and requires
/// no recalculation.
pub fn resolve(appeal: &Appeal, verdict: Verdict, key: &AnswerKey) -> Resolution {
    let mut updated = appeal.clone();
    let mut new_key = key.clone();
    let mut recalculation_needed = false;

    match verdict {
        Verdict::Reject => {
            updated.status = AppealStatus::Rejected;
            updated.decision = None;
            updated.new_answer = None;
        }
        Verdict::Approve { decision, new_answer } => {
            updated.status = AppealStatus::Approved;
            updated.decision = decision;
            updated.new_answer = new_answer;

            match decision {
                Some(AppealDecision::AnnulQuestion) => {
                    new_key.insert(appeal.question, AnswerOption::X);
                    recalculation_needed = true;
                }
                Some(AppealDecision::ChangeAnswer) => {
                    if let Some(option) = new_answer {
                        new_key.insert(appeal.question, option);
                        recalculation_needed = true;
                    }
                }
                None => {}
            }
        }
    }

    Resolution {
        appeal: updated,
        answer_key: new_key,
        recalculation_needed,
    }
}
