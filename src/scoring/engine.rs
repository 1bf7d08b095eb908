use super::config::ExamConfig;
use crate::state::types::{AnswerKey, AnswerSheet, ApprovalStatus, Submission};

/// Score breakdown for one answer sheet against one answer key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreResult {
    pub module1_correct: u32,
    pub module2_correct: u32,
    pub module1_score: u32,
    pub module2_score: u32,
    pub total_score: u32,
    pub status: ApprovalStatus,
    pub reproval_reasons: Vec<String>,
}

impl ScoreResult {
    /// Overwrite a submission's derived fields with this result.
    pub fn apply_to(&self, submission: &mut Submission) {
        submission.module1_correct = self.module1_correct;
        submission.module2_correct = self.module2_correct;
        submission.module1_score = self.module1_score;
        submission.module2_score = self.module2_score;
        submission.total_score = self.total_score;
        submission.status = self.status;
        submission.reproval_reasons = self.reproval_reasons.clone();
    }
}

/// Score one answer sheet against the answer key.
///
/// Pure: never mutates its inputs, identical inputs always produce
/// identical output. A question counts as correct when the key entry
/// is the annulment sentinel or matches the submitted option.
/// Unanswered questions earn nothing, even annulled ones, and a
/// question missing from the key earns nothing either.
pub fn score(answers: &AnswerSheet, key: &AnswerKey, config: &ExamConfig) -> ScoreResult {
    let mut module1_correct = 0;
    let mut module2_correct = 0;

    for question in 1..=config.total_questions {
        let Some(submitted) = answers.get(&question) else {
            continue;
        };
        // A missing key entry can never be matched, so no credit.
        let Some(correct) = key.get(&question) else {
            continue;
        };

        if correct.is_annulled() || submitted == correct {
            if config.is_module1(question) {
                module1_correct += 1;
            } else {
                module2_correct += 1;
            }
        }
    }

    let module1_score = module1_correct * config.module1_points;
    let module2_score = module2_correct * config.module2_points;
    let total_correct = module1_correct + module2_correct;

    // All unmet thresholds are reported, in Module I / Module II /
    // combined order, not just the first.
    let mut reproval_reasons = Vec::new();
    if module1_correct < config.min_module1_correct {
        reproval_reasons.push(format!(
            "Did not reach the minimum of {} correct answers in Module I.",
            config.min_module1_correct
        ));
    }
    if module2_correct < config.min_module2_correct {
        reproval_reasons.push(format!(
            "Did not reach the minimum of {} correct answers in Module II.",
            config.min_module2_correct
        ));
    }
    if total_correct < config.min_total_correct {
        reproval_reasons.push(format!(
            "Did not reach the minimum of {} correct answers overall.",
            config.min_total_correct
        ));
    }

    let status = if reproval_reasons.is_empty() {
        ApprovalStatus::Approved
    } else {
        ApprovalStatus::Reproved
    };

    ScoreResult {
        module1_correct,
        module2_correct,
        module1_score,
        module2_score,
        total_score: module1_score + module2_score,
        status,
        reproval_reasons,
    }
}

/// Re-derive every submission's score, status and reasons under the
/// given key. Identity and order of the submission list are
/// preserved; only derived fields change. Returns a complete
/// replacement list, so the caller either commits all of it or keeps
/// the prior complete set.
pub fn recalculate_all(
    submissions: &[Submission],
    key: &AnswerKey,
    config: &ExamConfig,
) -> Vec<Submission> {
    submissions
        .iter()
        .map(|sub| {
            let mut updated = sub.clone();
            score(&sub.answers, key, config).apply_to(&mut updated);
            updated
        })
        .collect()
}
