use chrono::{Datelike, NaiveDate};
use std::cmp::Ordering;

use crate::state::types::Submission;

/// Age threshold for the senior preference tie-break.
pub const SENIOR_AGE: i32 = 60;

/// Which subset of submissions a ranking is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingView {
    All,
    Approved,
    Reproved,
}

/// One row of a ranking: the 1-based position, the submission, and the
/// candidate's age on the reference date.
#[derive(Debug, Clone)]
pub struct RankedEntry<'a> {
    pub position: usize,
    pub submission: &'a Submission,
    pub age: i32,
}

/// Full elapsed years between birth date and the reference date.
/// Decremented by one when the birthday has not yet occurred this year.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

/// Composite ranking comparator, best candidate first:
/// 1. higher total score
/// 2. senior (age >= 60) over non-senior
/// 3. among two seniors, older first
/// 4. higher Module II score
/// 5. higher Module I score
/// 6. older first
///
/// Residual ties keep their incoming relative order; `rank` uses a
/// stable sort, so the result is consistent across runs.
pub fn compare(a: &Submission, a_age: i32, b: &Submission, b_age: i32) -> Ordering {
    let by_score = b.total_score.cmp(&a.total_score);
    if by_score != Ordering::Equal {
        return by_score;
    }

    let a_senior = a_age >= SENIOR_AGE;
    let b_senior = b_age >= SENIOR_AGE;
    match (a_senior, b_senior) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (true, true) => {
            let by_age = b_age.cmp(&a_age);
            if by_age != Ordering::Equal {
                return by_age;
            }
        }
        (false, false) => {}
    }

    b.module2_score
        .cmp(&a.module2_score)
        .then(b.module1_score.cmp(&a.module1_score))
        .then(b_age.cmp(&a_age))
}

/// Rank the submissions matching the view, 1-based positions.
///
/// Ranks are always recomputed from the current submissions, never
/// stored, so they can't go stale after a recalculation. Each view
/// ranks only its own subset: a reproved candidate's position is
/// relative to other reproved candidates.
pub fn rank<'a>(
    submissions: &'a [Submission],
    view: RankingView,
    today: NaiveDate,
) -> Vec<RankedEntry<'a>> {
    let mut entries: Vec<RankedEntry<'a>> = submissions
        .iter()
        .filter(|sub| match view {
            RankingView::All => true,
            RankingView::Approved => sub.status.is_approved(),
            RankingView::Reproved => !sub.status.is_approved(),
        })
        .map(|sub| RankedEntry {
            position: 0,
            submission: sub,
            age: age_on(sub.candidate.date_of_birth, today),
        })
        .collect();

    entries.sort_by(|a, b| compare(a.submission, a.age, b.submission, b.age));

    for (index, entry) in entries.iter_mut().enumerate() {
        entry.position = index + 1;
    }
    entries
}

/// Position of one candidate within a view, if present in it.
pub fn position_of(
    submissions: &[Submission],
    view: RankingView,
    today: NaiveDate,
    national_id: &str,
) -> Option<usize> {
    rank(submissions, view, today)
        .iter()
        .find(|entry| entry.submission.candidate.national_id == national_id)
        .map(|entry| entry.position)
}
