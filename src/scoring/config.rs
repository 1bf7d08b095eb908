use serde::{Deserialize, Serialize};

/// Exam configuration scalars.
///
/// Questions 1..=`module_boundary` form Module I, the rest form
/// Module II. Each module has its own per-question point value and its
/// own minimum correct count; a third minimum applies to the combined
/// correct count. All minimums are inclusive.
///
/// Example YAML:
/// ```yaml
/// total_questions: 80
/// module_boundary: 40
/// module1_points: 10
/// module2_points: 15
/// min_module1_correct: 12
/// min_module2_correct: 16
/// min_total_correct: 32
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ExamConfig {
    /// Total question count N; valid question numbers are 1..=N.
    pub total_questions: u32,

    /// Last question number belonging to Module I.
    pub module_boundary: u32,

    /// Points awarded per correct Module I answer.
    pub module1_points: u32,

    /// Points awarded per correct Module II answer.
    pub module2_points: u32,

    /// Minimum correct answers in Module I to pass.
    pub min_module1_correct: u32,

    /// Minimum correct answers in Module II to pass.
    pub min_module2_correct: u32,

    /// Minimum correct answers overall to pass.
    pub min_total_correct: u32,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            total_questions: 80,
            module_boundary: 40,
            module1_points: 10,
            module2_points: 15,
            min_module1_correct: 12,
            min_module2_correct: 16,
            min_total_correct: 32,
        }
    }
}

impl ExamConfig {
    /// Number of questions in Module II.
    pub fn module2_questions(&self) -> u32 {
        self.total_questions.saturating_sub(self.module_boundary)
    }

    /// Highest total score any candidate can reach.
    pub fn max_possible_score(&self) -> u32 {
        self.module_boundary * self.module1_points
            + self.module2_questions() * self.module2_points
    }

    /// True if the question number belongs to Module I.
    pub fn is_module1(&self, question: u32) -> bool {
        question <= self.module_boundary
    }
}
