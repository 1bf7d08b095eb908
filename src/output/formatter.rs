use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::ranking::RankedEntry;
use crate::scoring::ExamConfig;
use crate::state::types::{AnswerKey, Appeal, AppealStatus, ApprovalStatus, Submission};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a nickname to fit available width, accounting for Unicode
fn truncate_nickname(nickname: &str, max_width: usize) -> String {
    let chars: Vec<char> = nickname.chars().collect();
    if chars.len() <= max_width {
        nickname.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn format_status(status: ApprovalStatus, use_colors: bool) -> String {
    match (status, use_colors) {
        (ApprovalStatus::Approved, true) => "APPROVED".green().to_string(),
        (ApprovalStatus::Reproved, true) => "REPROVED".red().to_string(),
        (ApprovalStatus::Approved, false) => "APPROVED".to_string(),
        (ApprovalStatus::Reproved, false) => "REPROVED".to_string(),
    }
}

/// Format a ranking view as a table with columns:
/// position, score, Module I/II scores, status, nickname.
/// Position column: 4 chars (fits "999."), right-aligned.
pub fn format_ranking_table(entries: &[RankedEntry<'_>], use_colors: bool) -> String {
    if entries.is_empty() {
        return "No submissions in this view.".to_string();
    }

    let term_width = get_terminal_width();
    // position 4 + score 6 + two module columns 6 each + status 8,
    // plus separators; the nickname gets whatever is left
    let fixed = 4 + 2 + 6 + 2 + 6 + 2 + 6 + 2 + 8 + 2;
    let nickname_width = term_width.map(|w| w.saturating_sub(fixed).max(8));

    entries
        .iter()
        .map(|entry| {
            let sub = entry.submission;
            let nickname = match nickname_width {
                Some(width) => truncate_nickname(&sub.candidate.nickname, width),
                None => sub.candidate.nickname.clone(),
            };
            let position = format!("{:>3}.", entry.position);
            if use_colors {
                // Re-render with the status colored; padding is applied
                // before coloring so ANSI codes don't skew the column
                let status = format!("{:<8}", format_status(sub.status, false));
                let status = if sub.status.is_approved() {
                    status.green().to_string()
                } else {
                    status.red().to_string()
                };
                format!(
                    "{}  {:>6}  {:>6}  {:>6}  {}  {}",
                    position.bold(),
                    sub.total_score,
                    sub.module1_score,
                    sub.module2_score,
                    status,
                    nickname
                )
            } else {
                format!(
                    "{}  {:>6}  {:>6}  {:>6}  {:<8}  {}",
                    position,
                    sub.total_score,
                    sub.module1_score,
                    sub.module2_score,
                    format_status(sub.status, false),
                    nickname
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a single submission with detailed multi-line output
pub fn format_result_detail(
    submission: &Submission,
    config: &ExamConfig,
    position: Option<usize>,
    use_colors: bool,
) -> String {
    let mut lines = Vec::new();

    if use_colors {
        lines.push(format!("{}", submission.candidate.nickname.bold()));
    } else {
        lines.push(submission.candidate.nickname.clone());
    }
    lines.push(format!(
        "  Score: {} / {}",
        submission.total_score,
        config.max_possible_score()
    ));
    lines.push(format!(
        "  Module I: {} correct ({} pts)   Module II: {} correct ({} pts)",
        submission.module1_correct,
        submission.module1_score,
        submission.module2_correct,
        submission.module2_score
    ));
    lines.push(format!(
        "  Status: {}",
        format_status(submission.status, use_colors)
    ));
    for reason in &submission.reproval_reasons {
        lines.push(format!("    - {}", reason));
    }
    if let Some(position) = position {
        let view = if submission.status.is_approved() {
            "approved"
        } else {
            "reproved"
        };
        lines.push(format!("  Rank: #{} among {} candidates", position, view));
    }

    lines.join("\n")
}

/// Format the answer key as aligned rows of ten entries
pub fn format_answer_key(key: &AnswerKey, config: &ExamConfig) -> String {
    if key.is_empty() {
        return "Answer key not set.".to_string();
    }

    let mut lines = Vec::new();
    let mut row = Vec::new();
    for question in 1..=config.total_questions {
        let entry = key
            .get(&question)
            .map(|option| option.to_string())
            .unwrap_or_else(|| "-".to_string());
        row.push(format!("{:>3}={}", question, entry));
        if row.len() == 10 {
            lines.push(row.join("  "));
            row.clear();
        }
    }
    if !row.is_empty() {
        lines.push(row.join("  "));
    }
    lines.join("\n")
}

/// Format one appeal as a single list line
pub fn format_appeal_line(appeal: &Appeal, use_colors: bool) -> String {
    let status = match (appeal.status, use_colors) {
        (AppealStatus::Pending, true) => "PENDING".yellow().to_string(),
        (AppealStatus::Approved, true) => "APPROVED".green().to_string(),
        (AppealStatus::Rejected, true) => "REJECTED".red().to_string(),
        (status, false) => format!("{:?}", status).to_uppercase(),
    };
    format!(
        "{}  Q{:<3} {}  by {} - {}",
        appeal.id, appeal.question, status, appeal.nickname, appeal.justification
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::{rank, RankingView};
    use crate::state::types::{AnswerOption, AnswerSheet, Candidate};
    use chrono::{NaiveDate, Utc};

    fn sample_submission(nickname: &str, total: u32, approved: bool) -> Submission {
        let mut sub = Submission::unscored(
            Candidate {
                national_id: nickname.to_string(),
                nickname: nickname.to_string(),
                email: format!("{}@example.com", nickname),
                date_of_birth: NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
            },
            AnswerSheet::new(),
            Utc::now(),
        );
        sub.total_score = total;
        sub.status = if approved {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Reproved
        };
        sub
    }

    #[test]
    fn test_empty_ranking_message() {
        assert_eq!(format_ranking_table(&[], false), "No submissions in this view.");
    }

    #[test]
    fn test_ranking_table_positions_and_scores() {
        let subs = vec![
            sample_submission("ana", 500, true),
            sample_submission("bruna", 300, false),
        ];
        let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let entries = rank(&subs, RankingView::All, today);
        let table = format_ranking_table(&entries, false);

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  1."));
        assert!(lines[0].contains("500"));
        assert!(lines[0].contains("ana"));
        assert!(lines[1].starts_with("  2."));
        assert!(lines[1].contains("REPROVED"));
    }

    #[test]
    fn test_result_detail_lists_reasons() {
        let mut sub = sample_submission("ana", 0, false);
        sub.reproval_reasons = vec![
            "Did not reach the minimum of 12 correct answers in Module I.".to_string(),
        ];

        let detail = format_result_detail(&sub, &ExamConfig::default(), Some(3), false);
        assert!(detail.contains("Score: 0 / 1000"));
        assert!(detail.contains("Status: REPROVED"));
        assert!(detail.contains("Module I."));
        assert!(detail.contains("Rank: #3 among reproved candidates"));
    }

    #[test]
    fn test_answer_key_rows_of_ten() {
        let config = ExamConfig {
            total_questions: 12,
            module_boundary: 6,
            ..ExamConfig::default()
        };
        let mut key = AnswerKey::new();
        for question in 1..=11 {
            key.insert(question, AnswerOption::A);
        }
        key.insert(5, AnswerOption::X);

        let rendered = format_answer_key(&key, &config);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("5=X"));
        // Question 12 has no entry yet
        assert!(lines[1].contains("12=-"));
    }

    #[test]
    fn test_truncate_nickname_unicode() {
        assert_eq!(truncate_nickname("short", 10), "short");
        assert_eq!(truncate_nickname("averylongnickname", 10), "averylo...");
        assert_eq!(truncate_nickname("ação", 3), "açã");
    }
}
