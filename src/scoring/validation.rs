use super::config::ExamConfig;

/// Validate the exam configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_exam(config: &ExamConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.total_questions == 0 {
        errors.push("exam.total_questions: must be at least 1".to_string());
    }
    if config.module_boundary == 0 {
        errors.push("exam.module_boundary: must be at least 1".to_string());
    } else if config.module_boundary >= config.total_questions {
        errors.push(format!(
            "exam.module_boundary: {} leaves no questions for Module II (total is {})",
            config.module_boundary, config.total_questions
        ));
    }

    if config.min_module1_correct > config.module_boundary {
        errors.push(format!(
            "exam.min_module1_correct: {} exceeds the {} questions in Module I",
            config.min_module1_correct, config.module_boundary
        ));
    }
    if config.min_module2_correct > config.module2_questions() {
        errors.push(format!(
            "exam.min_module2_correct: {} exceeds the {} questions in Module II",
            config.min_module2_correct,
            config.module2_questions()
        ));
    }
    if config.min_total_correct > config.total_questions {
        errors.push(format!(
            "exam.min_total_correct: {} exceeds the {} questions in the exam",
            config.min_total_correct, config.total_questions
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
