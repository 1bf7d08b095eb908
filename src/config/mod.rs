use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::scoring::ExamConfig;

/// Get the config directory path (~/.config/examrank/)
pub fn get_config_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Could not determine home directory");
    home.join(".config").join("examrank")
}

/// Get the default config file path (~/.config/examrank/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Ensure the config directory exists
pub fn ensure_config_dir() -> Result<()> {
    let config_dir = get_config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory at {}", config_dir.display()))?;
    }
    Ok(())
}

/// Load the exam configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path
///   (~/.config/examrank/config.yaml)
///
/// A missing file is not an error: the exam scalars are constants with
/// built-in defaults, and the file only exists to override them.
pub fn load_config(path: Option<PathBuf>) -> Result<ExamConfig> {
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        return Ok(ExamConfig::default());
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: ExamConfig = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let temp_path = env::temp_dir().join("examrank_test_no_config.yaml");
        let _ = fs::remove_file(&temp_path);

        let config = load_config(Some(temp_path)).unwrap();
        assert_eq!(config, ExamConfig::default());
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp_path = env::temp_dir().join("examrank_test_config.yaml");
        fs::write(&temp_path, "total_questions: 30\nmodule_boundary: 15\n").unwrap();

        let config = load_config(Some(temp_path.clone())).unwrap();
        assert_eq!(config.total_questions, 30);
        assert_eq!(config.module_boundary, 15);

        let _ = fs::remove_file(&temp_path);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let temp_path = env::temp_dir().join("examrank_test_bad_config.yaml");
        fs::write(&temp_path, "total_questions: [not a number").unwrap();

        assert!(load_config(Some(temp_path.clone())).is_err());

        let _ = fs::remove_file(&temp_path);
    }
}
