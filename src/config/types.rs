use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid setting '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "columns[0]")
    pub field_path: String,
    /// What is wrong with the value
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Every invalid field, in field order
    #[error("Invalid settings in .translation-merge.json:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    /// The file exists but could not be read
    #[error("Cannot read .translation-merge.json: {0}")]
    IoError(#[from] std::io::Error),

    /// The file is not valid settings JSON
    #[error("Malformed .translation-merge.json: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// One numbered line per validation error
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MergeSettings {
    /// Respondent identifier column, matched by exact name in every file.
    pub id_column: String,

    /// Columns merged when none are given on the command line.
    pub columns: Vec<String>,

    /// Appended to the main file's stem to name the default output file.
    pub output_suffix: String,
}

impl MergeSettings {
    /// # Errors
    /// - Required field is empty
    /// - Column name is blank
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.id_column.trim().is_empty() {
            errors.push(ValidationError::new(
                "idColumn",
                "The identifier column cannot be empty. Example: \"Respondent.Serial\"",
            ));
        }

        for (index, column) in self.columns.iter().enumerate() {
            if column.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("columns[{index}]"),
                    "Column names cannot be empty",
                ));
            }
        }

        if self.output_suffix.is_empty() {
            errors.push(ValidationError::new(
                "outputSuffix",
                "The suffix cannot be empty, otherwise the main file would be overwritten. Example: \"_Merged\"",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            id_column: "Respondent.Serial".to_string(),
            columns: Vec::new(),
            output_suffix: "_Merged".to_string(),
        }
    }
}
