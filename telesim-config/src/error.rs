//! Error types for configuration loading and validation

use std::path::PathBuf;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Unified configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File not found error.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Configuration validation error.
    #[error("Invalid configuration:\n{}", format_validation_errors(.0))]
    Validation(#[source] ValidationErrors),

    /// Figment parsing error.
    #[error("Configuration parsing error: {0}")]
    Parsing(#[from] figment::Error),
}

fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut output = String::new();
    write_errors(&mut output, "", errors);
    output
}

fn write_errors(output: &mut String, prefix: &str, errors: &ValidationErrors) {
    use std::fmt::Write;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(errors) => {
                let _ = writeln!(output, "Field '{}':", path);
                for error in errors {
                    let message = match &error.message {
                        Some(msg) => msg.to_string(),
                        None => error.code.to_string(),
                    };
                    let _ = writeln!(output, "  - {}", message);
                }
            }
            ValidationErrorsKind::Struct(nested) => write_errors(output, &path, nested),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    write_errors(output, &format!("{path}[{index}]"), nested);
                }
            }
        }
    }
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        ConfigError::Validation(errors)
    }
}
