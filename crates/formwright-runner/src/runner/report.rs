use crate::config::SchemaError;
use formwright_page::PageError;
use std::path::PathBuf;

/// Why a fill pass stopped. Every variant is data in a report; none is
/// swallowed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FillError {
    #[error("no answer for required field '{0}'")]
    MissingRequiredAnswer(String),

    #[error("field '{field}': expected value '{expected}', page shows '{actual}'")]
    FieldWriteVerificationFailed {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("field '{field}': no option exactly matching '{value}'")]
    NoExactOptionMatch { field: String, value: String },

    #[error("field '{field}': no option containing '{value}'")]
    NoMatchingOption { field: String, value: String },

    #[error("field '{field}': option '{value}' not found")]
    OptionNotFound { field: String, value: String },

    #[error("field '{field}': file not found: {}", .path.display())]
    ResumeFileNotFound { field: String, path: PathBuf },

    #[error("field '{field}': upload not confirmed within {timeout_ms}ms")]
    UploadTimedOut { field: String, timeout_ms: u64 },

    #[error("step '{step}': next step not visible within {timeout_ms}ms")]
    TransitionTimedOut { step: String, timeout_ms: u64 },

    #[error("field '{field}': locator '{locator}' matched {count} elements")]
    AmbiguousLocator {
        field: String,
        locator: String,
        count: usize,
    },

    #[error("invalid schema: {}", crate::config::validate::join(.0))]
    SchemaValidationError(Vec<SchemaError>),

    #[error("field '{field}': no element found for {locators}")]
    ElementNotFound { field: String, locators: String },

    #[error("field '{field}': answer must be {expected}")]
    WrongAnswerType {
        field: String,
        expected: &'static str,
    },

    #[error("field '{field}': {source}")]
    Page {
        field: String,
        #[source]
        source: PageError,
    },
}

impl FillError {
    /// The field (or step) the error is about, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredAnswer(f) => Some(f),
            Self::FieldWriteVerificationFailed { field, .. }
            | Self::NoExactOptionMatch { field, .. }
            | Self::NoMatchingOption { field, .. }
            | Self::OptionNotFound { field, .. }
            | Self::ResumeFileNotFound { field, .. }
            | Self::UploadTimedOut { field, .. }
            | Self::AmbiguousLocator { field, .. }
            | Self::ElementNotFound { field, .. }
            | Self::WrongAnswerType { field, .. }
            | Self::Page { field, .. } => Some(field),
            Self::TransitionTimedOut { step, .. } => Some(step),
            Self::SchemaValidationError(_) => None,
        }
    }
}

/// What happened to one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    Filled,
    /// Optional field with no answer.
    Skipped,
    Failed(FillError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldReport {
    /// Field name; entry fields read `group[i].field`.
    pub name: String,
    pub outcome: FieldOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FillStatus {
    Success,
    Failed(FillError),
}

/// Result of one fill pass over a schema.
#[derive(Debug, Clone)]
pub struct FillReport {
    pub schema: String,
    /// Outcomes in fill order. Fields after a failure are absent.
    pub fields: Vec<FieldReport>,
    pub status: FillStatus,
    pub duration_ms: u64,
}

impl FillReport {
    pub fn is_success(&self) -> bool {
        self.status == FillStatus::Success
    }

    pub fn error(&self) -> Option<&FillError> {
        match &self.status {
            FillStatus::Success => None,
            FillStatus::Failed(e) => Some(e),
        }
    }

    /// Outcome of the named field, if it was reached.
    pub fn outcome(&self, name: &str) -> Option<&FieldOutcome> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.outcome)
    }

    /// Names of fields that were filled, in order.
    pub fn filled(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.outcome == FieldOutcome::Filled)
            .map(|f| f.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_field() {
        let err = FillError::NoExactOptionMatch {
            field: "country".into(),
            value: "Atlantis".into(),
        };
        assert_eq!(err.to_string(), "field 'country': no option exactly matching 'Atlantis'");
        assert_eq!(err.field(), Some("country"));

        let err = FillError::SchemaValidationError(vec![SchemaError::new("a", "duplicate")]);
        assert_eq!(err.to_string(), "invalid schema: a: duplicate");
        assert_eq!(err.field(), None);
    }

    #[test]
    fn report_accessors() {
        let report = FillReport {
            schema: "Apply".into(),
            fields: vec![
                FieldReport {
                    name: "first_name".into(),
                    outcome: FieldOutcome::Filled,
                },
                FieldReport {
                    name: "middle_name".into(),
                    outcome: FieldOutcome::Skipped,
                },
                FieldReport {
                    name: "country".into(),
                    outcome: FieldOutcome::Failed(FillError::MissingRequiredAnswer(
                        "country".into(),
                    )),
                },
            ],
            status: FillStatus::Failed(FillError::MissingRequiredAnswer("country".into())),
            duration_ms: 3,
        };
        assert!(!report.is_success());
        assert_eq!(report.filled(), vec!["first_name"]);
        assert_eq!(report.outcome("middle_name"), Some(&FieldOutcome::Skipped));
        assert_eq!(report.outcome("resume"), None);
        assert_eq!(
            report.error(),
            Some(&FillError::MissingRequiredAnswer("country".into()))
        );
    }
}
