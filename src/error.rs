use chrono::NaiveDate;

/// Application-level error carrying the process exit code.
///
/// Exit codes:
/// - 2: input, configuration or storage usage errors
/// - 3: data that cannot be reshaped (conversion, duplicates)
/// - 4: I/O or network failures while fetching the source
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Errors raised by the reshape stages.
#[derive(Debug, Clone, PartialEq)]
pub enum ReshapeError {
    /// A value could not be coerced to a number.
    Conversion {
        date: NaiveDate,
        indicator: String,
        value: String,
    },
    /// Two observations share a (date, indicator) key and the policy forbids it.
    DuplicateObservation { date: NaiveDate, indicator: String },
}

impl std::fmt::Display for ReshapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReshapeError::Conversion {
                date,
                indicator,
                value,
            } => write!(
                f,
                "Cannot convert value '{value}' to a number (date {date}, indicator '{indicator}')."
            ),
            ReshapeError::DuplicateObservation { date, indicator } => write!(
                f,
                "Duplicate observation for date {date}, indicator '{indicator}'."
            ),
        }
    }
}

impl std::error::Error for ReshapeError {}

impl From<ReshapeError> for AppError {
    fn from(err: ReshapeError) -> Self {
        AppError::new(3, err.to_string())
    }
}
