use thiserror::Error;

/// Errors that can occur when parsing filter expressions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterParseError {
    #[error("No valid operator in clause '{clause}'")]
    NoOperator { clause: String },

    #[error("Invalid in/not-in expression: '{clause}'")]
    InvalidList { clause: String },

    #[error("Unparseable clause '{clause}': {reason}")]
    InvalidClause { clause: String, reason: String },

    #[error("Cannot mix AND and OR in one filter (at '{clause}')")]
    MixedLogic { clause: String },
}

impl FilterParseError {
    /// The clause text the error was raised for
    pub fn clause(&self) -> &str {
        match self {
            Self::NoOperator { clause }
            | Self::InvalidList { clause }
            | Self::InvalidClause { clause, .. }
            | Self::MixedLogic { clause } => clause,
        }
    }
}
