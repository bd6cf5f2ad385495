//! Error types shared by matcher, coordinator and document backends.

/// A rule value that cannot be rendered into a valid selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("invalid {part} identifier: {value:?}")]
    InvalidIdentifier { part: &'static str, value: String },
    #[error("value breaks out of quoted string: {value:?}")]
    UnterminatedString { value: String },
}

/// Failure of a structural tree query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("host query failed: {0}")]
    Host(String),
}

impl QueryError {
    pub fn invalid_selector(selector: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failure to install a mutation subscription.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObserveError {
    #[error("observation target is not attached to the document")]
    Detached,
    #[error("host refused observation: {0}")]
    Host(String),
}
