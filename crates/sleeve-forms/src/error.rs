// File: sleeve-forms/src/error.rs
// Purpose: Error type shared by rule compilation, binding and change subscription

use thiserror::Error;

/// Errors raised while configuring or binding a form
#[derive(Debug, Error)]
pub enum FormError {
    /// The form was handed something it cannot bind to
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A rule string the regex engine rejects
    #[error("invalid rule pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown rule preset `{0}`")]
    UnknownPreset(String),

    #[error("no field named `{0}` is registered")]
    UnknownField(String),

    /// The element refused a change listener
    #[error("cannot listen for changes on field `{field}`: {reason}")]
    Subscription { field: String, reason: String },
}

impl FormError {
    /// True for every error caused by bad setup rather than a runtime failure.
    /// Pattern and preset errors count as configuration errors.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FormError::Configuration(_)
                | FormError::InvalidPattern { .. }
                | FormError::UnknownPreset(_)
        )
    }
}

pub type FormResult<T> = Result<T, FormError>;
