use thiserror::Error;

/// A textual timestamp or identifier that does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("timestamp {input:?} must contain exactly one '.', found {found}")]
    Separator { input: String, found: usize },
    #[error("invalid timestamp seconds in {input:?}")]
    Seconds { input: String },
    #[error("invalid timestamp fraction in {input:?}")]
    Fraction { input: String },
    #[error("timestamp {input:?} is out of range")]
    OutOfRange { input: String },
    #[error("invalid identifier {input:?}")]
    Identifier { input: String },
}

/// Failure to turn one delimited record into a sample.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record has {found} fields, expected at least {expected}")]
    MissingFields { found: usize, expected: usize },
    #[error(transparent)]
    Timestamp(#[from] FormatError),
}
