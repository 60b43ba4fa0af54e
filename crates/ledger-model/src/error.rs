use thiserror::Error;

/// Rejections raised at the model boundary, before a value enters a table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid table key: {0:?}")]
    InvalidTableKey(String),
    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),
    #[error("contribution must not be negative: {raw}")]
    NegativeContribution { raw: String },
    #[error("contribution is not a whole number: {raw:?}")]
    NotANumber { raw: String },
    #[error("team slot {slot} is out of range (roster has {len} teams)")]
    SlotOutOfRange { slot: usize, len: usize },
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("team roster must not be empty")]
    EmptyRoster,
}

pub type Result<T> = std::result::Result<T, ModelError>;
