use thiserror::Error;

pub type McResult<T> = Result<T, McError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum McError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Row arity mismatch in {table}: expected {expected} fields, got {actual}")]
    Arity {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot parse {what} from '{text}'")]
    Parse { what: &'static str, text: String },

    #[error("Unknown enum {key} for dimension or type '{dim}'")]
    UnknownEnum { dim: String, key: String },

    #[error("Invariant violated: {what}")]
    Invariant { what: String },
}

impl McError {
    pub fn invariant(what: impl Into<String>) -> Self {
        McError::Invariant { what: what.into() }
    }

    pub fn parse(what: &'static str, text: &str) -> Self {
        McError::Parse {
            what,
            text: text.to_string(),
        }
    }
}
