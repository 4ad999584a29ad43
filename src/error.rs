use std::{io, path::PathBuf};

use thiserror::Error;

use crate::parser::Rule;

/// The constraint text could not be turned into a condition.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid SQL condition: {0}")]
    Syntax(#[source] Box<pest::error::Error<Rule>>),

    #[error("unsupported SQL construct: {0}")]
    Unsupported(String),

    #[error("invalid integer literal {0:?}")]
    InvalidNumber(String),

    #[error("unexpected parse tree: {0}")]
    Malformed(String),
}

impl ParseError {
    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        Self::Unsupported(what.into())
    }

    pub(crate) fn malformed(what: impl Into<String>) -> Self {
        Self::Malformed(what.into())
    }
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        Self::Syntax(Box::new(err))
    }
}

/// A valid condition whose shape cannot be lowered to SMT-LIB.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("only comparisons can be encoded, found {0}")]
    UnsupportedShape(&'static str),

    #[error("cannot encode {0} as an Int term")]
    UnsupportedOperand(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("failed to write SMT-LIB script to {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
