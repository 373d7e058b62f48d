//! Parse error types for the filter DSL.

use std::fmt;

/// A failure to parse a filter string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The grammar could not start on the input. Carries the full
    /// request text.
    Global(String),
    /// A prefix parsed but input remained. Carries the unconsumed
    /// suffix verbatim.
    Partial(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Global(request) => write!(f, "Filter: unable to parse {request}"),
            ParseError::Partial(suffix) => {
                write!(f, "Filter: Unable to parse the whole string. Not parsed: >>{suffix}<<")
            }
        }
    }
}

impl std::error::Error for ParseError {}
