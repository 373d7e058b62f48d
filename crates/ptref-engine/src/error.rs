//! Error taxonomy of the query engine.

use std::fmt;

use ptref_filter::ParseError;

/// Why a query could not produce a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The filter grammar could not start, or a post-filter is not
    /// defined for the requested kind.
    GlobalParse(String),
    /// A filter prefix parsed but the rest did not; also malformed
    /// DWITHIN triples and unknown method calls.
    PartialParse(String),
    /// A clause names an object outside the kind registry.
    UnknownObject(String),
    /// Semantic failure: empty dataset, empty result, invalid
    /// operator/kind pairing, invalid period bounds.
    PtRef(String),
}

impl QueryError {
    /// The human-readable message, without the variant.
    pub fn message(&self) -> &str {
        match self {
            QueryError::GlobalParse(m)
            | QueryError::PartialParse(m)
            | QueryError::UnknownObject(m)
            | QueryError::PtRef(m) => m,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for QueryError {}

impl From<ParseError> for QueryError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Global(_) => QueryError::GlobalParse(err.to_string()),
            ParseError::Partial(_) => QueryError::PartialParse(err.to_string()),
        }
    }
}
