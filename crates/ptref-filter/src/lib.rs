//! Parser for the PTRef filter DSL.
//!
//! A filter string is a list of clauses joined by `AND` / `and`:
//!
//! ```text
//! line.code = "N12" and stop_area.name=Opera
//! stop_point.coord DWITHIN(2.35,48.85,1000)
//! network HAVING (line.uri=metro1)
//! AFTER(journey_pattern_point:rer_a:12)
//! vehicle_journey.has_headsign("Versailles")
//! ```
//!
//! [`parse`] turns such a string into a flat [`Filter`] list. The parser
//! is a scannerless recursive descent over a byte cursor: each clause
//! shape is tried in a fixed order with backtracking, which
//! keeps the grammar's context-dependent tokens (a parenthesized value is
//! one opaque literal in a binary clause but an argument list in a method
//! call) where they belong, in the clause rules.
//!
//! Parsing an empty or whitespace-only string yields an empty list.
//! A string the grammar cannot start on is a [`ParseError::Global`];
//! a string with trailing unparsed input is a [`ParseError::Partial`]
//! carrying the unconsumed suffix.

mod cursor;
mod parser;

pub mod ast;
pub mod error;

pub use ast::{print_filters, CompareOp, Filter};
pub use error::ParseError;
pub use parser::parse;
