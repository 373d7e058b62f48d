//! The PTRef query engine.
//!
//! [`make_query`] is the entry point: it parses a filter string, resolves
//! each clause to an index set of the clause's own kind, projects those
//! sets to the requested kind along a shortest path of the entity type
//! graph, intersects across clauses, subtracts forbidden URIs, applies
//! the ODT and validity-period post-filters, and sorts the result.
//!
//! The pipeline is split across:
//!
//! - `predicate`: compiles one binary clause into a predicate over a
//!   kind's records
//! - `resolve`: turns one clause into an index set (spatial, method,
//!   URI fast path, recursive sub-filters, general scan)
//! - `type_graph`: the static kind graph and the shortest-path walk
//! - `query`: the composition above, plus the post-filters
//!
//! Queries only borrow the dataset; any number may run in parallel
//! against the same snapshot.

mod predicate;
mod query;
mod resolve;
mod type_graph;

pub mod error;

pub use error::QueryError;
pub use query::make_query;
