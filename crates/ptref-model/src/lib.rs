//! Shared data model for the PTRef query layer.
//!
//! This crate defines the vocabulary every other PTRef crate speaks:
//!
//! - [`ObjectKind`]: the closed set of referential entity kinds
//! - [`Indexes`]: ordered dense index sets, the currency of the engine
//! - [`entities`]: the transit records themselves (networks, lines, ...)
//! - [`period`]: time periods, the production period, validity patterns
//! - [`disruption`]: impacts, severities and the generation-arena store
//! - [`Dataset`]: the immutable snapshot queries run against, plus its
//!   builder
//!
//! The dataset is a read-only snapshot: queries borrow it shared and
//! never mutate it. All cross-entity references are dense indices into
//! the per-kind collections.

pub mod dataset;
pub mod disruption;
pub mod entities;
pub mod geo;
pub mod indexes;
pub mod object_kind;
pub mod period;

pub use dataset::{Dataset, DatasetBuilder};
pub use geo::Coord;
pub use indexes::{Idx, Indexes};
pub use object_kind::ObjectKind;
