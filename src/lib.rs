//! Dependency-aware schedule recalculation.
//!
//! A schedule is a flat store of tasks plus a hierarchy index grouping subtasks
//! under their phase. Edits go through [`ops::edit`], which shadows changed
//! fields in an [`model::EditOverlay`] and recalculates dates for the edited
//! task, its direct dependents, and its parent phase. The pure date math lives
//! in [`ops::recalc`]; the save boundary in [`io::snapshot`] merges the overlay
//! into flat records for a persistence layer to consume.

pub mod io;
pub mod model;
pub mod ops;
