//! Ant-style glob compilation and include/exclude path selection.
//!
//! [`AntGlob`] compiles one glob into a matcher. [`PathSet`] holds ordered
//! include and exclude globs and produces [`PathPredicate`]s that select
//! paths from a candidate list, typically before they are handed to
//! packaging.

mod pattern;
mod set;

pub use pattern::{AntGlob, MatchMode};
pub use set::{GlobSource, PathPredicate, PathSet};
