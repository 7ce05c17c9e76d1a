//! Domain models for cleanbot.
//!
//! # Core Concepts
//!
//! - [`Grid`]: Immutable occupancy grid parsed from an uploaded map. Each cell is
//!   either [`Cell::Free`] or [`Cell::Obstacle`].
//! - [`Move`]: A [`Direction`] plus a positive step count. An ordered list of moves
//!   is the cleaning plan for one session.
//! - [`CleaningResult`]: Outcome of running a plan against a grid. Aborted runs are
//!   still results, carrying whatever was cleaned before the abort.
//! - [`SessionRecord`]: Append-only history entry written once per accepted
//!   cleaning request.

mod cleaning;
mod grid;
mod plan;
mod session;

pub use cleaning::*;
pub use grid::*;
pub use plan::*;
pub use session::*;
