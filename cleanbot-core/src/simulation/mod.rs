//! The cleaning simulation.
//!
//! [`run`] walks the robot through a plan one unit step at a time. The first step
//! that would leave the grid or enter an obstacle ends the run; everything
//! cleaned up to that point is kept in the result.

use std::collections::HashSet;

use thiserror::Error;

use crate::models::{CleaningResult, CleaningStatus, Grid, Move, Position, PremiumReport};

/// The start position cannot host the robot.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error("start position {start} is outside the {width}x{height} grid")]
    OutOfBounds {
        start: Position,
        width: usize,
        height: usize,
    },

    #[error("start position {start} is an obstacle")]
    Obstacle { start: Position },
}

/// Run `moves` in order from `start`.
///
/// `premium` only adds a [`PremiumReport`] to the result.
pub fn run(
    grid: &Grid,
    start: Position,
    moves: &[Move],
    premium: bool,
) -> Result<CleaningResult, SimulationError> {
    if !grid.contains(start) {
        return Err(SimulationError::OutOfBounds {
            start,
            width: grid.width(),
            height: grid.height(),
        });
    }
    if !grid.is_free(start) {
        return Err(SimulationError::Obstacle { start });
    }

    let mut walk = Walk::new(start);

    for (index, mv) in moves.iter().enumerate() {
        for _ in 0..mv.steps {
            let next = mv.direction.step_from(walk.position).filter(|p| grid.contains(*p));
            let Some(next) = next else {
                tracing::debug!(move_index = index, position = %walk.position, "step leaves the grid");
                return Ok(walk.finish(CleaningStatus::AbortedOutOfBounds, premium));
            };
            if !grid.is_free(next) {
                tracing::debug!(move_index = index, obstacle = %next, "step hits an obstacle");
                return Ok(walk.finish(CleaningStatus::AbortedObstacle, premium));
            }
            walk.advance(next);
        }
        walk.moves_executed += 1;
    }

    Ok(walk.finish(CleaningStatus::Completed, premium))
}

/// Mutable state of a run in progress.
struct Walk {
    position: Position,
    cleaned: Vec<Position>,
    seen: HashSet<Position>,
    moves_executed: usize,
    steps_taken: u64,
    revisits: u64,
}

impl Walk {
    fn new(start: Position) -> Self {
        Self {
            position: start,
            cleaned: vec![start],
            seen: HashSet::from([start]),
            moves_executed: 0,
            steps_taken: 0,
            revisits: 0,
        }
    }

    fn advance(&mut self, next: Position) {
        self.position = next;
        self.steps_taken += 1;
        if self.seen.insert(next) {
            self.cleaned.push(next);
        } else {
            self.revisits += 1;
        }
    }

    fn finish(self, status: CleaningStatus, premium: bool) -> CleaningResult {
        CleaningResult {
            cleaned: self.cleaned,
            final_position: self.position,
            moves_executed: self.moves_executed,
            steps_taken: self.steps_taken,
            status,
            premium: premium.then_some(PremiumReport {
                revisits: self.revisits,
            }),
        }
    }
}
