use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::grid::Position;

/// Compass direction of a move. North is towards row 0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "north" => Some(Self::North),
            "south" => Some(Self::South),
            "east" => Some(Self::East),
            "west" => Some(Self::West),
            _ => None,
        }
    }

    /// Unit vector `(dx, dy)` for one step.
    pub fn delta(&self) -> (isize, isize) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
        }
    }

    /// The neighbouring position one step away, or `None` if that would go
    /// below zero on either axis.
    pub fn step_from(&self, pos: Position) -> Option<Position> {
        let (dx, dy) = self.delta();
        Some(Position {
            x: pos.x.checked_add_signed(dx)?,
            y: pos.y.checked_add_signed(dy)?,
        })
    }
}

/// One action of a cleaning plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Move {
    pub direction: Direction,
    pub steps: u32,
}

impl Move {
    pub fn new(direction: Direction, steps: u32) -> Self {
        Self { direction, steps }
    }
}

/// The input side of a session, as kept in history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanSummary {
    pub start: Position,
    pub actions_count: usize,
    /// Sum of `steps` over every move in the plan.
    pub requested_steps: u64,
    pub premium: bool,
}

impl PlanSummary {
    pub fn new(start: Position, moves: &[Move], premium: bool) -> Self {
        Self {
            start,
            actions_count: moves.len(),
            requested_steps: total_steps(moves),
            premium,
        }
    }
}

/// Total unit steps requested by a plan.
pub fn total_steps(moves: &[Move]) -> u64 {
    moves.iter().map(|m| u64::from(m.steps)).sum()
}

/// A cleaning request: where the robot starts and what it should do.
///
/// Start coordinates are signed so that a negative start is reported as an
/// invalid start rather than a malformed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CleanRequest {
    pub start_x: i64,
    pub start_y: i64,
    pub actions: Vec<Move>,
    #[serde(default)]
    pub premium: bool,
}

/// Why a cleaning plan was refused before running it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("action {index} has zero steps; steps must be positive")]
    ZeroSteps { index: usize },

    #[error("plan requests {total} steps, the limit is {limit}")]
    TooManySteps { total: u64, limit: u64 },
}

impl CleanRequest {
    /// The start as a grid position, or `None` if either coordinate is negative.
    pub fn start(&self) -> Option<Position> {
        Some(Position {
            x: usize::try_from(self.start_x).ok()?,
            y: usize::try_from(self.start_y).ok()?,
        })
    }

    /// Check step counts against the positivity rule and `max_total_steps`.
    pub fn validate(&self, max_total_steps: u64) -> Result<(), PlanError> {
        if let Some(index) = self.actions.iter().position(|m| m.steps == 0) {
            return Err(PlanError::ZeroSteps { index });
        }
        let total = total_steps(&self.actions);
        if total > max_total_steps {
            return Err(PlanError::TooManySteps {
                total,
                limit: max_total_steps,
            });
        }
        Ok(())
    }
}
