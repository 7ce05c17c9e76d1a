use serde::{Deserialize, Serialize};

use super::grid::Position;

/// How a simulation run ended.
///
/// - `Completed`: Every move ran to the end
/// - `AbortedOutOfBounds`: A step would have left the grid
/// - `AbortedObstacle`: A step would have entered an obstacle cell
///
/// Aborts are terminal states, not errors. The partial result is still returned
/// and recorded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStatus {
    Completed,
    AbortedOutOfBounds,
    AbortedObstacle,
}

impl CleaningStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::AbortedOutOfBounds => "aborted_out_of_bounds",
            Self::AbortedObstacle => "aborted_obstacle",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "aborted_out_of_bounds" => Some(Self::AbortedOutOfBounds),
            "aborted_obstacle" => Some(Self::AbortedObstacle),
            _ => None,
        }
    }
}

/// Extra accounting attached to premium runs. It never affects what gets cleaned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PremiumReport {
    /// Steps that landed on a cell that was already clean.
    pub revisits: u64,
}

/// Outcome of running a plan against a grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CleaningResult {
    /// Distinct cleaned cells in the order they were first visited.
    pub cleaned: Vec<Position>,
    pub final_position: Position,
    /// Moves that ran all of their steps.
    pub moves_executed: usize,
    /// Unit steps actually taken, including steps of a move cut short by an abort.
    pub steps_taken: u64,
    pub status: CleaningStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium: Option<PremiumReport>,
}

impl CleaningResult {
    pub fn cells_cleaned(&self) -> usize {
        self.cleaned.len()
    }
}
