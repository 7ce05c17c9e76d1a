use serde::{Deserialize, Serialize};

/// A cell coordinate. `x` grows east, `y` grows south.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Occupancy state of a single grid cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    Free,
    Obstacle,
}

/// A parsed map.
///
/// Grids are immutable once built. Cells are stored row-major, so the cell at
/// `(x, y)` lives at index `y * width + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a grid from row-major cells. Returns `None` if the cell count does
    /// not match the dimensions.
    pub fn from_cells(width: usize, height: usize, cells: Vec<Cell>) -> Option<Self> {
        if width.checked_mul(height)? != cells.len() {
            return None;
        }
        Some(Self {
            width,
            height,
            cells,
        })
    }

    /// A grid of the given size with no obstacles.
    pub fn open(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Free; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// The cell at `pos`, or `None` when `pos` is off the grid.
    pub fn cell(&self, pos: Position) -> Option<Cell> {
        if self.contains(pos) {
            Some(self.cells[pos.y * self.width + pos.x])
        } else {
            None
        }
    }

    pub fn is_free(&self, pos: Position) -> bool {
        self.cell(pos) == Some(Cell::Free)
    }

    pub fn obstacle_count(&self) -> usize {
        self.cells.iter().filter(|c| **c == Cell::Obstacle).count()
    }

    pub fn summary(&self) -> MapSummary {
        let obstacles = self.obstacle_count();
        MapSummary {
            width: self.width,
            height: self.height,
            obstacles,
            free_cells: self.cells.len() - obstacles,
        }
    }
}

/// Dimensions and cell counts of a grid, as reported by the API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MapSummary {
    pub width: usize,
    pub height: usize,
    pub obstacles: usize,
    pub free_cells: usize,
}
