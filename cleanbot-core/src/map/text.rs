use super::{check_dimensions, MapError};
use crate::models::{Cell, Grid};

const FREE: char = 'o';
const OBSTACLE: char = 'x';

/// Parse the line-per-row encoding. Whitespace-only lines around the grid are
/// ignored; blank lines inside it fail the width check.
pub(super) fn parse(content: &str) -> Result<Grid, MapError> {
    let lines: Vec<&str> = content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    let first = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .ok_or(MapError::Empty)?;
    let last = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .ok_or(MapError::Empty)?;
    let rows = &lines[first..=last];

    let width = rows.first().map_or(0, |row| row.chars().count());
    let height = rows.len();
    check_dimensions(width, height)?;

    let mut cells = Vec::with_capacity(width * height);
    for (y, row) in rows.iter().enumerate() {
        let actual = row.chars().count();
        if actual != width {
            return Err(MapError::InconsistentRow {
                line: first + y + 1,
                expected: width,
                actual,
            });
        }

        for (x, marker) in row.chars().enumerate() {
            let cell = match marker {
                FREE => Cell::Free,
                OBSTACLE => Cell::Obstacle,
                _ => {
                    return Err(MapError::UnknownMarker {
                        marker,
                        line: first + y + 1,
                        column: x + 1,
                    })
                }
            };
            cells.push(cell);
        }
    }

    Grid::from_cells(width, height, cells).ok_or(MapError::InvalidDimensions { width, height })
}
