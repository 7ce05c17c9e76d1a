use serde::Deserialize;

use super::{check_dimensions, MapError};
use crate::models::{Cell, Grid, Position};

#[derive(Debug, Deserialize)]
struct JsonMap {
    #[serde(alias = "cols")]
    width: usize,
    #[serde(alias = "rows")]
    height: usize,
    #[serde(default)]
    obstacles: Vec<Position>,
    tiles: Option<Vec<Tile>>,
}

#[derive(Debug, Deserialize)]
struct Tile {
    x: usize,
    y: usize,
    walkable: bool,
}

/// Parse the structured encoding.
///
/// With an `obstacles` list, cells not mentioned are free. With a `tiles` list,
/// cells not mentioned are blocked and only `walkable` tiles are free. A later
/// entry for the same cell overrides an earlier one.
pub(super) fn parse(content: &str) -> Result<Grid, MapError> {
    let map: JsonMap =
        serde_json::from_str(content).map_err(|e| MapError::InvalidJson(e.to_string()))?;
    let (width, height) = (map.width, map.height);
    check_dimensions(width, height)?;

    let fill = if map.tiles.is_some() {
        Cell::Obstacle
    } else {
        Cell::Free
    };
    let mut cells = vec![fill; width * height];
    let mut set = |x: usize, y: usize, cell: Cell| -> Result<(), MapError> {
        if x >= width || y >= height {
            return Err(MapError::CellOutOfRange {
                x,
                y,
                width,
                height,
            });
        }
        cells[y * width + x] = cell;
        Ok(())
    };

    for tile in map.tiles.iter().flatten() {
        let cell = if tile.walkable {
            Cell::Free
        } else {
            Cell::Obstacle
        };
        set(tile.x, tile.y, cell)?;
    }
    for pos in &map.obstacles {
        set(pos.x, pos.y, Cell::Obstacle)?;
    }

    Grid::from_cells(width, height, cells).ok_or(MapError::InvalidDimensions { width, height })
}
