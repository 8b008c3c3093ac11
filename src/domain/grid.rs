/// Map store: fixed-size integer grids read from comma-separated text.
///
/// Two grids share this type:
///   - the tile grid (`TileId` per cell, what is drawn)
///   - the barrier grid (0 = walkable, anything else = blocked)
///
/// ## File format
///   One row per line (line index = y), comma-separated non-negative
///   integers (token index = x). Blank tokens are skipped, whitespace
///   around tokens is ignored, lines/tokens beyond the grid are dropped.
///
/// Storage is flat (`cells[y * width + x]`) and every access is
/// bounds-checked here, so callers never index raw memory.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::tile::TileId;

pub const GRID_W: usize = 15;
pub const GRID_H: usize = 15;

/// A cell coordinate. Always produced inside the grid by the movement rules.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct GridPos {
    pub x: usize,
    pub y: usize,
}

impl GridPos {
    pub const fn new(x: usize, y: usize) -> Self {
        GridPos { x, y }
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("could not read map {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}, column {column}: {token:?} is not a tile id")]
    InvalidToken {
        line: usize,
        column: usize,
        token: String,
    },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<TileId>,
}

impl Grid {
    /// A grid of the given size with every cell set to 0.
    pub fn new(width: usize, height: usize) -> Self {
        Grid { width, height, cells: vec![0; width * height] }
    }

    /// The fixed 15×15 game grid, all zeros.
    pub fn standard() -> Self {
        Grid::new(GRID_W, GRID_H)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Value at `pos`, or `None` outside the grid.
    #[inline]
    pub fn get(&self, pos: GridPos) -> Option<TileId> {
        if self.contains(pos) {
            Some(self.cells[pos.y * self.width + pos.x])
        } else {
            None
        }
    }

    /// Write `id` at `pos`. Out-of-range writes are dropped and logged.
    #[inline]
    pub fn set(&mut self, pos: GridPos, id: TileId) {
        if self.contains(pos) {
            self.cells[pos.y * self.width + pos.x] = id;
        } else {
            tracing::warn!("ignored write of {id} outside the grid at {pos}");
        }
    }

    /// Barrier-grid reading: a cell is walkable when it holds 0.
    /// Outside the grid nothing is walkable.
    #[inline]
    pub fn is_open(&self, pos: GridPos) -> bool {
        self.get(pos) == Some(0)
    }

    /// Iterate `(pos, value)` row by row.
    pub fn iter(&self) -> impl Iterator<Item = (GridPos, TileId)> + '_ {
        self.cells.iter().enumerate().map(move |(i, &id)| {
            (GridPos::new(i % self.width, i / self.width), id)
        })
    }

    /// Read a map file into this grid.
    ///
    /// On any error the grid is left exactly as it was, so callers
    /// pre-initialise it and carry on after logging.
    pub fn load(&mut self, path: &Path) -> Result<(), MapError> {
        let text = std::fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_into(&text)
    }

    /// Parse map text over the current contents. Cells the text does
    /// not mention keep their value.
    pub fn parse_into(&mut self, text: &str) -> Result<(), MapError> {
        let mut scratch = self.cells.clone();

        for (y, line) in text.lines().enumerate().take(self.height) {
            let mut x = 0;
            for (col, raw) in line.split(',').enumerate() {
                if x >= self.width {
                    break;
                }
                let token = raw.trim();
                if token.is_empty() {
                    continue;
                }
                let id = token.parse::<TileId>().map_err(|_| MapError::InvalidToken {
                    line: y + 1,
                    column: col + 1,
                    token: token.to_string(),
                })?;
                scratch[y * self.width + x] = id;
                x += 1;
            }
        }

        self.cells = scratch;
        Ok(())
    }
}

/// Comma-separated dump in the file format. Used for debug logging.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width) {
            let line: Vec<String> = row.iter().map(|id| id.to_string()).collect();
            writeln!(f, "{}", line.join(","))?;
        }
        Ok(())
    }
}
