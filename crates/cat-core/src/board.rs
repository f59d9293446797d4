//! Board geometry: mapping abstract figure positions to grid cells.
//!
//! The board is a 15x15 grid. It contains:
//! - A circular track, starting at green's launch cell
//! - One 2x2 home area per color
//! - One finish lane per color, entered from the field before its launch cell
//!
//! Every mapping here is pure. Positions outside the three domains produce
//! `GeometryError::Unrenderable` instead of a guessed cell.

use crate::player::PlayerColor;
use crate::rules::{GameRules, RulesError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Side length of the square board grid
pub const GRID_SIZE: u8 = 15;

/// A cell of the board grid (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: u8,
    pub col: u8,
}

impl Cell {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// CSS `grid-area` shorthand (1-based) used by the board renderer
    pub fn grid_area(&self) -> String {
        format!("{} / {}", self.row + 1, self.col + 1)
    }
}

/// Domain-classified figure position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardPosition {
    /// Not yet started
    Home,
    /// Absolute index on the shared track
    Path(u16),
    /// Index into the owner's finish lane
    Finish(u8),
}

impl BoardPosition {
    /// Classify a raw wire position.
    ///
    /// Returns `None` for values outside all three domains.
    pub fn from_raw(raw: i32, rules: &GameRules) -> Option<Self> {
        if raw < 0 {
            return Some(BoardPosition::Home);
        }
        if raw < i32::from(rules.track_length) {
            return u16::try_from(raw).ok().map(BoardPosition::Path);
        }
        if raw >= GameRules::FINISH_BASE {
            let index = raw % GameRules::FINISH_BASE;
            if index < i32::from(rules.finish_lane_length) {
                return u8::try_from(index).ok().map(BoardPosition::Finish);
            }
        }
        None
    }

    /// Encode back to the wire representation (home is `-1`)
    pub fn to_raw(&self) -> i32 {
        match self {
            BoardPosition::Home => -1,
            BoardPosition::Path(index) => i32::from(*index),
            BoardPosition::Finish(index) => GameRules::FINISH_BASE + i32::from(*index),
        }
    }
}

/// What a grid cell is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellRole {
    Home { color: PlayerColor, slot: u8 },
    Path { index: u16 },
    Finish { color: PlayerColor, index: u8 },
}

/// Static tile classification for drawing the empty board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Empty,
    Path,
    /// A color's start field on the track
    Launch(PlayerColor),
    HomeArea(PlayerColor),
    FinishLane(PlayerColor),
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GeometryError {
    #[error("Position {position} cannot be drawn")]
    Unrenderable { position: i32 },

    #[error("Track length {requested} exceeds the {available} drawn fields")]
    TrackTooLong { requested: u16, available: usize },

    #[error("Invalid rules: {0}")]
    InvalidRules(#[from] RulesError),
}

/// Board layout, row by row. `#` track, `G/P/O/B` colored tiles, `.` empty.
///
/// The browser board stores the same grid column by column; this table is
/// its transpose so `LAYOUT[row][col]` lines up with `Cell::grid_area`.
const LAYOUT: [&str; GRID_SIZE as usize] = [
    ".....G####.....",
    ".GG..#G..#..PP.",
    ".GG..#G..#..PP.",
    ".....#G..#.....",
    ".....#G..#.....",
    "######...#####P",
    "#.........PPPP#",
    "#.............#",
    "#BBBB.........#",
    "B#####...######",
    ".....#..O#.....",
    ".....#..O#.....",
    ".BB..#..O#..OO.",
    ".BB..#..O#..OO.",
    ".....####O.....",
];

/// Track cells in travel order. Index 0 is green's launch cell; pink,
/// orange and blue launch every 14 fields after it.
const TRACK: [Cell; 56] = [
    Cell::new(0, 5), Cell::new(0, 6), Cell::new(0, 7), Cell::new(0, 8),
    Cell::new(0, 9), Cell::new(1, 9), Cell::new(2, 9), Cell::new(3, 9),
    Cell::new(4, 9), Cell::new(5, 9), Cell::new(5, 10), Cell::new(5, 11),
    Cell::new(5, 12), Cell::new(5, 13), Cell::new(5, 14), Cell::new(6, 14),
    Cell::new(7, 14), Cell::new(8, 14), Cell::new(9, 14), Cell::new(9, 13),
    Cell::new(9, 12), Cell::new(9, 11), Cell::new(9, 10), Cell::new(9, 9),
    Cell::new(10, 9), Cell::new(11, 9), Cell::new(12, 9), Cell::new(13, 9),
    Cell::new(14, 9), Cell::new(14, 8), Cell::new(14, 7), Cell::new(14, 6),
    Cell::new(14, 5), Cell::new(13, 5), Cell::new(12, 5), Cell::new(11, 5),
    Cell::new(10, 5), Cell::new(9, 5), Cell::new(9, 4), Cell::new(9, 3),
    Cell::new(9, 2), Cell::new(9, 1), Cell::new(9, 0), Cell::new(8, 0),
    Cell::new(7, 0), Cell::new(6, 0), Cell::new(5, 0), Cell::new(5, 1),
    Cell::new(5, 2), Cell::new(5, 3), Cell::new(5, 4), Cell::new(5, 5),
    Cell::new(4, 5), Cell::new(3, 5), Cell::new(2, 5), Cell::new(1, 5),
];

/// Home slots per color, in figure-list order
const HOMES: [[Cell; 4]; 4] = [
    [Cell::new(1, 1), Cell::new(1, 2), Cell::new(2, 2), Cell::new(2, 1)],
    [Cell::new(1, 13), Cell::new(2, 13), Cell::new(1, 12), Cell::new(2, 12)],
    [Cell::new(12, 12), Cell::new(12, 13), Cell::new(13, 13), Cell::new(13, 12)],
    [Cell::new(13, 1), Cell::new(13, 2), Cell::new(12, 1), Cell::new(12, 2)],
];

/// Finish lanes per color, starting next to the lane entrance
const FINISH_LANES: [[Cell; 4]; 4] = [
    [Cell::new(1, 6), Cell::new(2, 6), Cell::new(3, 6), Cell::new(4, 6)],
    [Cell::new(6, 13), Cell::new(6, 12), Cell::new(6, 11), Cell::new(6, 10)],
    [Cell::new(13, 8), Cell::new(12, 8), Cell::new(11, 8), Cell::new(10, 8)],
    [Cell::new(8, 1), Cell::new(8, 2), Cell::new(8, 3), Cell::new(8, 4)],
];

/// Board geometry for a given rules configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardGeometry {
    rules: GameRules,
}

impl BoardGeometry {
    /// Create the geometry, checking that the rules are consistent and fit
    /// the drawn board
    pub fn new(rules: GameRules) -> Result<Self, GeometryError> {
        rules.validate()?;
        if usize::from(rules.track_length) > TRACK.len() {
            return Err(GeometryError::TrackTooLong {
                requested: rules.track_length,
                available: TRACK.len(),
            });
        }
        Ok(Self { rules })
    }

    /// Geometry for the default rules
    pub fn standard() -> Self {
        Self {
            rules: GameRules::default(),
        }
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Map a figure's raw position to the cell it is drawn on.
    ///
    /// `figure_index` is the figure's index within its owner's figure list and
    /// only matters for home positions.
    pub fn to_cell(
        &self,
        color: PlayerColor,
        position: i32,
        figure_index: usize,
    ) -> Result<Cell, GeometryError> {
        let unrenderable = GeometryError::Unrenderable { position };
        let color_idx = usize::from(color.slot());

        match BoardPosition::from_raw(position, &self.rules) {
            Some(BoardPosition::Home) => {
                if figure_index >= usize::from(self.rules.home_slots) {
                    return Err(unrenderable);
                }
                HOMES[color_idx].get(figure_index).copied().ok_or(unrenderable)
            }
            Some(BoardPosition::Path(index)) => {
                TRACK.get(usize::from(index)).copied().ok_or(unrenderable)
            }
            Some(BoardPosition::Finish(index)) => FINISH_LANES[color_idx]
                .get(usize::from(index))
                .copied()
                .ok_or(unrenderable),
            None => Err(unrenderable),
        }
    }

    /// Reverse lookup: what a cell is used for, if anything
    pub fn locate(&self, cell: Cell) -> Option<CellRole> {
        if let Some(index) = TRACK[..usize::from(self.rules.track_length)]
            .iter()
            .position(|c| *c == cell)
        {
            return Some(CellRole::Path { index: index as u16 });
        }

        for color in PlayerColor::ALL {
            let color_idx = usize::from(color.slot());

            let home_slots = usize::from(self.rules.home_slots).min(4);
            if let Some(slot) = HOMES[color_idx][..home_slots].iter().position(|c| *c == cell) {
                return Some(CellRole::Home {
                    color,
                    slot: slot as u8,
                });
            }

            let lane_len = usize::from(self.rules.finish_lane_length).min(4);
            if let Some(index) = FINISH_LANES[color_idx][..lane_len]
                .iter()
                .position(|c| *c == cell)
            {
                return Some(CellRole::Finish {
                    color,
                    index: index as u8,
                });
            }
        }

        None
    }

    /// Tile drawn at a cell of the empty board
    pub fn tile(&self, cell: Cell) -> Tile {
        let symbol = LAYOUT
            .get(usize::from(cell.row))
            .and_then(|row| row.as_bytes().get(usize::from(cell.col)))
            .copied()
            .unwrap_or(b'.');

        let color = match symbol {
            b'#' => return Tile::Path,
            b'G' => PlayerColor::Green,
            b'P' => PlayerColor::Pink,
            b'O' => PlayerColor::Orange,
            b'B' => PlayerColor::Blue,
            _ => return Tile::Empty,
        };

        if TRACK.contains(&cell) {
            Tile::Launch(color)
        } else if HOMES[usize::from(color.slot())].contains(&cell) {
            Tile::HomeArea(color)
        } else {
            Tile::FinishLane(color)
        }
    }

    /// All non-empty tiles, row-major, for drawing the board once
    pub fn tiles(&self) -> Vec<(Cell, Tile)> {
        (0..GRID_SIZE)
            .flat_map(|row| (0..GRID_SIZE).map(move |col| Cell::new(row, col)))
            .map(|cell| (cell, self.tile(cell)))
            .filter(|(_, tile)| *tile != Tile::Empty)
            .collect()
    }

    /// Cell of a color's launch field
    pub fn launch_cell(&self, color: PlayerColor) -> Cell {
        TRACK[usize::from(self.rules.start_field(color.slot()))]
    }
}

impl Default for BoardGeometry {
    fn default() -> Self {
        Self::standard()
    }
}
