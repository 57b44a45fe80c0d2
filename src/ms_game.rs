// Core game logic
// Board generation, cell state changes, the uncover cascade and the
// player-facing view of a board

use std::collections::BTreeSet;
use std::fmt;

use rand::Rng;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ms_error::GameError;

/// Largest accepted board side.
pub const MAX_SIDE: usize = 100;

/// Cell coordinates as (column, row).
pub type CellKey = (usize, usize);

/// What the player has done to a cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Covered,
    Uncovered,
    Flagged,
}

/// A single cell on the minesweeper board
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    pub bomb: bool,
    pub status: Status,
}

impl Cell {
    /// Flagged cells are still covered.
    pub fn is_covered(&self) -> bool {
        self.status != Status::Uncovered
    }

    pub fn is_flagged(&self) -> bool {
        self.status == Status::Flagged
    }

    pub fn has_bomb(&self) -> bool {
        self.bomb
    }

    pub fn flag(&mut self) {
        self.status = Status::Flagged;
    }

    pub fn unflag(&mut self) {
        self.status = Status::Covered;
    }

    pub fn uncover(&mut self) {
        self.status = Status::Uncovered;
    }
}

/// Game board of `cols x rows` cells, stored row by row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cols: usize,
    rows: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Create an empty board: no bombs, every cell covered.
    pub fn new(cols: usize, rows: usize) -> Self {
        Board {
            cols,
            rows,
            cells: vec![Cell::default(); cols * rows],
        }
    }

    /// Create a board and scatter `bombs` over it.
    /// Requests for more bombs than cells fill the whole board.
    pub fn generate<R: Rng>(cols: usize, rows: usize, bombs: usize, rng: &mut R) -> Result<Self, GameError> {
        if !(1..=MAX_SIDE).contains(&cols) || !(1..=MAX_SIDE).contains(&rows) {
            return Err(GameError::InvalidSize { max: MAX_SIDE });
        }
        let mut board = Board::new(cols, rows);
        board.populate_bombs(rng, bombs);
        Ok(board)
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    fn index(&self, (c, r): CellKey) -> usize {
        r * self.cols + c
    }

    fn contains(&self, (c, r): CellKey) -> bool {
        c < self.cols && r < self.rows
    }

    pub fn get(&self, key: CellKey) -> Result<&Cell, GameError> {
        if !self.contains(key) {
            return Err(GameError::CellOutOfRange(key.0, key.1));
        }
        Ok(&self.cells[self.index(key)])
    }

    pub fn get_mut(&mut self, key: CellKey) -> Result<&mut Cell, GameError> {
        if !self.contains(key) {
            return Err(GameError::CellOutOfRange(key.0, key.1));
        }
        let idx = self.index(key);
        Ok(&mut self.cells[idx])
    }

    /// All cells with their keys; the column varies fastest.
    pub fn cells(&self) -> impl Iterator<Item = (CellKey, &Cell)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| ((i % cols, i / cols), cell))
    }

    fn neighbor_keys(&self, (c, r): CellKey) -> impl Iterator<Item = CellKey> + use<> {
        let (cols, rows) = (self.cols, self.rows);
        let rmin = r.saturating_sub(1);
        let cmin = c.saturating_sub(1);
        (rmin..=(r + 1).min(rows.saturating_sub(1)))
            .flat_map(move |nr| (cmin..=(c + 1).min(cols.saturating_sub(1))).map(move |nc| (nc, nr)))
            .filter(move |&k| k != (c, r))
    }

    /// The up-to-eight cells around `key`, clipped to the board.
    pub fn neighbors(&self, key: CellKey) -> impl Iterator<Item = (CellKey, &Cell)> + '_ {
        self.neighbor_keys(key).map(move |k| (k, &self.cells[self.index(k)]))
    }

    pub fn adjacent_bombs(&self, key: CellKey) -> u8 {
        self.neighbors(key).filter(|(_, cell)| cell.has_bomb()).count() as u8
    }

    pub fn bombs(&self) -> usize {
        self.cells.iter().filter(|c| c.has_bomb()).count()
    }

    /// Scatter bombs: every pass visits the free cells in order and arms each
    /// with probability `bombs / size`, until the requested count is armed.
    /// Returns how many bombs were placed.
    pub fn populate_bombs<R: Rng>(&mut self, rng: &mut R, bombs: usize) -> usize {
        let size = self.cells.len();
        let free = size - self.bombs();
        let target = bombs.min(free);
        if target == 0 {
            return 0;
        }
        let probability = (bombs as f64 / size as f64).min(1.0);
        let mut remaining = target;
        while remaining > 0 {
            for cell in self.cells.iter_mut() {
                if remaining > 0 && !cell.bomb && rng.gen_bool(probability) {
                    cell.bomb = true;
                    remaining -= 1;
                }
            }
        }
        target
    }

    /// Open up the area around an uncovered, bomb-free cell.
    ///
    /// A pending cell with no bomb among its neighbors gets all neighbors
    /// uncovered (flags included), and the neighbors that were still covered
    /// are queued in turn. Cells next to a bomb stop the spread.
    pub fn uncover_cascade(&mut self, key: CellKey) -> Result<(), GameError> {
        let cell = self.get(key)?;
        if cell.is_covered() || cell.has_bomb() {
            return Ok(());
        }

        let mut pending = BTreeSet::from([key]);
        while let Some(current) = pending.pop_first() {
            let around: Vec<CellKey> = self.neighbor_keys(current).collect();
            let bomb_nearby = around.iter().any(|&k| self.cells[self.index(k)].has_bomb());
            if bomb_nearby {
                continue;
            }
            for k in around {
                let idx = self.index(k);
                if self.cells[idx].is_covered() {
                    pending.insert(k);
                }
                self.cells[idx].uncover();
            }
            let idx = self.index(current);
            self.cells[idx].uncover();
        }
        Ok(())
    }

    /// Some bomb has been uncovered.
    pub fn is_lost(&self) -> bool {
        self.cells.iter().any(|c| c.has_bomb() && !c.is_covered())
    }

    /// Every bomb-free cell is uncovered and no bomb went off.
    pub fn is_won(&self) -> bool {
        !self.is_lost() && self.cells.iter().all(|c| c.has_bomb() || !c.is_covered())
    }

    pub fn is_finished(&self) -> bool {
        self.is_lost() || self.is_won()
    }

    /// Change the status of one cell, cascading when it is uncovered.
    pub fn apply(&mut self, key: CellKey, status: Status) -> Result<(), GameError> {
        self.get(key)?;
        if self.is_finished() {
            return Err(GameError::GameFinished);
        }
        let cell = self.get_mut(key)?;
        if !cell.is_covered() {
            return Err(GameError::CellAlreadyUncovered);
        }
        match status {
            Status::Covered => cell.unflag(),
            Status::Flagged => cell.flag(),
            Status::Uncovered => {
                cell.uncover();
                self.uncover_cascade(key)?;
            }
        }
        Ok(())
    }

    /// The board as the player sees it: a list of columns, each a list of
    /// cells from the first row down.
    pub fn view(&self) -> Vec<Vec<CellView>> {
        (0..self.cols)
            .map(|c| {
                (0..self.rows)
                    .map(|r| {
                        let cell = &self.cells[self.index((c, r))];
                        match cell.status {
                            Status::Flagged => CellView::Flagged,
                            Status::Covered => CellView::Covered,
                            Status::Uncovered if cell.bomb => CellView::Bomb,
                            Status::Uncovered => CellView::Count(self.adjacent_bombs((c, r))),
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

/// One cell of the player view. On the wire: `"c"`, `"f"`, `"b"` or the
/// number of adjacent bombs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellView {
    Covered,
    Flagged,
    Bomb,
    Count(u8),
}

impl Serialize for CellView {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            CellView::Covered => serializer.serialize_str("c"),
            CellView::Flagged => serializer.serialize_str("f"),
            CellView::Bomb => serializer.serialize_str("b"),
            CellView::Count(n) => serializer.serialize_u8(*n),
        }
    }
}

impl<'de> Deserialize<'de> for CellView {
    fn deserialize<D>(deserializer: D) -> Result<CellView, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CellViewVisitor;

        impl Visitor<'_> for CellViewVisitor {
            type Value = CellView;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("\"c\", \"f\", \"b\" or a bomb count")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<CellView, E> {
                match v {
                    "c" => Ok(CellView::Covered),
                    "f" => Ok(CellView::Flagged),
                    "b" => Ok(CellView::Bomb),
                    _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
                }
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<CellView, E> {
                u8::try_from(v)
                    .ok()
                    .filter(|n| *n <= 8)
                    .map(CellView::Count)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }
        }

        deserializer.deserialize_any(CellViewVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    fn covered_view(cols: usize, rows: usize) -> Vec<Vec<CellView>> {
        vec![vec![CellView::Covered; rows]; cols]
    }

    #[test]
    fn cells_iterate_column_first() {
        let board = Board::new(2, 2);
        let keys: Vec<CellKey> = board.cells().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn out_of_range_cells() {
        let empty = Board::new(0, 0);
        assert_eq!(empty.get((0, 0)), Err(GameError::CellOutOfRange(0, 0)));

        let board = Board::new(2, 2);
        assert_eq!(board.get((3, 0)), Err(GameError::CellOutOfRange(3, 0)));
        assert!(board.get((1, 1)).is_ok());
    }

    #[test]
    fn neighbors_are_clipped_to_the_board() {
        let board = Board::new(10, 10);
        let keys = |key| {
            let mut v: Vec<CellKey> = board.neighbors(key).map(|(k, _)| k).collect();
            v.sort();
            v
        };
        assert_eq!(keys((0, 0)), vec![(0, 1), (1, 0), (1, 1)]);
        assert_eq!(keys((9, 9)), vec![(8, 8), (8, 9), (9, 8)]);
        assert_eq!(
            keys((4, 4)),
            vec![(3, 3), (3, 4), (3, 5), (4, 3), (4, 5), (5, 3), (5, 4), (5, 5)]
        );
        assert_eq!(Board::new(1, 1).neighbors((0, 0)).count(), 0);
    }

    #[test]
    fn cell_flags() {
        let mut cell = Cell::default();
        assert!(!cell.is_flagged());
        assert!(cell.is_covered());
        cell.flag();
        assert!(cell.is_flagged());
        assert!(cell.is_covered());
        cell.unflag();
        assert!(!cell.is_flagged());
        cell.uncover();
        assert!(!cell.is_covered());
        assert!(!cell.is_flagged());
    }

    #[test]
    fn bombs_are_placed_exactly() {
        let mut rng = StdRng::seed_from_u64(7);
        let board = Board::generate(8, 9, 10, &mut rng).unwrap();
        assert_eq!(board.bombs(), 10);

        let full = Board::generate(3, 3, 50, &mut rng).unwrap();
        assert_eq!(full.bombs(), 9);

        let none = Board::generate(3, 3, 0, &mut rng).unwrap();
        assert_eq!(none.bombs(), 0);
    }

    #[test]
    fn board_size_is_validated() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(Board::generate(0, 5, 1, &mut rng).is_err());
        assert!(Board::generate(5, MAX_SIDE + 1, 1, &mut rng).is_err());
    }

    #[test]
    fn empty_board_view_is_covered() {
        let board = Board::new(8, 9);
        assert_eq!(board.view(), covered_view(8, 9));
    }

    #[test]
    fn uncovered_cell_shows_adjacent_bomb_count() {
        let mut board = Board::new(8, 9);
        board.get_mut((2, 2)).unwrap().bomb = true;
        board.get_mut((2, 3)).unwrap().uncover();
        board.get_mut((2, 4)).unwrap().bomb = true;
        let mut expected = covered_view(8, 9);
        expected[2][3] = CellView::Count(2);
        assert_eq!(board.view(), expected);
    }

    #[test]
    fn flagged_cells_show_as_flags() {
        let mut board = Board::new(8, 9);
        let cell = board.get_mut((2, 2)).unwrap();
        cell.bomb = true;
        cell.flag();
        let mut expected = covered_view(8, 9);
        expected[2][2] = CellView::Flagged;
        assert_eq!(board.view(), expected);
    }

    #[test]
    fn cascade_opens_area_and_stops_at_bomb_borders() {
        // 5x5 with a single bomb in the bottom-right corner
        let mut board = Board::new(5, 5);
        board.get_mut((4, 4)).unwrap().bomb = true;
        board.apply((0, 0), Status::Uncovered).unwrap();

        let covered: Vec<CellKey> = board
            .cells()
            .filter(|(_, c)| c.is_covered())
            .map(|(k, _)| k)
            .collect();
        assert_eq!(covered, vec![(4, 4)]);
        assert!(board.is_won());
        assert_eq!(board.view()[3][3], CellView::Count(1));
    }

    #[test]
    fn cascade_does_not_spread_from_numbered_cells() {
        let mut board = Board::new(5, 5);
        board.get_mut((1, 1)).unwrap().bomb = true;
        board.apply((0, 0), Status::Uncovered).unwrap();
        let uncovered = board.cells().filter(|(_, c)| !c.is_covered()).count();
        assert_eq!(uncovered, 1);
        assert!(!board.is_finished());
    }

    #[test]
    fn cascade_uncovers_flagged_neighbors() {
        let mut board = Board::new(3, 1);
        board.apply((2, 0), Status::Flagged).unwrap();
        board.apply((0, 0), Status::Uncovered).unwrap();
        assert!(!board.get((2, 0)).unwrap().is_covered());
    }

    #[test]
    fn uncovering_a_bomb_loses() {
        let mut board = Board::new(3, 3);
        board.get_mut((1, 1)).unwrap().bomb = true;
        board.apply((1, 1), Status::Uncovered).unwrap();
        assert!(board.is_lost());
        assert!(!board.is_won());
        assert_eq!(board.view()[1][1], CellView::Bomb);
        assert_eq!(
            board.apply((0, 0), Status::Uncovered),
            Err(GameError::GameFinished)
        );
    }

    #[test]
    fn apply_rejects_uncovered_cells_and_bad_keys() {
        let mut board = Board::new(3, 3);
        board.get_mut((1, 1)).unwrap().bomb = true;
        board.apply((0, 0), Status::Uncovered).unwrap();
        assert!(!board.is_finished());
        assert_eq!(
            board.apply((0, 0), Status::Flagged),
            Err(GameError::CellAlreadyUncovered)
        );
        assert_eq!(
            board.apply((7, 0), Status::Flagged),
            Err(GameError::CellOutOfRange(7, 0))
        );
    }

    #[test]
    fn flag_and_unflag_through_apply() {
        let mut board = Board::new(2, 2);
        board.get_mut((0, 0)).unwrap().bomb = true;
        board.apply((0, 0), Status::Flagged).unwrap();
        assert!(board.get((0, 0)).unwrap().is_flagged());
        board.apply((0, 0), Status::Covered).unwrap();
        assert_eq!(board.get((0, 0)).unwrap().status, Status::Covered);
    }

    #[test]
    fn view_wire_format() {
        let row = vec![CellView::Covered, CellView::Flagged, CellView::Bomb, CellView::Count(3)];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"["c","f","b",3]"#);
        let back: Vec<CellView> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
        assert!(serde_json::from_str::<CellView>("\"x\"").is_err());
        assert!(serde_json::from_str::<CellView>("9").is_err());
    }

    #[test]
    fn status_wire_names() {
        let names: HashMap<&str, Status> = [
            ("\"covered\"", Status::Covered),
            ("\"uncovered\"", Status::Uncovered),
            ("\"flagged\"", Status::Flagged),
        ]
        .into_iter()
        .collect();
        for (json, status) in names {
            assert_eq!(serde_json::from_str::<Status>(json).unwrap(), status);
        }
    }
}
