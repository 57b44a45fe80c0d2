// JSON bodies exchanged between the API server and the terminal client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ms_game::{CellView, Status};

/// A game as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    pub uuid: Uuid,
    /// One list per column, each holding that column's cells top to bottom.
    pub board: Vec<Vec<CellView>>,
    pub cols: usize,
    pub rows: usize,
    pub bombs: usize,
    pub finished: bool,
    pub won: bool,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl GameView {
    pub fn cell(&self, col: usize, row: usize) -> Option<CellView> {
        self.board.get(col).and_then(|c| c.get(row)).copied()
    }

    pub fn flags(&self) -> usize {
        self.board
            .iter()
            .flatten()
            .filter(|c| **c == CellView::Flagged)
            .count()
    }

    /// Bomb counter shown to the player; negative when over-flagged.
    pub fn remaining_bombs(&self) -> isize {
        self.bombs as isize - self.flags() as isize
    }

    /// Whole seconds between creation and the end of the game.
    pub fn duration_secs(&self) -> Option<u64> {
        self.finished_at
            .map(|end| (end - self.created_at).num_seconds().max(0) as u64)
    }
}

/// Body of `POST /api/games`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGame {
    pub cols: usize,
    pub rows: usize,
    pub bombs: usize,
}

/// Body of `PATCH /api/games/:uuid/cells/:col,:row`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellUpdate {
    pub status: Status,
}

/// Error body sent with every non-success status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> GameView {
        let created_at = Utc::now();
        GameView {
            uuid: Uuid::new_v4(),
            board: vec![
                vec![CellView::Flagged, CellView::Covered],
                vec![CellView::Count(1), CellView::Flagged],
            ],
            cols: 2,
            rows: 2,
            bombs: 1,
            finished: false,
            won: false,
            created_at,
            finished_at: None,
        }
    }

    #[test]
    fn counts_flags_against_bombs() {
        let view = sample();
        assert_eq!(view.flags(), 2);
        assert_eq!(view.remaining_bombs(), -1);
        assert_eq!(view.cell(1, 0), Some(CellView::Count(1)));
        assert_eq!(view.cell(2, 0), None);
    }

    #[test]
    fn duration_only_for_finished_games() {
        let mut view = sample();
        assert_eq!(view.duration_secs(), None);
        view.finished_at = Some(view.created_at + Duration::seconds(42));
        assert_eq!(view.duration_secs(), Some(42));
    }

    #[test]
    fn cell_update_body() {
        let body: CellUpdate = serde_json::from_str(r#"{"status":"flagged"}"#).unwrap();
        assert_eq!(body.status, Status::Flagged);
        assert!(serde_json::from_str::<CellUpdate>(r#"{"status":"open"}"#).is_err());
    }
}
