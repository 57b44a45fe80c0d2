// In-process storage for players, sessions and games

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::ms_error::ApiError;
use crate::ms_game::{Board, CellKey, Status};
use crate::ms_wire::GameView;

/// Most recent games returned by the list endpoint.
pub const LIST_LIMIT: usize = 15;

#[derive(Debug, Clone)]
pub struct GameRecord {
    pub uuid: Uuid,
    /// Lower-cased email of the owner.
    pub player: String,
    pub board: Board,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Creation order; breaks ties between equal timestamps.
    pub seq: u64,
}

impl GameRecord {
    pub fn view(&self) -> GameView {
        GameView {
            uuid: self.uuid,
            board: self.board.view(),
            cols: self.board.cols(),
            rows: self.board.rows(),
            bombs: self.board.bombs(),
            finished: self.board.is_finished(),
            won: self.board.is_won(),
            created_at: self.created_at,
            finished_at: self.finished_at,
        }
    }
}

#[derive(Default)]
pub struct Store {
    /// email -> first seen
    users: RwLock<HashMap<String, DateTime<Utc>>>,
    /// session id -> email
    sessions: RwLock<HashMap<String, String>>,
    games: RwLock<HashMap<Uuid, GameRecord>>,
    next_seq: AtomicU64,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    /// Returns the normalized player name, registering it on first sight.
    pub async fn get_or_create_user(&self, email: &str) -> String {
        let email = email.to_lowercase();
        let mut users = self.users.write().await;
        if !users.contains_key(&email) {
            log::info!("new player {email}");
            users.insert(email.clone(), Utc::now());
        }
        email
    }

    /// The player's session id, minted on the first login. Clients that
    /// never keep the cookie get the same id back on every Basic login.
    pub async fn open_session(&self, player: &str) -> String {
        let mut sessions = self.sessions.write().await;
        if let Some((id, _)) = sessions.iter().find(|(_, p)| p.as_str() == player) {
            return id.clone();
        }
        let id = Uuid::new_v4().simple().to_string();
        sessions.insert(id.clone(), player.to_string());
        id
    }

    pub async fn session_player(&self, id: &str) -> Option<String> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn create_game(&self, player: &str, board: Board) -> GameView {
        let created_at = Utc::now();
        // a board without a safe cell is won before the first move
        let finished_at = board.is_finished().then_some(created_at);
        let record = GameRecord {
            uuid: Uuid::new_v4(),
            player: player.to_string(),
            board,
            created_at,
            finished_at,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
        };
        let view = record.view();
        self.games.write().await.insert(record.uuid, record);
        view
    }

    /// The player's most recent games, newest first.
    pub async fn list_games(&self, player: &str) -> Vec<GameView> {
        let games = self.games.read().await;
        let mut own: Vec<&GameRecord> = games.values().filter(|g| g.player == player).collect();
        own.sort_by(|a, b| (b.created_at, b.seq).cmp(&(a.created_at, a.seq)));
        own.into_iter().take(LIST_LIMIT).map(GameRecord::view).collect()
    }

    pub async fn game(&self, uuid: Uuid, player: &str) -> Result<GameView, ApiError> {
        let games = self.games.read().await;
        let record = games.get(&uuid).ok_or(ApiError::NotFound)?;
        if record.player != player {
            return Err(ApiError::PermissionDenied);
        }
        Ok(record.view())
    }

    /// Applies a cell change and stamps the finish time when the change ends
    /// the game.
    pub async fn update_cell(
        &self,
        uuid: Uuid,
        player: &str,
        key: CellKey,
        status: Status,
    ) -> Result<GameView, ApiError> {
        let mut games = self.games.write().await;
        let record = games.get_mut(&uuid).ok_or(ApiError::NotFound)?;
        if record.player != player {
            return Err(ApiError::PermissionDenied);
        }
        record.board.apply(key, status)?;
        if record.board.is_finished() && record.finished_at.is_none() {
            record.finished_at = Some(Utc::now());
            log::info!(
                "game {} finished: {}",
                record.uuid,
                if record.board.is_won() { "won" } else { "lost" }
            );
        }
        Ok(record.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ms_error::GameError;

    #[tokio::test]
    async fn users_are_case_insensitive() {
        let store = Store::new();
        assert_eq!(store.get_or_create_user("Ann@Example.com").await, "ann@example.com");
        assert_eq!(store.get_or_create_user("ann@example.com").await, "ann@example.com");
        assert_eq!(store.users.read().await.len(), 1);
    }

    #[tokio::test]
    async fn sessions_map_to_players() {
        let store = Store::new();
        let id = store.open_session("ann@example.com").await;
        assert_eq!(store.session_player(&id).await.as_deref(), Some("ann@example.com"));
        assert_eq!(store.session_player("bogus").await, None);
    }

    #[tokio::test]
    async fn one_session_per_player() {
        let store = Store::new();
        let first = store.open_session("ann@example.com").await;
        for _ in 0..20 {
            assert_eq!(store.open_session("ann@example.com").await, first);
        }
        let bob = store.open_session("bob@example.com").await;
        assert_ne!(bob, first);
        assert_eq!(store.sessions.read().await.len(), 2);
    }

    #[tokio::test]
    async fn board_without_safe_cells_is_finished_on_creation() {
        let store = Store::new();
        let mut board = Board::new(2, 1);
        board.get_mut((0, 0)).unwrap().bomb = true;
        board.get_mut((1, 0)).unwrap().bomb = true;
        let view = store.create_game("ann@example.com", board).await;
        assert!(view.finished && view.won);
        assert_eq!(view.finished_at, Some(view.created_at));
        assert_eq!(view.duration_secs(), Some(0));
    }

    #[tokio::test]
    async fn list_is_limited_and_per_player() {
        let store = Store::new();
        for _ in 0..LIST_LIMIT + 3 {
            store.create_game("ann@example.com", Board::new(2, 2)).await;
        }
        store.create_game("bob@example.com", Board::new(2, 2)).await;
        assert_eq!(store.list_games("ann@example.com").await.len(), LIST_LIMIT);
        assert_eq!(store.list_games("bob@example.com").await.len(), 1);
        assert!(store.list_games("eve@example.com").await.is_empty());
    }

    #[tokio::test]
    async fn only_the_player_may_touch_a_game() {
        let store = Store::new();
        let view = store.create_game("ann@example.com", Board::new(2, 2)).await;
        assert!(matches!(
            store.game(view.uuid, "bob@example.com").await,
            Err(ApiError::PermissionDenied)
        ));
        assert!(matches!(
            store.update_cell(view.uuid, "bob@example.com", (0, 0), Status::Flagged).await,
            Err(ApiError::PermissionDenied)
        ));
        assert!(matches!(
            store.game(Uuid::new_v4(), "ann@example.com").await,
            Err(ApiError::NotFound)
        ));
    }

    #[tokio::test]
    async fn finishing_stamps_the_time_once() {
        let store = Store::new();
        let mut board = Board::new(2, 1);
        board.get_mut((1, 0)).unwrap().bomb = true;
        let view = store.create_game("ann@example.com", board).await;

        let done = store
            .update_cell(view.uuid, "ann@example.com", (0, 0), Status::Uncovered)
            .await
            .unwrap();
        assert!(done.finished && done.won);
        assert!(done.finished_at.is_some());

        let again = store
            .update_cell(view.uuid, "ann@example.com", (1, 0), Status::Flagged)
            .await;
        assert!(matches!(again, Err(ApiError::Game(GameError::GameFinished))));
    }
}
