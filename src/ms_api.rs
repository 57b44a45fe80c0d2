// Game REST API: routes and handlers
//
//   GET   /api/games                        recent games of the player
//   POST  /api/games                        start a game {cols, rows, bombs}
//   GET   /api/games/:uuid                  one game
//   PATCH /api/games/:uuid/cells/:col,:row  change a cell {status}

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Extension, Json, Router};
use uuid::Uuid;

use crate::ms_auth::{Player, authenticate};
use crate::ms_error::ApiError;
use crate::ms_game::{Board, CellKey};
use crate::ms_store::Store;
use crate::ms_wire::{CellUpdate, GameView, NewGame};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    /// Mark session cookies `Secure` (TLS or behind an HTTPS proxy).
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(store: Arc<Store>, secure_cookies: bool) -> Self {
        AppState {
            store,
            secure_cookies,
        }
    }
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/games", get(list_games).post(create_game))
        .route("/api/games/:uuid", get(get_game))
        .route("/api/games/:uuid/cells/:cell", patch(update_cell))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), authenticate))
        .with_state(state)
}

async fn list_games(
    State(state): State<AppState>,
    Extension(Player(player)): Extension<Player>,
) -> Json<Vec<GameView>> {
    Json(state.store.list_games(&player).await)
}

async fn create_game(
    State(state): State<AppState>,
    Extension(Player(player)): Extension<Player>,
    body: Result<Json<NewGame>, JsonRejection>,
) -> Result<(StatusCode, Json<GameView>), ApiError> {
    let Json(new) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let board = Board::generate(new.cols, new.rows, new.bombs, &mut rand::thread_rng())?;
    let view = state.store.create_game(&player, board).await;
    log::info!(
        "{player} started game {} ({}x{}, {} bombs)",
        view.uuid,
        view.cols,
        view.rows,
        view.bombs
    );
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_game(
    State(state): State<AppState>,
    Extension(Player(player)): Extension<Player>,
    Path(uuid): Path<String>,
) -> Result<Json<GameView>, ApiError> {
    let uuid = parse_uuid(&uuid)?;
    Ok(Json(state.store.game(uuid, &player).await?))
}

async fn update_cell(
    State(state): State<AppState>,
    Extension(Player(player)): Extension<Player>,
    Path((uuid, cell)): Path<(String, String)>,
    body: Result<Json<CellUpdate>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let uuid = parse_uuid(&uuid)?;
    let key = parse_cell_key(&cell).ok_or(ApiError::NotFound)?;
    let Json(update) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let view = state.store.update_cell(uuid, &player, key, update.status).await?;
    log::debug!(
        "{player} set {},{} of {} to {:?} (finished: {})",
        key.0,
        key.1,
        uuid,
        update.status,
        view.finished
    );
    Ok(StatusCode::NO_CONTENT)
}

fn parse_uuid(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

/// Parses the `col,row` path segment.
fn parse_cell_key(raw: &str) -> Option<CellKey> {
    let (c, r) = raw.split_once(',')?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(c) || !all_digits(r) {
        return None;
    }
    Some((c.parse().ok()?, r.parse().ok()?))
}
