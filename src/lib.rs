// Minesweeper over HTTP
// The library holds the game rules, the API server pieces and the terminal
// client; `src/main.rs` and `src/bin/mswpr-server.rs` only wire them up.

pub mod ms_api;
pub mod ms_auth;
pub mod ms_client;
pub mod ms_color;
pub mod ms_config;
pub mod ms_error;
pub mod ms_game;
pub mod ms_lang;
pub mod ms_log;
pub mod ms_server;
pub mod ms_settings;
pub mod ms_store;
pub mod ms_tls;
pub mod ms_ui;
pub mod ms_wire;
