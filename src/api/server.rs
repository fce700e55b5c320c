// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;

use crate::api::cards::card_stats_handler;
use crate::api::cards::clear_stats_handler;
use crate::api::response::Message;
use crate::api::sessions::clear_handler;
use crate::api::sessions::ids_handler;
use crate::api::sessions::logs_handler;
use crate::api::sessions::next_handler;
use crate::api::sessions::overview_handler;
use crate::api::sessions::start_handler;
use crate::api::sessions::stats_handler;
use crate::api::state::ServerState;
use crate::config::Config;
use crate::db::Database;
use crate::error::Fallible;
use crate::session::store::SessionStore;

pub async fn start_server(config: Config) -> Fallible<()> {
    log::debug!("Opening database at {}", config.database.display());
    let db = Database::new(config.database_path()?, config.max_log_rows)?;
    let store = SessionStore::new(Arc::new(db.clone()), Arc::new(db.clone()));
    let state = ServerState {
        store: Arc::new(store),
        db,
        overview_sessions: config.overview_sessions,
    };
    let app = router(state);

    log::info!("Starting server on {}", config.bind);
    let listener = TcpListener::bind(&config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped.");
    Ok(())
}

pub fn router(state: ServerState) -> Router {
    let app = Router::new();
    let app = app.route("/sessions/start", post(start_handler));
    let app = app.route("/sessions/next", get(next_handler));
    let app = app.route("/sessions/clear", delete(clear_handler));
    let app = app.route("/sessions/stats", get(stats_handler));
    let app = app.route("/sessions/overview", get(overview_handler));
    let app = app.route("/sessions/ids", get(ids_handler));
    let app = app.route("/sessions/{session_id}", get(logs_handler));
    let app = app.route("/cards/stats", post(card_stats_handler));
    let app = app.route("/decks/stats/clear", post(clear_stats_handler));
    let app = app.fallback(not_found_handler);
    app.with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down.");
}

async fn not_found_handler() -> (StatusCode, axum::Json<Message>) {
    (StatusCode::NOT_FOUND, Message::new("Not Found"))
}
