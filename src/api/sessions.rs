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

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Deserialize;
use serde::Serialize;

use crate::api::response::Message;
use crate::api::response::user_id;
use crate::api::state::ServerState;
use crate::error::ErrorReport;
use crate::error::not_found;
use crate::overview::SessionOverview;
use crate::overview::session_overview;
use crate::repository::SessionLogRepository;
use crate::session::SessionStats;
use crate::types::session_log::SessionLogEntry;
use crate::types::strategy::Strategy;

#[derive(Deserialize)]
pub struct StartRequest {
    deck_id: String,
    /// `-1` selects every card.
    count: i64,
    method: String,
}

#[derive(Serialize)]
pub struct StartResponse {
    message: String,
    session_id: String,
}

#[derive(Deserialize)]
pub struct DeckQuery {
    deck_id: String,
}

#[derive(Deserialize)]
pub struct OptionalDeckQuery {
    deck_id: Option<String>,
}

impl OptionalDeckQuery {
    fn deck_id(&self) -> Option<&str> {
        self.deck_id.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Serialize)]
pub struct NextCardResponse {
    card_id: String,
}

pub async fn start_handler(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(request): Json<StartRequest>,
) -> Result<Json<StartResponse>, ErrorReport> {
    let strategy = Strategy::try_from(request.method.as_str())?;
    let session_id =
        state
            .store
            .start_session(&request.deck_id, request.count, strategy, &user_id(&headers))?;
    Ok(Json(StartResponse {
        message: "Session started successfully".to_string(),
        session_id,
    }))
}

pub async fn next_handler(
    State(state): State<ServerState>,
    Query(query): Query<DeckQuery>,
) -> Result<Json<NextCardResponse>, ErrorReport> {
    match state.store.next_card(&query.deck_id)? {
        Some(card_id) => Ok(Json(NextCardResponse { card_id })),
        None => not_found("No more cards in the session"),
    }
}

pub async fn clear_handler(
    State(state): State<ServerState>,
    Query(query): Query<DeckQuery>,
) -> Result<Json<Message>, ErrorReport> {
    state.store.clear_session(&query.deck_id)?;
    Ok(Message::new("Session cleared successfully"))
}

pub async fn stats_handler(
    State(state): State<ServerState>,
    Query(query): Query<DeckQuery>,
) -> Result<Json<SessionStats>, ErrorReport> {
    Ok(Json(state.store.session_stats(&query.deck_id)?))
}

pub async fn overview_handler(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<OptionalDeckQuery>,
) -> Result<Json<Vec<SessionOverview>>, ErrorReport> {
    let overviews = session_overview(
        &state.db,
        &user_id(&headers),
        query.deck_id(),
        state.overview_sessions,
    )?;
    Ok(Json(overviews))
}

pub async fn ids_handler(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<OptionalDeckQuery>,
) -> Result<Json<Vec<String>>, ErrorReport> {
    let ids =
        state
            .db
            .recent_session_ids(&user_id(&headers), query.deck_id(), state.overview_sessions)?;
    Ok(Json(ids))
}

pub async fn logs_handler(
    State(state): State<ServerState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<SessionLogEntry>>, ErrorReport> {
    Ok(Json(state.db.entries_for_session(&session_id)?))
}
