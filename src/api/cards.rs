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
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Deserialize;
use serde::Serialize;

use crate::api::response::Message;
use crate::api::response::user_id;
use crate::api::state::ServerState;
use crate::error::ErrorReport;
use crate::repository::DeckRepository;
use crate::types::action::CardAction;

#[derive(Deserialize)]
pub struct CardStatsRequest {
    card_id: String,
    /// When present, the deck's live session is updated too.
    #[serde(default)]
    deck_id: Option<String>,
    action: String,
    #[serde(default)]
    value: Option<u8>,
}

#[derive(Serialize)]
pub struct CardStatsResponse {
    message: String,
    /// Whether a live session recorded the outcome.
    session_updated: bool,
}

#[derive(Deserialize)]
pub struct ClearStatsRequest {
    deck_id: String,
    #[serde(default)]
    clear_session: bool,
    #[serde(default)]
    clear_stats: bool,
}

/// Applies an action to a card's stored counters, then to the deck's
/// session.
pub async fn card_stats_handler(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(request): Json<CardStatsRequest>,
) -> Result<Json<CardStatsResponse>, ErrorReport> {
    let action = CardAction::try_from(request.action.as_str())?;
    let mut card = state.db.card(&request.card_id)?;
    card.apply(action, request.value)?;
    state.db.update_card(&card)?;
    let session_updated = match request.deck_id.as_deref() {
        Some(deck_id) if !deck_id.is_empty() => state.store.record_outcome(
            deck_id,
            &request.card_id,
            action,
            request.value,
            &user_id(&headers),
        )?,
        _ => false,
    };
    Ok(Json(CardStatsResponse {
        message: "Card stats updated successfully".to_string(),
        session_updated,
    }))
}

/// Resets a deck's session and/or the stored counters of its cards.
pub async fn clear_stats_handler(
    State(state): State<ServerState>,
    Json(request): Json<ClearStatsRequest>,
) -> Result<Json<Message>, ErrorReport> {
    let deck = state.db.deck_with_cards(&request.deck_id)?;
    if request.clear_session {
        state.store.reset_session(&deck.deck_id)?;
    }
    if request.clear_stats {
        for mut card in deck.cards {
            card.apply(CardAction::ResetStats, None)?;
            state.db.update_card(&card)?;
        }
        log::info!("Card statistics reset: deck={}", deck.deck_id);
    }
    Ok(Message::new("Deck stats cleared successfully"))
}
