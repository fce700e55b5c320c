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

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::not_found;
use crate::repository::DeckRepository;
use crate::repository::SessionLogRepository;
use crate::select::select_working_set;
use crate::session::Session;
use crate::session::SessionStats;
use crate::types::action::CardAction;
use crate::types::action::LogAction;
use crate::types::session_log::SessionLogEntry;
use crate::types::strategy::Strategy;
use crate::types::timestamp::Timestamp;

/// The registry of live sessions, at most one per deck.
///
/// Every read and write of session state goes through the one `RwLock`:
/// stats take the read lock, everything that changes a session takes the
/// write lock. Storage calls are made with the lock released.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    decks: Arc<dyn DeckRepository>,
    logs: Arc<dyn SessionLogRepository>,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl SessionStore {
    pub fn new(decks: Arc<dyn DeckRepository>, logs: Arc<dyn SessionLogRepository>) -> Self {
        Self::with_rng(decks, logs, StdRng::from_entropy())
    }

    /// Builds a store that draws all randomness from the given generator.
    pub fn with_rng(
        decks: Arc<dyn DeckRepository>,
        logs: Arc<dyn SessionLogRepository>,
        rng: impl RngCore + Send + 'static,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            decks,
            logs,
            rng: Mutex::new(Box::new(rng)),
        }
    }

    /// Starts a session over a deck, replacing any session already running
    /// on it. Returns the new session's identifier.
    pub fn start_session(
        &self,
        deck_id: &str,
        count: i64,
        strategy: Strategy,
        user_id: &str,
    ) -> Fallible<String> {
        let mut deck = self.decks.deck_with_cards(deck_id)?;
        let selected = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| ErrorReport::new("random source lock poisoned"))?;
            select_working_set(&deck.cards, count, strategy, &mut **rng)
        };
        let session = Session::new(deck_id, user_id, strategy, &selected);
        let session_id = session.session_id().to_string();

        deck.last_accessed_at = Some(Timestamp::now());
        self.decks.update_deck(&deck)?;

        let replaced = self.write()?.insert(deck_id.to_string(), session);
        if let Some(previous) = replaced {
            log::debug!(
                "Discarding session {} on deck {deck_id}",
                previous.session_id()
            );
        }
        log::info!(
            "Session started: deck={deck_id} session={session_id} method={strategy} cards={}",
            selected.len()
        );
        Ok(session_id)
    }

    /// Hands out the next card of a deck's session. `None` means the
    /// session has no cards.
    pub fn next_card(&self, deck_id: &str) -> Fallible<Option<String>> {
        let (draw, reshuffle) = {
            let mut sessions = self.write()?;
            let Some(session) = sessions.get_mut(deck_id) else {
                return not_found("session does not exist for the given deck");
            };
            let draw = session.next_card();
            let reshuffle = match &draw {
                Some(draw) if draw.requeued => Some(SessionLogEntry::new(
                    session.deck_id(),
                    "",
                    session.session_id(),
                    session.user_id(),
                    LogAction::Reshuffle,
                )),
                _ => None,
            };
            (draw, reshuffle)
        };
        if let Some(entry) = reshuffle {
            log::debug!("Session {} requeued on deck {deck_id}", entry.session_id);
            if let Err(e) = self.logs.append(&entry) {
                log::warn!("Failed to log reshuffle for deck {deck_id}: {e}");
            }
        }
        Ok(draw.map(|draw| draw.card_id))
    }

    /// Records an action against a card of a deck's session.
    ///
    /// Returns `false` without doing anything if the deck has no session.
    /// Scoring actions are appended to the session log; if that fails the
    /// error is returned but the session keeps the new outcome.
    pub fn record_outcome(
        &self,
        deck_id: &str,
        card_id: &str,
        action: CardAction,
        value: Option<u8>,
        user_id: &str,
    ) -> Fallible<bool> {
        // The entry is stamped under the lock so log order follows the
        // order in which outcomes were applied.
        let entry = {
            let mut sessions = self.write()?;
            let Some(session) = sessions.get_mut(deck_id) else {
                log::debug!("No session on deck {deck_id}; dropping {}", action.as_str());
                return Ok(false);
            };
            session.apply(card_id, action, value)?;
            log::debug!(
                "Session adjusted: deck={deck_id} card={card_id} action={} viewed={} remaining={}",
                action.as_str(),
                session.viewed_count(),
                session.remaining()
            );
            action.log_action().map(|log_action| {
                SessionLogEntry::new(deck_id, card_id, session.session_id(), user_id, log_action)
            })
        };
        if let Some(entry) = entry {
            self.logs.append(&entry)?;
        }
        Ok(true)
    }

    pub fn clear_session(&self, deck_id: &str) -> Fallible<()> {
        match self.write()?.remove(deck_id) {
            Some(_) => {
                log::info!("Session cleared: deck={deck_id}");
                Ok(())
            }
            None => not_found("session does not exist for the given deck"),
        }
    }

    /// Clears the outcomes of a deck's session and rewinds its cursor.
    /// Returns whether the deck had a session.
    pub fn reset_session(&self, deck_id: &str) -> Fallible<bool> {
        let mut sessions = self.write()?;
        match sessions.get_mut(deck_id) {
            Some(session) => {
                session.reset();
                log::info!("Session reset: deck={deck_id}");
                Ok(true)
            }
            None => {
                log::info!("No active session to reset: deck={deck_id}");
                Ok(false)
            }
        }
    }

    /// A snapshot of a deck's session, or zero stats if there is none.
    pub fn session_stats(&self, deck_id: &str) -> Fallible<SessionStats> {
        let sessions = self.read()?;
        Ok(sessions
            .get(deck_id)
            .map(Session::stats)
            .unwrap_or_default())
    }

    fn read(&self) -> Fallible<RwLockReadGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .read()
            .map_err(|_| ErrorReport::new("session store lock poisoned"))
    }

    fn write(&self) -> Fallible<RwLockWriteGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .write()
            .map_err(|_| ErrorReport::new("session store lock poisoned"))
    }
}
