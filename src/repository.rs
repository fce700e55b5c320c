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

//! The storage interfaces the session engine consumes.

use crate::error::Fallible;
use crate::types::card::Card;
use crate::types::card::Deck;
use crate::types::session_log::SessionLogEntry;

pub trait DeckRepository: Send + Sync {
    /// Load a deck with all of its cards. Fails with a not-found error if
    /// the deck does not exist.
    fn deck_with_cards(&self, deck_id: &str) -> Fallible<Deck>;

    /// Persist a deck's own fields (not its cards).
    fn update_deck(&self, deck: &Deck) -> Fallible<()>;

    /// Load a single card. Fails with a not-found error if it does not exist.
    fn card(&self, card_id: &str) -> Fallible<Card>;

    /// Persist a card's counters, rating, and retired flag.
    fn update_card(&self, card: &Card) -> Fallible<()>;
}

pub trait SessionLogRepository: Send + Sync {
    /// Append an entry. Implementations enforce their own retention cap as
    /// part of the insert.
    fn append(&self, entry: &SessionLogEntry) -> Fallible<()>;

    /// All entries of a session, oldest first.
    fn entries_for_session(&self, session_id: &str) -> Fallible<Vec<SessionLogEntry>>;

    /// Distinct session identifiers for a user, optionally scoped to a deck,
    /// ordered by their latest entry, most recent first.
    fn recent_session_ids(
        &self,
        user_id: &str,
        deck_id: Option<&str>,
        limit: usize,
    ) -> Fallible<Vec<String>>;
}
