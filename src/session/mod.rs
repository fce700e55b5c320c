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

pub mod store;

use serde::Serialize;
use uuid::Uuid;

use crate::error::Fallible;
use crate::error::invalid;
use crate::error::not_found;
use crate::types::action::CardAction;
use crate::types::card::Card;
use crate::types::strategy::Strategy;

/// The most recent outcome recorded for a card during the current pass.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct CardOutcome {
    pub card_id: String,
    pub viewed: bool,
    pub skipped: bool,
    pub failed: bool,
    pub passed: bool,
    /// The card's rating when the session started.
    pub star_rating: u8,
}

impl CardOutcome {
    fn new(card: &Card) -> Self {
        Self {
            card_id: card.card_id.clone(),
            viewed: false,
            skipped: false,
            failed: false,
            passed: false,
            star_rating: card.star_rating,
        }
    }

    fn set(&mut self, viewed: bool, skipped: bool, failed: bool, passed: bool) {
        self.viewed = viewed;
        self.skipped = skipped;
        self.failed = failed;
        self.passed = passed;
    }

    /// Position in the requeue order: skipped, then failed, then the rest.
    fn requeue_rank(&self) -> u8 {
        if self.skipped {
            0
        } else if self.failed {
            1
        } else {
            2
        }
    }
}

/// A point-in-time view of a session. The zero value stands for "no
/// session".
#[derive(Clone, Default, PartialEq, Debug, Serialize)]
pub struct SessionStats {
    pub session_id: Option<String>,
    pub method: Option<Strategy>,
    pub total_cards: usize,
    pub viewed_count: usize,
    pub remaining: usize,
    pub current_index: usize,
    /// How many cards the cursor has handed out.
    pub served: usize,
    /// How many times the cursor has wrapped around.
    pub passes: usize,
    pub card_stats: Vec<CardOutcome>,
}

/// The card handed out by the cursor.
#[derive(Clone, PartialEq, Debug)]
pub struct Draw {
    pub card_id: String,
    /// True when this draw wrapped the cursor and requeued the working set.
    pub requeued: bool,
}

/// An in-memory study session over one deck.
#[derive(Clone, Debug)]
pub struct Session {
    deck_id: String,
    user_id: String,
    session_id: String,
    strategy: Strategy,
    outcomes: Vec<CardOutcome>,
    index: usize,
    served: usize,
    passes: usize,
}

impl Session {
    pub fn new(deck_id: &str, user_id: &str, strategy: Strategy, cards: &[Card]) -> Self {
        Self {
            deck_id: deck_id.to_string(),
            user_id: user_id.to_string(),
            session_id: Uuid::new_v4().to_string(),
            strategy,
            outcomes: cards.iter().map(CardOutcome::new).collect(),
            index: 0,
            served: 0,
            passes: 0,
        }
    }

    pub fn deck_id(&self) -> &str {
        &self.deck_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Hands out the card at the cursor and advances it. At the end of the
    /// working set the cursor wraps to the start and the outcomes are
    /// regrouped so that skipped cards come first, then failed ones, each
    /// group keeping its relative order.
    pub fn next_card(&mut self) -> Option<Draw> {
        if self.outcomes.is_empty() {
            return None;
        }
        let mut requeued = false;
        if self.index >= self.outcomes.len() {
            self.index = 0;
            self.passes += 1;
            self.outcomes.sort_by_key(CardOutcome::requeue_rank);
            requeued = true;
        }
        let card_id = self.outcomes[self.index].card_id.clone();
        self.index += 1;
        self.served += 1;
        Some(Draw { card_id, requeued })
    }

    /// Records an action against a card in this session.
    pub fn apply(&mut self, card_id: &str, action: CardAction, value: Option<u8>) -> Fallible<()> {
        let Some(outcome) = self.outcomes.iter_mut().find(|o| o.card_id == card_id) else {
            return not_found("card not found in session");
        };
        match action {
            CardAction::IncrementFail => outcome.set(true, false, true, false),
            CardAction::IncrementPass => outcome.set(true, false, false, true),
            CardAction::IncrementSkip => outcome.set(true, true, false, false),
            CardAction::SetStars => match value {
                Some(stars) => outcome.star_rating = stars,
                None => return invalid("star rating value is required"),
            },
            CardAction::Retire => outcome.set(true, false, false, false),
            CardAction::Unretire | CardAction::ResetStats => outcome.set(false, false, false, false),
        }
        Ok(())
    }

    /// Clears every outcome and rewinds the cursor, keeping the working set
    /// and its current order.
    pub fn reset(&mut self) {
        for outcome in &mut self.outcomes {
            outcome.set(false, false, false, false);
        }
        self.index = 0;
        self.served = 0;
        self.passes = 0;
    }

    pub fn stats(&self) -> SessionStats {
        let total_cards = self.outcomes.len();
        let viewed_count = self.viewed_count();
        SessionStats {
            session_id: Some(self.session_id.clone()),
            method: Some(self.strategy),
            total_cards,
            viewed_count,
            remaining: total_cards - viewed_count,
            current_index: self.index,
            served: self.served,
            passes: self.passes,
            card_stats: self.outcomes.clone(),
        }
    }

    pub fn viewed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.viewed).count()
    }

    pub fn remaining(&self) -> usize {
        self.outcomes.len() - self.viewed_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::card::test_card;

    fn session(ids: &[&str]) -> Session {
        let cards: Vec<Card> = ids.iter().map(|id| test_card(id, 0, 0, 0, 0)).collect();
        Session::new("deck", "user", Strategy::Random, &cards)
    }

    fn draw(session: &mut Session) -> String {
        session.next_card().map(|d| d.card_id).unwrap_or_default()
    }

    fn order(session: &Session) -> Vec<String> {
        session
            .stats()
            .card_stats
            .into_iter()
            .map(|o| o.card_id)
            .collect()
    }

    #[test]
    fn test_empty_session() {
        let mut session = session(&[]);
        assert_eq!(session.next_card(), None);
        let stats = session.stats();
        assert_eq!(stats.total_cards, 0);
        assert_eq!(stats.remaining, 0);
        assert_eq!(stats.method, Some(Strategy::Random));
    }

    #[test]
    fn test_cycle() {
        let mut session = session(&["1", "2", "3"]);
        assert_eq!(draw(&mut session), "1");
        assert_eq!(draw(&mut session), "2");
        assert_eq!(draw(&mut session), "3");
        let fourth = session.next_card().unwrap();
        assert_eq!(fourth.card_id, "1");
        assert!(fourth.requeued);
        let stats = session.stats();
        assert_eq!(stats.current_index, 1);
        assert_eq!(stats.served, 4);
        assert_eq!(stats.passes, 1);
    }

    #[test]
    fn test_skipped_card_comes_first_after_wrap() -> Fallible<()> {
        let mut session = session(&["1", "2", "3"]);
        assert_eq!(draw(&mut session), "1");
        session.apply("1", CardAction::IncrementSkip, None)?;
        assert_eq!(draw(&mut session), "2");
        assert_eq!(draw(&mut session), "3");
        assert_eq!(draw(&mut session), "1");
        Ok(())
    }

    #[test]
    fn test_requeue_order() -> Fallible<()> {
        let mut session = session(&["1", "2", "3", "4", "5"]);
        for _ in 0..5 {
            draw(&mut session);
        }
        session.apply("1", CardAction::IncrementPass, None)?;
        session.apply("2", CardAction::IncrementFail, None)?;
        session.apply("3", CardAction::IncrementSkip, None)?;
        session.apply("4", CardAction::IncrementFail, None)?;
        session.apply("5", CardAction::IncrementSkip, None)?;
        assert_eq!(draw(&mut session), "3");
        assert_eq!(order(&session), vec!["3", "5", "2", "4", "1"]);
        Ok(())
    }

    #[test]
    fn test_apply_flags() -> Fallible<()> {
        let mut session = session(&["1"]);
        let flags = |s: &Session| {
            let stats = s.stats();
            let o = &stats.card_stats[0];
            (o.viewed, o.skipped, o.failed, o.passed)
        };
        session.apply("1", CardAction::IncrementFail, None)?;
        assert_eq!(flags(&session), (true, false, true, false));
        session.apply("1", CardAction::IncrementPass, None)?;
        assert_eq!(flags(&session), (true, false, false, true));
        session.apply("1", CardAction::IncrementSkip, None)?;
        assert_eq!(flags(&session), (true, true, false, false));
        session.apply("1", CardAction::SetStars, Some(3))?;
        assert_eq!(flags(&session), (true, true, false, false));
        assert_eq!(session.stats().card_stats[0].star_rating, 3);
        session.apply("1", CardAction::Retire, None)?;
        assert_eq!(flags(&session), (true, false, false, false));
        session.apply("1", CardAction::Unretire, None)?;
        assert_eq!(flags(&session), (false, false, false, false));
        session.apply("1", CardAction::IncrementPass, None)?;
        session.apply("1", CardAction::ResetStats, None)?;
        assert_eq!(flags(&session), (false, false, false, false));
        Ok(())
    }

    #[test]
    fn test_unknown_card() {
        let mut session = session(&["1"]);
        let err = session
            .apply("2", CardAction::IncrementPass, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "error: card not found in session");
    }

    #[test]
    fn test_viewed_plus_remaining_is_total() -> Fallible<()> {
        let mut session = session(&["1", "2", "3"]);
        let check = |s: &Session| {
            let stats = s.stats();
            assert_eq!(stats.viewed_count + stats.remaining, stats.total_cards);
            assert_eq!(s.viewed_count() + s.remaining(), stats.total_cards);
            assert_eq!(s.viewed_count(), stats.viewed_count);
        };
        for _ in 0..7 {
            draw(&mut session);
            check(&session);
        }
        session.apply("1", CardAction::IncrementPass, None)?;
        check(&session);
        session.apply("2", CardAction::IncrementFail, None)?;
        check(&session);
        session.apply("2", CardAction::ResetStats, None)?;
        check(&session);
        assert_eq!(session.stats().viewed_count, 1);
        Ok(())
    }

    #[test]
    fn test_stats_is_idempotent() -> Fallible<()> {
        let mut session = session(&["1", "2"]);
        draw(&mut session);
        session.apply("1", CardAction::IncrementFail, None)?;
        assert_eq!(session.stats(), session.stats());
        Ok(())
    }

    #[test]
    fn test_reset() -> Fallible<()> {
        let mut session = session(&["1", "2"]);
        draw(&mut session);
        draw(&mut session);
        draw(&mut session);
        session.apply("1", CardAction::IncrementPass, None)?;
        session.reset();
        let stats = session.stats();
        assert_eq!(stats.viewed_count, 0);
        assert_eq!(stats.current_index, 0);
        assert_eq!(stats.served, 0);
        assert_eq!(stats.passes, 0);
        assert!(stats.card_stats.iter().all(|o| !o.viewed));
        Ok(())
    }
}
