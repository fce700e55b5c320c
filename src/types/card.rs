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

use serde::Serialize;

use crate::error::Fallible;
use crate::error::invalid;
use crate::types::action::CardAction;
use crate::types::timestamp::Timestamp;

/// A flashcard as stored by the deck repository. The session engine only
/// reads the counters and the rating.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Card {
    pub card_id: String,
    pub deck_id: String,
    pub front: String,
    pub back: String,
    pub pass_count: u32,
    pub fail_count: u32,
    pub skip_count: u32,
    /// Zero means unrated.
    pub star_rating: u8,
    pub retired: bool,
}

impl Card {
    /// Applies a card action to the persistent counters. This is the
    /// caller-side counterpart to recording the outcome in a session.
    pub fn apply(&mut self, action: CardAction, value: Option<u8>) -> Fallible<()> {
        match action {
            CardAction::IncrementFail => self.fail_count += 1,
            CardAction::IncrementPass => self.pass_count += 1,
            CardAction::IncrementSkip => self.skip_count += 1,
            CardAction::SetStars => match value {
                Some(stars) => self.star_rating = stars,
                None => return invalid("star rating value is required"),
            },
            CardAction::Retire => self.retired = true,
            CardAction::Unretire => self.retired = false,
            CardAction::ResetStats => {
                self.pass_count = 0;
                self.fail_count = 0;
                self.skip_count = 0;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Deck {
    pub deck_id: String,
    pub name: String,
    pub last_accessed_at: Option<Timestamp>,
    pub cards: Vec<Card>,
}

#[cfg(test)]
pub fn test_card(card_id: &str, pass: u32, fail: u32, skip: u32, stars: u8) -> Card {
    Card {
        card_id: card_id.to_string(),
        deck_id: "deck".to_string(),
        front: format!("front of {card_id}"),
        back: format!("back of {card_id}"),
        pass_count: pass,
        fail_count: fail,
        skip_count: skip,
        star_rating: stars,
        retired: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_apply_counters() -> Fallible<()> {
        let mut card = test_card("a", 1, 1, 1, 0);
        card.apply(CardAction::IncrementPass, None)?;
        card.apply(CardAction::IncrementFail, None)?;
        card.apply(CardAction::IncrementFail, None)?;
        card.apply(CardAction::IncrementSkip, None)?;
        assert_eq!((card.pass_count, card.fail_count, card.skip_count), (2, 3, 2));
        card.apply(CardAction::ResetStats, None)?;
        assert_eq!((card.pass_count, card.fail_count, card.skip_count), (0, 0, 0));
        Ok(())
    }

    #[test]
    fn test_apply_retire() -> Fallible<()> {
        let mut card = test_card("a", 0, 0, 0, 0);
        card.apply(CardAction::Retire, None)?;
        assert!(card.retired);
        card.apply(CardAction::Unretire, None)?;
        assert!(!card.retired);
        Ok(())
    }

    #[test]
    fn test_set_stars_requires_value() -> Fallible<()> {
        let mut card = test_card("a", 0, 0, 0, 0);
        let err = card.apply(CardAction::SetStars, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        card.apply(CardAction::SetStars, Some(4))?;
        assert_eq!(card.star_rating, 4);
        Ok(())
    }
}
