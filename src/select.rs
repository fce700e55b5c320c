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

//! Working-set selection. Every function here is pure apart from the random
//! source, which the caller supplies.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::types::card::Card;
use crate::types::strategy::Strategy;

/// The rate assigned to a card that has never been passed.
const NEVER_PASSED_RATE: f64 = 100.0;

/// Chooses and orders the cards for a new session.
///
/// A negative `count` means "every card", as does a count larger than the
/// deck.
pub fn select_working_set<R: Rng + ?Sized>(
    cards: &[Card],
    count: i64,
    strategy: Strategy,
    rng: &mut R,
) -> Vec<Card> {
    let count = if count < 0 {
        cards.len()
    } else {
        (count as usize).min(cards.len())
    };
    match strategy {
        Strategy::Random => select_random(cards, count, rng),
        Strategy::Fails => select_by_rate(cards, count, fail_rate),
        Strategy::Skips => select_by_rate(cards, count, skip_rate),
        Strategy::Worst => select_by_rate(cards, count, worst_rate),
        Strategy::Stars => select_stars(cards, count, rng),
        Strategy::Unrated => select_unrated(cards, count, rng),
        Strategy::AdjustedRandom => select_adjusted_random(cards, count, rng),
    }
}

fn select_random<R: Rng + ?Sized>(cards: &[Card], count: usize, rng: &mut R) -> Vec<Card> {
    let mut cards = cards.to_vec();
    cards.shuffle(rng);
    cards.truncate(count);
    cards
}

/// Ranks cards by a rate, highest first. The sort is stable, so cards with
/// equal rates keep their deck order.
fn select_by_rate(cards: &[Card], count: usize, rate: fn(&Card) -> f64) -> Vec<Card> {
    let mut cards = cards.to_vec();
    cards.sort_by(|a, b| rate(b).total_cmp(&rate(a)));
    cards.truncate(count);
    cards
}

fn ratio(numerator: u64, card: &Card) -> f64 {
    if card.pass_count == 0 {
        NEVER_PASSED_RATE
    } else {
        (numerator as f64 / card.pass_count as f64) * 100.0
    }
}

pub fn fail_rate(card: &Card) -> f64 {
    ratio(card.fail_count.into(), card)
}

pub fn skip_rate(card: &Card) -> f64 {
    ratio(card.skip_count.into(), card)
}

pub fn worst_rate(card: &Card) -> f64 {
    ratio(u64::from(card.fail_count) + u64::from(card.skip_count), card)
}

fn select_stars<R: Rng + ?Sized>(cards: &[Card], count: usize, rng: &mut R) -> Vec<Card> {
    let mut groups: BTreeMap<u8, Vec<Card>> = BTreeMap::new();
    for card in cards {
        groups.entry(card.star_rating).or_default().push(card.clone());
    }
    let mut selected = Vec::with_capacity(count);
    for (_, mut group) in groups.into_iter().rev() {
        let remaining = count - selected.len();
        if remaining == 0 {
            break;
        }
        group.shuffle(rng);
        group.truncate(remaining);
        selected.extend(group);
    }
    selected
}

fn select_unrated<R: Rng + ?Sized>(cards: &[Card], count: usize, rng: &mut R) -> Vec<Card> {
    let (mut unrated, mut rated): (Vec<Card>, Vec<Card>) =
        cards.iter().cloned().partition(|card| card.star_rating == 0);
    unrated.shuffle(rng);
    if unrated.len() >= count {
        unrated.truncate(count);
        return unrated;
    }
    let remaining = count - unrated.len();
    rated.shuffle(rng);
    rated.truncate(remaining);
    unrated.extend(rated);
    unrated
}

/// Baseline of twice the star rating (5 for unrated cards), jittered by up
/// to 2.5 either way, plus up to 2 more for cards failed more often than
/// passed. Highest score first.
fn select_adjusted_random<R: Rng + ?Sized>(
    cards: &[Card],
    count: usize,
    rng: &mut R,
) -> Vec<Card> {
    let mut scored: Vec<(f64, Card)> = cards
        .iter()
        .map(|card| {
            let baseline = if card.star_rating == 0 {
                5.0
            } else {
                card.star_rating as f64 * 2.0
            };
            let jitter = rng.gen_range(-2.5..2.5);
            let extra = if card.fail_count > card.pass_count {
                rng.gen_range(0.0..2.0)
            } else {
                0.0
            };
            (baseline + jitter + extra, card.clone())
        })
        .collect();
    scored.sort_by(|(a, _), (b, _)| b.total_cmp(a));
    scored.truncate(count);
    scored.into_iter().map(|(_, card)| card).collect()
}
