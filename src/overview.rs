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

//! Accuracy summaries of recent sessions, computed from the session log.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::Fallible;
use crate::repository::SessionLogRepository;
use crate::types::action::LogAction;
use crate::types::session_log::SessionLogEntry;
use crate::types::timestamp::Timestamp;

/// How many sessions an overview covers by default.
pub const DEFAULT_OVERVIEW_SESSIONS: usize = 3;

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct SessionOverview {
    pub session_id: String,
    pub deck_id: String,
    /// Share of cards passed on their first attempt.
    pub percentage: f64,
    /// Share of cards whose last attempt was a pass.
    pub percentage_after: f64,
    /// Distinct cards attempted.
    pub cards: usize,
    /// Attempts recorded, counting retries.
    pub cards_after: usize,
    /// When the session's first entry was written.
    pub timestamp: Timestamp,
}

/// Overviews of a user's most recent sessions, most recent first.
pub fn session_overview(
    logs: &dyn SessionLogRepository,
    user_id: &str,
    deck_id: Option<&str>,
    limit: usize,
) -> Fallible<Vec<SessionOverview>> {
    let session_ids = logs.recent_session_ids(user_id, deck_id, limit)?;
    let mut overviews = Vec::with_capacity(session_ids.len());
    for session_id in session_ids.iter().take(limit) {
        let entries = match logs.entries_for_session(session_id) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Skipping session {session_id} in overview: {e}");
                continue;
            }
        };
        if let Some(overview) = summarize(session_id, &entries) {
            overviews.push(overview);
        }
    }
    Ok(overviews)
}

/// Summarizes one session's entries, which must be in chronological order.
/// Returns `None` if the session has no card attempts.
pub fn summarize(session_id: &str, entries: &[SessionLogEntry]) -> Option<SessionOverview> {
    let first_entry = entries.first()?;
    // Card id to (first attempt, last attempt).
    let mut attempts: HashMap<&str, (LogAction, LogAction)> = HashMap::new();
    let mut flips = 0;
    for entry in entries {
        if entry.action == LogAction::Reshuffle {
            continue;
        }
        attempts
            .entry(entry.card_id.as_str())
            .and_modify(|(_, last)| *last = entry.action)
            .or_insert((entry.action, entry.action));
        flips += 1;
    }
    if attempts.is_empty() {
        return None;
    }
    let cards = attempts.len();
    let initial_passes = attempts
        .values()
        .filter(|(first, _)| *first == LogAction::Pass)
        .count();
    let final_passes = attempts
        .values()
        .filter(|(_, last)| *last == LogAction::Pass)
        .count();
    Some(SessionOverview {
        session_id: session_id.to_string(),
        deck_id: first_entry.deck_id.clone(),
        percentage: percentage(initial_passes, cards),
        percentage_after: percentage(final_passes, cards),
        cards,
        cards_after: flips,
        timestamp: first_entry.created_at,
    })
}

fn percentage(count: usize, total: usize) -> f64 {
    (count as f64 / total as f64) * 100.0
}
