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
use uuid::Uuid;

use crate::types::action::LogAction;
use crate::types::timestamp::Timestamp;

/// One row of the append-only session log.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct SessionLogEntry {
    pub log_id: String,
    pub deck_id: String,
    /// Empty for events that are not about a card.
    pub card_id: String,
    pub session_id: String,
    pub user_id: String,
    pub action: LogAction,
    pub created_at: Timestamp,
}

impl SessionLogEntry {
    /// A new entry stamped with a fresh identifier and the current time.
    pub fn new(
        deck_id: &str,
        card_id: &str,
        session_id: &str,
        user_id: &str,
        action: LogAction,
    ) -> Self {
        Self {
            log_id: Uuid::new_v4().to_string(),
            deck_id: deck_id.to_string(),
            card_id: card_id.to_string(),
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            action,
            created_at: Timestamp::now(),
        }
    }
}
