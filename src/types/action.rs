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

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::error::ErrorKind;
use crate::error::ErrorReport;

/// Something a learner or the card editor does to a card.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CardAction {
    IncrementFail,
    IncrementPass,
    IncrementSkip,
    SetStars,
    Retire,
    Unretire,
    ResetStats,
}

impl CardAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardAction::IncrementFail => "IncrementFail",
            CardAction::IncrementPass => "IncrementPass",
            CardAction::IncrementSkip => "IncrementSkip",
            CardAction::SetStars => "SetStars",
            CardAction::Retire => "Retire",
            CardAction::Unretire => "Unretire",
            CardAction::ResetStats => "ResetStats",
        }
    }

    /// The log action for scoring actions. Other actions are not logged.
    pub fn log_action(&self) -> Option<LogAction> {
        match self {
            CardAction::IncrementFail => Some(LogAction::Fail),
            CardAction::IncrementPass => Some(LogAction::Pass),
            CardAction::IncrementSkip => Some(LogAction::Skip),
            _ => None,
        }
    }
}

impl TryFrom<&str> for CardAction {
    type Error = ErrorReport;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "IncrementFail" => Ok(CardAction::IncrementFail),
            "IncrementPass" => Ok(CardAction::IncrementPass),
            "IncrementSkip" => Ok(CardAction::IncrementSkip),
            "SetStars" => Ok(CardAction::SetStars),
            "Retire" => Ok(CardAction::Retire),
            "Unretire" => Ok(CardAction::Unretire),
            "ResetStats" => Ok(CardAction::ResetStats),
            _ => Err(ErrorReport::with_kind(
                ErrorKind::InvalidInput,
                format!("invalid card action: {value}"),
            )),
        }
    }
}

/// The action recorded in a session log entry.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LogAction {
    Pass,
    Fail,
    Skip,
    /// The cursor wrapped around and requeued the working set.
    Reshuffle,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::Pass => "IncrementPass",
            LogAction::Fail => "IncrementFail",
            LogAction::Skip => "IncrementSkip",
            LogAction::Reshuffle => "reshuffle",
        }
    }
}

impl TryFrom<&str> for LogAction {
    type Error = ErrorReport;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "IncrementPass" => Ok(LogAction::Pass),
            "IncrementFail" => Ok(LogAction::Fail),
            "IncrementSkip" => Ok(LogAction::Skip),
            "reshuffle" => Ok(LogAction::Reshuffle),
            _ => Err(ErrorReport::new(format!("invalid log action: {value}"))),
        }
    }
}

impl ToSql for LogAction {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for LogAction {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        LogAction::try_from(string.as_str()).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl Serialize for LogAction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}
