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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::ErrorKind;

/// How the working set of a session is chosen from a deck.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Strategy {
    /// Uniform shuffle.
    Random,
    /// Highest fail-to-pass ratio first.
    Fails,
    /// Highest skip-to-pass ratio first.
    Skips,
    /// Highest (fail + skip)-to-pass ratio first.
    Worst,
    /// Highest star rating first, shuffled within each rating.
    Stars,
    /// Unrated cards first, then rated ones.
    Unrated,
    /// Star-weighted score with random jitter.
    AdjustedRandom,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Random => "Random",
            Strategy::Fails => "Fails",
            Strategy::Skips => "Skips",
            Strategy::Worst => "Worst",
            Strategy::Stars => "Stars",
            Strategy::Unrated => "Unrated",
            Strategy::AdjustedRandom => "AdjustedRandom",
        }
    }
}

impl TryFrom<&str> for Strategy {
    type Error = ErrorReport;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Random" => Ok(Strategy::Random),
            "Fails" => Ok(Strategy::Fails),
            "Skips" => Ok(Strategy::Skips),
            "Worst" => Ok(Strategy::Worst),
            "Stars" => Ok(Strategy::Stars),
            "Unrated" => Ok(Strategy::Unrated),
            // Older clients send the lowercase spelling.
            "AdjustedRandom" | "Adjustedrandom" => Ok(Strategy::AdjustedRandom),
            _ => Err(ErrorReport::with_kind(
                ErrorKind::InvalidInput,
                format!("invalid session method: {value}"),
            )),
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Strategy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}
