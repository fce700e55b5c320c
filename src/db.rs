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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::not_found;
use crate::repository::DeckRepository;
use crate::repository::SessionLogRepository;
use crate::types::action::LogAction;
use crate::types::card::Card;
use crate::types::card::Deck;
use crate::types::session_log::SessionLogEntry;

/// The default cap on the number of session log rows.
pub const DEFAULT_MAX_LOG_ROWS: usize = 50_000;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    max_log_rows: usize,
}

impl Database {
    pub fn new(database_path: &str, max_log_rows: usize) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn, max_log_rows })
    }

    fn acquire(&self) -> Fallible<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ErrorReport::new("database connection lock poisoned"))
    }
}

impl DeckRepository for Database {
    fn deck_with_cards(&self, deck_id: &str) -> Fallible<Deck> {
        let conn = self.acquire()?;
        let sql = "select deck_id, name, last_accessed_at from decks where deck_id = ?;";
        let deck = conn
            .query_row(sql, [deck_id], |row| {
                Ok(Deck {
                    deck_id: row.get(0)?,
                    name: row.get(1)?,
                    last_accessed_at: row.get(2)?,
                    cards: Vec::new(),
                })
            })
            .optional()?;
        let Some(mut deck) = deck else {
            return not_found(format!("deck not found: {deck_id}"));
        };
        let sql = "select card_id, deck_id, front, back, pass_count, fail_count, skip_count, star_rating, retired from cards where deck_id = ? order by rowid;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([deck_id])?;
        while let Some(row) = rows.next()? {
            deck.cards.push(card_from_row(row)?);
        }
        Ok(deck)
    }

    fn update_deck(&self, deck: &Deck) -> Fallible<()> {
        let conn = self.acquire()?;
        let sql = "update decks set name = ?, last_accessed_at = ? where deck_id = ?;";
        let changed = conn.execute(sql, (&deck.name, &deck.last_accessed_at, &deck.deck_id))?;
        if changed == 0 {
            return not_found(format!("deck not found: {}", deck.deck_id));
        }
        Ok(())
    }

    fn card(&self, card_id: &str) -> Fallible<Card> {
        let conn = self.acquire()?;
        let sql = "select card_id, deck_id, front, back, pass_count, fail_count, skip_count, star_rating, retired from cards where card_id = ?;";
        let card = conn.query_row(sql, [card_id], card_from_row).optional()?;
        match card {
            Some(card) => Ok(card),
            None => not_found(format!("card not found: {card_id}")),
        }
    }

    fn update_card(&self, card: &Card) -> Fallible<()> {
        let conn = self.acquire()?;
        let sql = "update cards set front = ?, back = ?, pass_count = ?, fail_count = ?, skip_count = ?, star_rating = ?, retired = ? where card_id = ?;";
        let changed = conn.execute(
            sql,
            (
                &card.front,
                &card.back,
                card.pass_count,
                card.fail_count,
                card.skip_count,
                card.star_rating,
                card.retired,
                &card.card_id,
            ),
        )?;
        if changed == 0 {
            return not_found(format!("card not found: {}", card.card_id));
        }
        Ok(())
    }
}

impl SessionLogRepository for Database {
    fn append(&self, entry: &SessionLogEntry) -> Fallible<()> {
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        insert_log_entry(&tx, entry)?;
        let pruned = prune_log(&tx, self.max_log_rows)?;
        tx.commit()?;
        if pruned > 0 {
            log::debug!("Pruned {pruned} session log entries.");
        }
        Ok(())
    }

    fn entries_for_session(&self, session_id: &str) -> Fallible<Vec<SessionLogEntry>> {
        let conn = self.acquire()?;
        let sql = "select log_id, deck_id, card_id, session_id, user_id, action, created_at from session_logs where session_id = ? order by created_at asc, rowid asc;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([session_id])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(SessionLogEntry {
                log_id: row.get(0)?,
                deck_id: row.get(1)?,
                card_id: row.get(2)?,
                session_id: row.get(3)?,
                user_id: row.get(4)?,
                action: row.get(5)?,
                created_at: row.get(6)?,
            });
        }
        Ok(entries)
    }

    fn recent_session_ids(
        &self,
        user_id: &str,
        deck_id: Option<&str>,
        limit: usize,
    ) -> Fallible<Vec<String>> {
        let conn = self.acquire()?;
        // Reshuffle rows carry no attempt, so they neither qualify a session
        // nor make it more recent.
        let sql = "select session_id from session_logs where user_id = ?1 and (?2 is null or deck_id = ?2) and action != ?4 group by session_id order by max(created_at) desc, max(rowid) desc limit ?3;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query((user_id, deck_id, limit as i64, LogAction::Reshuffle))?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }
        Ok(ids)
    }
}

fn card_from_row(row: &Row) -> rusqlite::Result<Card> {
    Ok(Card {
        card_id: row.get(0)?,
        deck_id: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        pass_count: row.get(4)?,
        fail_count: row.get(5)?,
        skip_count: row.get(6)?,
        star_rating: row.get(7)?,
        retired: row.get(8)?,
    })
}

fn insert_log_entry(tx: &Transaction, entry: &SessionLogEntry) -> Fallible<()> {
    let sql = "insert into session_logs (log_id, deck_id, card_id, session_id, user_id, action, created_at) values (?, ?, ?, ?, ?, ?, ?);";
    tx.execute(
        sql,
        (
            &entry.log_id,
            &entry.deck_id,
            &entry.card_id,
            &entry.session_id,
            &entry.user_id,
            entry.action,
            entry.created_at,
        ),
    )?;
    Ok(())
}

/// Deletes the oldest log entries beyond the cap. Returns how many rows
/// were deleted.
fn prune_log(tx: &Transaction, max_rows: usize) -> Fallible<usize> {
    let count: i64 = tx.query_row("select count(*) from session_logs;", [], |row| row.get(0))?;
    let excess = count - max_rows as i64;
    if excess <= 0 {
        return Ok(0);
    }
    let sql = "delete from session_logs where log_id in (select log_id from session_logs order by created_at asc, rowid asc limit ?);";
    let deleted = tx.execute(sql, [excess])?;
    Ok(deleted)
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["session_logs"], |row| row.get(0))?;
    Ok(count > 0)
}

#[cfg(test)]
impl Database {
    pub fn insert_deck(&self, deck_id: &str, name: &str) -> Fallible<()> {
        let conn = self.acquire()?;
        conn.execute(
            "insert into decks (deck_id, name) values (?, ?);",
            (deck_id, name),
        )?;
        Ok(())
    }

    pub fn insert_card(&self, card: &Card) -> Fallible<()> {
        let conn = self.acquire()?;
        let sql = "insert into cards (card_id, deck_id, front, back, pass_count, fail_count, skip_count, star_rating, retired) values (?, ?, ?, ?, ?, ?, ?, ?, ?);";
        conn.execute(
            sql,
            (
                &card.card_id,
                &card.deck_id,
                &card.front,
                &card.back,
                card.pass_count,
                card.fail_count,
                card.skip_count,
                card.star_rating,
                card.retired,
            ),
        )?;
        Ok(())
    }

    pub fn log_entry_count(&self) -> Fallible<usize> {
        let conn = self.acquire()?;
        let count: i64 = conn.query_row("select count(*) from session_logs;", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::error::ErrorKind;
    use crate::overview::session_overview;
    use crate::types::card::test_card;
    use crate::types::timestamp::Timestamp;

    fn entry(session_id: &str, deck_id: &str, card_id: &str, minute: i64) -> SessionLogEntry {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        SessionLogEntry {
            log_id: format!("{session_id}-{card_id}-{minute}"),
            deck_id: deck_id.to_string(),
            card_id: card_id.to_string(),
            session_id: session_id.to_string(),
            user_id: "user".to_string(),
            action: LogAction::Pass,
            created_at: Timestamp::new(start + Duration::minutes(minute)),
        }
    }

    fn database_with_deck() -> Fallible<Database> {
        let db = Database::new(":memory:", DEFAULT_MAX_LOG_ROWS)?;
        db.insert_deck("deck", "Spanish")?;
        db.insert_card(&test_card("a", 1, 2, 3, 4))?;
        db.insert_card(&test_card("b", 0, 0, 0, 0))?;
        Ok(db)
    }

    #[test]
    fn test_deck_with_cards() -> Fallible<()> {
        let db = database_with_deck()?;
        let deck = db.deck_with_cards("deck")?;
        assert_eq!(deck.name, "Spanish");
        assert_eq!(deck.last_accessed_at, None);
        assert_eq!(deck.cards, vec![test_card("a", 1, 2, 3, 4), test_card("b", 0, 0, 0, 0)]);
        Ok(())
    }

    #[test]
    fn test_missing_deck() -> Fallible<()> {
        let db = database_with_deck()?;
        let err = db.deck_with_cards("nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        Ok(())
    }

    #[test]
    fn test_update_deck() -> Fallible<()> {
        let db = database_with_deck()?;
        let mut deck = db.deck_with_cards("deck")?;
        let now = Timestamp::now();
        deck.last_accessed_at = Some(now);
        db.update_deck(&deck)?;
        let deck = db.deck_with_cards("deck")?;
        assert_eq!(
            deck.last_accessed_at.map(|ts| ts.to_rfc3339()),
            Some(now.to_rfc3339())
        );
        Ok(())
    }

    #[test]
    fn test_update_card() -> Fallible<()> {
        let db = database_with_deck()?;
        let mut card = db.card("b")?;
        card.pass_count = 7;
        card.star_rating = 2;
        card.retired = true;
        db.update_card(&card)?;
        assert_eq!(db.card("b")?, card);
        let err = db.card("zzz").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        Ok(())
    }

    #[test]
    fn test_entries_for_session_are_chronological() -> Fallible<()> {
        let db = database_with_deck()?;
        db.append(&entry("s1", "deck", "b", 5))?;
        db.append(&entry("s1", "deck", "a", 1))?;
        db.append(&entry("s2", "deck", "a", 3))?;
        let entries = db.entries_for_session("s1")?;
        let cards: Vec<&str> = entries.iter().map(|e| e.card_id.as_str()).collect();
        assert_eq!(cards, vec!["a", "b"]);
        assert_eq!(entries[0], entry("s1", "deck", "a", 1));
        Ok(())
    }

    #[test]
    fn test_prune_to_cap() -> Fallible<()> {
        let db = Database::new(":memory:", 3)?;
        for minute in 0..3 {
            db.append(&entry("s", "deck", "a", minute))?;
        }
        assert_eq!(db.log_entry_count()?, 3);
        db.append(&entry("s", "deck", "a", 3))?;
        assert_eq!(db.log_entry_count()?, 3);
        let minutes: Vec<String> = db
            .entries_for_session("s")?
            .into_iter()
            .map(|e| e.log_id)
            .collect();
        assert_eq!(minutes, vec!["s-a-1", "s-a-2", "s-a-3"]);
        Ok(())
    }

    #[test]
    fn test_prune_removes_oldest_not_latest_inserted() -> Fallible<()> {
        let db = Database::new(":memory:", 2)?;
        db.append(&entry("s", "deck", "a", 10))?;
        db.append(&entry("s", "deck", "b", 20))?;
        // Inserted last but created earliest: it is the one evicted.
        db.append(&entry("s", "deck", "c", 0))?;
        let cards: Vec<String> = db
            .entries_for_session("s")?
            .into_iter()
            .map(|e| e.card_id)
            .collect();
        assert_eq!(cards, vec!["a", "b"]);
        Ok(())
    }

    #[test]
    fn test_recent_session_ids() -> Fallible<()> {
        let db = database_with_deck()?;
        db.append(&entry("old", "deck", "a", 0))?;
        db.append(&entry("mid", "other", "a", 1))?;
        db.append(&entry("new", "deck", "a", 2))?;
        // A late entry makes "old" the most recent session.
        db.append(&entry("old", "deck", "b", 3))?;
        db.append(&entry("newest", "deck", "a", 4))?;
        assert_eq!(
            db.recent_session_ids("user", None, 3)?,
            vec!["newest", "old", "new"]
        );
        assert_eq!(
            db.recent_session_ids("user", Some("other"), 3)?,
            vec!["mid"]
        );
        assert!(db.recent_session_ids("someone", None, 3)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_recent_session_ids_ignore_reshuffles() -> Fallible<()> {
        let db = database_with_deck()?;
        db.append(&entry("s1", "deck", "a", 0))?;
        db.append(&entry("s2", "deck", "a", 1))?;
        db.append(&entry("s3", "deck", "a", 2))?;
        // A session that only cycled through the deck.
        let mut reshuffle = entry("s4", "deck", "", 3);
        reshuffle.action = LogAction::Reshuffle;
        db.append(&reshuffle)?;
        // A reshuffle does not make a scored session more recent either.
        let mut reshuffle = entry("s1", "deck", "", 4);
        reshuffle.action = LogAction::Reshuffle;
        db.append(&reshuffle)?;
        assert_eq!(
            db.recent_session_ids("user", None, 3)?,
            vec!["s3", "s2", "s1"]
        );
        let ids: Vec<String> = session_overview(&db, "user", None, 3)?
            .into_iter()
            .map(|overview| overview.session_id)
            .collect();
        assert_eq!(ids, vec!["s3", "s2", "s1"]);
        Ok(())
    }
}
