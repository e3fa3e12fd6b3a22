//! Session store.
//!
//! The whole history is one JSON array of [`Session`] records kept under a
//! single key of a [`PersistencePort`].  Array order is display order: the
//! most recently saved session comes first.  Every mutation is a full
//! read-modify-write of that array.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parley_domain::error::{Error, Result};
use parley_domain::trace::TraceEvent;
use parley_domain::turn::{has_user_turn, Turn};

use crate::port::PersistencePort;

/// Characters of the first user turn shown by [`Session::preview`].
const PREVIEW_CHARS: usize = 50;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session record
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A saved snapshot of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub messages: Vec<Turn>,
    /// Milliseconds since the Unix epoch of the last save.
    pub timestamp: i64,
}

impl Session {
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Label for history listings: the first user turn, cut to 50 chars.
    pub fn preview(&self) -> String {
        let Some(first) = self
            .messages
            .iter()
            .find(|t| t.role == parley_domain::Role::User)
        else {
            return "New Chat".into();
        };
        if first.content.chars().count() > PREVIEW_CHARS {
            let head: String = first.content.chars().take(PREVIEW_CHARS).collect();
            format!("{head}...")
        } else {
            first.content.clone()
        }
    }
}

/// Why the stored collection could not be read.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("reading session blob: {0}")]
    Read(#[source] Error),
    #[error("parsing session blob: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("session blob is a JSON {0}, expected an array")]
    NotASequence(&'static str),
}

/// Time source for session timestamps.
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct SessionStore {
    port: Arc<dyn PersistencePort>,
    clock: Clock,
}

impl SessionStore {
    pub fn new(port: Arc<dyn PersistencePort>) -> Self {
        Self {
            port,
            clock: Box::new(Utc::now),
        }
    }

    /// Replace the wall clock (tests use a fixed or stepping clock).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Read the collection, reporting why it could not be read.
    ///
    /// Array elements that are not valid session records are skipped; the
    /// remaining records are returned in stored order.
    pub fn try_list_sessions(&self) -> std::result::Result<Vec<Session>, StoreError> {
        let records = self.read_records()?;

        let mut sessions = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<Session>(record) {
                Ok(s) => sessions.push(s),
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping malformed session record");
                }
            }
        }
        Ok(sessions)
    }

    /// All sessions, most recently saved first.  Unreadable storage is
    /// treated as an empty history.
    pub fn list_sessions(&self) -> Vec<Session> {
        self.try_list_sessions().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "session history unreadable, treating as empty");
            Vec::new()
        })
    }

    pub fn get_session(&self, id: &str) -> Option<Session> {
        self.list_sessions().into_iter().find(|s| s.id == id)
    }

    /// Save `turns` as a session and return its id.
    ///
    /// Without a user turn nothing is written and `existing_id` (or `""`)
    /// is returned.  Otherwise any session with `existing_id` is replaced by
    /// a fresh snapshot at the front of the list; with no id a new one is
    /// minted.  Other stored records are written back untouched, including
    /// ones this version cannot parse.
    pub fn upsert_session(&self, turns: &[Turn], existing_id: Option<&str>) -> Result<String> {
        let existing_id = existing_id.filter(|id| !id.is_empty());

        if !has_user_turn(turns) {
            return Ok(existing_id.unwrap_or_default().to_owned());
        }

        let mut records = self.records_for_update();
        let is_new = match existing_id {
            Some(id) => remove_by_id(&mut records, id) == 0,
            None => true,
        };

        let session = Session {
            id: existing_id.map(str::to_owned).unwrap_or_else(generate_session_id),
            messages: turns.to_vec(),
            timestamp: (self.clock)().timestamp_millis(),
        };
        let id = session.id.clone();
        records.insert(0, serde_json::to_value(&session)?);
        self.persist(&records)?;

        TraceEvent::SessionSaved {
            session_id: id.clone(),
            messages: turns.len(),
            is_new,
        }
        .emit();

        Ok(id)
    }

    /// Remove the session with `id`.  Absent ids are not an error.
    pub fn delete_session(&self, id: &str) -> Result<()> {
        let mut records = self.records_for_update();
        let removed = remove_by_id(&mut records, id);
        self.persist(&records)?;

        TraceEvent::SessionDeleted {
            session_id: id.to_owned(),
            existed: removed > 0,
        }
        .emit();
        Ok(())
    }

    /// Replace the stored collection with an empty one.
    pub fn clear_all(&self) -> Result<()> {
        let removed = self.records_for_update().len();
        self.persist(&[])?;

        TraceEvent::HistoryCleared {
            sessions_removed: removed,
        }
        .emit();
        Ok(())
    }

    // ── Raw records ───────────────────────────────────────────────────

    fn read_records(&self) -> std::result::Result<Vec<serde_json::Value>, StoreError> {
        let Some(raw) = self.port.read().map_err(StoreError::Read)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<serde_json::Value>(&raw)? {
            serde_json::Value::Array(records) => Ok(records),
            other => Err(StoreError::NotASequence(json_kind(&other))),
        }
    }

    /// Stored records for a read-modify-write; an unreadable blob starts
    /// over from an empty collection.
    fn records_for_update(&self) -> Vec<serde_json::Value> {
        self.read_records().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "session history unreadable, rewriting from empty");
            Vec::new()
        })
    }

    fn persist(&self, records: &[serde_json::Value]) -> Result<()> {
        let json = serde_json::to_string(records)
            .map_err(|e| Error::Other(format!("serializing sessions: {e}")))?;
        self.port.write(&json)
    }
}

/// Drop every record whose `id` is `id`; returns how many were removed.
fn remove_by_id(records: &mut Vec<serde_json::Value>, id: &str) -> usize {
    let before = records.len();
    records.retain(|r| r.get("id").and_then(serde_json::Value::as_str) != Some(id));
    before - records.len()
}

/// Time-ordered unique id: 48-bit millisecond timestamp plus random bits.
fn generate_session_id() -> String {
    uuid::Uuid::now_v7().simple().to_string()
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
