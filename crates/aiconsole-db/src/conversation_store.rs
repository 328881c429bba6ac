use aiconsole_common::{Error, Result};
use rusqlite::Connection;
use rusqlite::params;
use std::path::Path;
use tracing::{info, warn};

/// Completed entries fetched when assembling model context.
pub const DEFAULT_CONTEXT_LIMIT: usize = 7;

/// Completed entries fetched for the history view.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// One logged console turn. `output` stays NULL from the moment the prompt
/// is accepted until the completion succeeds; such pending rows are invisible
/// to context and history queries.
#[derive(Debug, Clone)]
pub struct ConversationEntry {
    pub id: i64,
    pub user_id: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub prompt: String,
    pub model: Option<String>,
    pub output: Option<String>,
}

/// Append-only persistence for console turns.
pub struct ConversationStore {
    conn: Connection,
}

impl ConversationStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("opening conversation store at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        let store = Self { conn };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;

        let store = Self { conn };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS conversation_log (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT,
                    timestamp TEXT NOT NULL,
                    prompt TEXT NOT NULL,
                    model TEXT,
                    output TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_conversation_log_user
                    ON conversation_log(user_id);

                CREATE INDEX IF NOT EXISTS idx_conversation_log_timestamp
                    ON conversation_log(timestamp);",
            )
            .map_err(|e| Error::Database(format!("migration failed: {e}")))?;
        Ok(())
    }

    /// Record a turn before the completion call is made. The entry starts
    /// with NULL output; a crash before `complete_entry` leaves it that way
    /// permanently.
    pub fn append(
        &self,
        user_id: Option<&str>,
        prompt: &str,
        model: Option<&str>,
    ) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO conversation_log (user_id, timestamp, prompt, model)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id, chrono::Utc::now().to_rfc3339(), prompt, model],
            )
            .map_err(|e| Error::Database(format!("failed to append entry: {e}")))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Set the output on a pending entry, completing the turn.
    /// Returns true if the entry was pending and is now complete, false if
    /// it no longer exists or already has output (entries are write-once).
    pub fn complete_entry(&self, entry_id: i64, output: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE conversation_log SET output = ?1 WHERE id = ?2 AND output IS NULL",
                params![output, entry_id],
            )
            .map_err(|e| Error::Database(format!("failed to complete entry: {e}")))?;
        Ok(rows > 0)
    }

    /// Completed entries for a user, most recent first, for context assembly.
    /// `user_id` scoping is NULL-safe: anonymous callers see only anonymous
    /// entries.
    pub fn recent_completed(
        &self,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ConversationEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user_id, timestamp, prompt, model, output
                 FROM conversation_log
                 WHERE user_id IS ?1 AND output IS NOT NULL
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?2",
            )
            .map_err(|e| Error::Database(format!("failed to prepare entry query: {e}")))?;

        let rows = stmt
            .query_map(params![user_id, limit as i64], |row| {
                let timestamp_raw: String = row.get(2)?;
                Ok(ConversationEntry {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    timestamp: parse_timestamp(&timestamp_raw),
                    prompt: row.get(3)?,
                    model: row.get(4)?,
                    output: row.get(5)?,
                })
            })
            .map_err(|e| Error::Database(format!("failed to load entries: {e}")))?;

        let mut entries = Vec::new();
        for row in rows {
            entries
                .push(row.map_err(|e| Error::Database(format!("failed to read entry row: {e}")))?);
        }
        Ok(entries)
    }

    /// Completed entries for the history view, most recent first; callers
    /// reverse to chronological order for display.
    pub fn history(&self, user_id: Option<&str>, limit: usize) -> Result<Vec<ConversationEntry>> {
        self.recent_completed(user_id, limit)
    }
}

fn parse_timestamp(value: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or_else(|e| {
            warn!(
                "failed to parse timestamp '{}': {e}, falling back to now",
                value
            );
            chrono::Utc::now()
        })
}
