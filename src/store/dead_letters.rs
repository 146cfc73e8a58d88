use super::SqliteStore;
use crate::error::StoreResult;
use chrono::Utc;
use rusqlite::params;

/// A parse-task chunk that exhausted its retry budget.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub stream: String,
    pub message_id: String,
    pub payload: Vec<u8>,
    pub reason: String,
    pub attempts: u32,
}

impl SqliteStore {
    pub fn record_dead_letter(&self, letter: &DeadLetter) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO dead_letters (stream, message_id, payload, reason, attempts, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![letter.stream, letter.message_id, letter.payload, letter.reason, letter.attempts, Utc::now()],
        )?;
        Ok(())
    }

    pub fn count_dead_letters(&self, stream: &str) -> StoreResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM dead_letters WHERE stream = ?1",
            params![stream],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dead_letters_accumulate_per_stream() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .record_dead_letter(&DeadLetter {
                stream: "parse_tasks".to_string(),
                message_id: "1-0".to_string(),
                payload: b"chunk".to_vec(),
                reason: "parser panicked".to_string(),
                attempts: 5,
            })
            .unwrap();
        assert_eq!(store.count_dead_letters("parse_tasks").unwrap(), 1);
        assert_eq!(store.count_dead_letters("ingest").unwrap(), 0);
    }
}
