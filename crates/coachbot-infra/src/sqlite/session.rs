//! SQLite session repository implementation.
//!
//! Implements `SessionRepository` from `coachbot-core` using sqlx with split
//! read/write pools. Timestamps are stored as fixed-width RFC 3339 strings
//! (UTC, microseconds) so that text comparison matches time order.

use chrono::{DateTime, SecondsFormat, Utc};
use coachbot_core::session::repository::SessionRepository;
use coachbot_types::error::RepositoryError;
use coachbot_types::session::{ChatId, Session, ThreadId};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionRepository`.
pub struct SqliteSessionRepository {
    pool: DatabasePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to a domain `Session`.
struct SessionRow {
    chat_id: String,
    thread_id: String,
    created_at: String,
    last_interaction_at: Option<String>,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            chat_id: row.try_get("chat_id")?,
            thread_id: row.try_get("thread_id")?,
            created_at: row.try_get("created_at")?,
            last_interaction_at: row.try_get("last_interaction_at")?,
        })
    }

    fn into_session(self) -> Result<Session, RepositoryError> {
        let created_at = parse_datetime(&self.created_at)?;
        let last_interaction_at = match self.last_interaction_at.as_deref() {
            Some(s) => parse_datetime(s)?,
            None => created_at,
        };

        Ok(Session {
            chat_id: ChatId(self.chat_id),
            thread_id: ThreadId(self.thread_id),
            created_at,
            last_interaction_at,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl SessionRepository for SqliteSessionRepository {
    async fn get_session(&self, chat_id: &ChatId) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query(
            "SELECT chat_id, thread_id, created_at, last_interaction_at FROM sessions WHERE chat_id = ?",
        )
        .bind(chat_id.as_str())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let session_row =
                    SessionRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn insert_session(&self, session: &Session) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"INSERT INTO sessions (chat_id, thread_id, created_at, last_interaction_at)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(session.chat_id.as_str())
        .bind(session.thread_id.as_str())
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.last_interaction_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                Err(RepositoryError::Conflict(format!(
                    "chat '{}' already has a session",
                    session.chat_id
                )))
            }
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn update_last_interaction(
        &self,
        chat_id: &ChatId,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        // Scalar MAX keeps the column monotonic while still matching the row,
        // so rows_affected distinguishes "no session" from "not newer".
        let result = sqlx::query(
            r#"UPDATE sessions
               SET last_interaction_at = MAX(COALESCE(last_interaction_at, created_at), ?)
               WHERE chat_id = ?"#,
        )
        .bind(format_datetime(&at))
        .bind(chat_id.as_str())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT chat_id, thread_id, created_at, last_interaction_at FROM sessions ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                SessionRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_session()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn session(chat: &str, thread: &str) -> Session {
        Session::new(ChatId::new(chat), ThreadId::new(thread), at())
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = SqliteSessionRepository::new(test_pool().await);
        let s = session("42", "thread_abc");
        repo.insert_session(&s).await.unwrap();

        let loaded = repo.get_session(&ChatId::new("42")).await.unwrap().unwrap();
        assert_eq!(loaded, s);
        assert!(repo.get_session(&ChatId::new("7")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_conflict_and_keeps_thread() {
        let repo = SqliteSessionRepository::new(test_pool().await);
        repo.insert_session(&session("42", "thread_first"))
            .await
            .unwrap();

        let err = repo
            .insert_session(&session("42", "thread_second"))
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(_)));
        let loaded = repo.get_session(&ChatId::new("42")).await.unwrap().unwrap();
        assert_eq!(loaded.thread_id, ThreadId::new("thread_first"));
    }

    #[tokio::test]
    async fn test_update_last_interaction_is_monotonic() {
        let repo = SqliteSessionRepository::new(test_pool().await);
        let chat = ChatId::new("42");
        repo.insert_session(&session("42", "t")).await.unwrap();

        let later = at() + Duration::hours(3);
        assert!(repo.update_last_interaction(&chat, later).await.unwrap());
        // Older timestamp still matches the row but does not move it back.
        assert!(
            repo.update_last_interaction(&chat, at() + Duration::hours(1))
                .await
                .unwrap()
        );

        let loaded = repo.get_session(&chat).await.unwrap().unwrap();
        assert_eq!(loaded.last_interaction_at, later);
        assert_eq!(loaded.created_at, at());
    }

    #[tokio::test]
    async fn test_update_unknown_chat_returns_false() {
        let repo = SqliteSessionRepository::new(test_pool().await);
        assert!(
            !repo
                .update_last_interaction(&ChatId::new("ghost"), at())
                .await
                .unwrap()
        );
        assert!(repo.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sub_second_precision_round_trips() {
        let repo = SqliteSessionRepository::new(test_pool().await);
        let chat = ChatId::new("42");
        repo.insert_session(&session("42", "t")).await.unwrap();

        let precise = at() + Duration::microseconds(123_456);
        repo.update_last_interaction(&chat, precise).await.unwrap();

        let loaded = repo.get_session(&chat).await.unwrap().unwrap();
        assert_eq!(loaded.last_interaction_at, precise);
    }

    #[tokio::test]
    async fn test_list_sessions() {
        let repo = SqliteSessionRepository::new(test_pool().await);
        repo.insert_session(&session("1", "t1")).await.unwrap();
        repo.insert_session(&session("2", "t2")).await.unwrap();

        let mut chats: Vec<String> = repo
            .list_sessions()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.chat_id.0)
            .collect();
        chats.sort();
        assert_eq!(chats, vec!["1", "2"]);
    }
}
