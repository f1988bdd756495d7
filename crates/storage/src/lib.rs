use std::{
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use shared::domain::{AnswerMap, Question, SessionId};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

pub mod results;

pub use results::{MemoryResultsHolder, ResultsHolder};

/// Logical slots of the durable questionnaire record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    SessionId,
    Questions,
    Answers,
    CurrentIndex,
}

impl Slot {
    pub const ALL: [Slot; 4] = [
        Slot::SessionId,
        Slot::Questions,
        Slot::Answers,
        Slot::CurrentIndex,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Slot::SessionId => "questionnaire_session_id",
            Slot::Questions => "questionnaire_questions",
            Slot::Answers => "questionnaire_answers",
            Slot::CurrentIndex => "questionnaire_current_index",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Error)]
#[error("durable slot '{slot}' holds unreadable data: {detail}")]
pub struct CorruptSlot {
    pub slot: Slot,
    pub detail: String,
}

/// Raw key-value backend behind [`ProgressStore`].
///
/// Multi-slot operations must be all-or-nothing: a caller never observes a state where
/// only part of `values` was applied.
#[async_trait]
pub trait SlotBackend: Send + Sync {
    async fn read_slot(&self, slot: Slot) -> Result<Option<String>>;
    async fn write_slots(&self, values: &[(Slot, String)]) -> Result<()>;
    /// Removes every slot, then writes `values`.
    async fn reset_slots(&self, values: &[(Slot, String)]) -> Result<()>;
}

#[derive(Clone)]
pub struct SqliteSlotBackend {
    pool: Pool<Sqlite>,
}

impl SqliteSlotBackend {
    pub async fn connect(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);
        // One connection keeps writes serialized and `sqlite::memory:` on a single database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open durable store at '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to migrate durable store")?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }
}

const UPSERT_SLOT: &str = r#"
    INSERT INTO durable_slots (slot, value, updated_at)
    VALUES (?, ?, CURRENT_TIMESTAMP)
    ON CONFLICT(slot) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
"#;

#[async_trait]
impl SlotBackend for SqliteSlotBackend {
    async fn read_slot(&self, slot: Slot) -> Result<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM durable_slots WHERE slot = ?")
                .bind(slot.key())
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("failed to read slot '{slot}'"))?;
        Ok(value)
    }

    async fn write_slots(&self, values: &[(Slot, String)]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (slot, value) in values {
            sqlx::query(UPSERT_SLOT)
                .bind(slot.key())
                .bind(value)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("failed to write slot '{slot}'"))?;
        }
        tx.commit().await.context("failed to commit slot write")?;
        Ok(())
    }

    async fn reset_slots(&self, values: &[(Slot, String)]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM durable_slots")
            .execute(&mut *tx)
            .await
            .context("failed to clear durable slots")?
            .rows_affected();
        for (slot, value) in values {
            sqlx::query(UPSERT_SLOT)
                .bind(slot.key())
                .bind(value)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("failed to write slot '{slot}'"))?;
        }
        tx.commit().await.context("failed to commit slot reset")?;
        debug!(removed, written = values.len(), "durable slots reset");
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySlotBackend {
    slots: Mutex<HashMap<Slot, String>>,
}

#[async_trait]
impl SlotBackend for MemorySlotBackend {
    async fn read_slot(&self, slot: Slot) -> Result<Option<String>> {
        Ok(self.slots.lock().await.get(&slot).cloned())
    }

    async fn write_slots(&self, values: &[(Slot, String)]) -> Result<()> {
        let mut slots = self.slots.lock().await;
        for (slot, value) in values {
            slots.insert(*slot, value.clone());
        }
        Ok(())
    }

    async fn reset_slots(&self, values: &[(Slot, String)]) -> Result<()> {
        let mut slots = self.slots.lock().await;
        slots.clear();
        for (slot, value) in values {
            slots.insert(*slot, value.clone());
        }
        Ok(())
    }
}

/// Everything the durable store knows about the current attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedProgress {
    pub session_id: Option<SessionId>,
    pub questions: Option<Vec<Question>>,
    pub answers: AnswerMap,
    pub current_index: usize,
}

/// Typed view over the four durable slots.
///
/// Session id and index are stored as plain text, questions and answers as JSON.
/// An absent answer slot reads as an empty map and an absent index as `0`.
#[derive(Clone)]
pub struct ProgressStore {
    backend: Arc<dyn SlotBackend>,
}

impl ProgressStore {
    pub async fn open(database_url: &str) -> Result<Self> {
        let backend = SqliteSlotBackend::connect(database_url).await?;
        Ok(Self::with_backend(Arc::new(backend)))
    }

    pub fn in_memory() -> Self {
        Self::with_backend(Arc::new(MemorySlotBackend::default()))
    }

    pub fn with_backend(backend: Arc<dyn SlotBackend>) -> Self {
        Self { backend }
    }

    pub async fn session_id(&self) -> Result<Option<SessionId>> {
        let raw = self.backend.read_slot(Slot::SessionId).await?;
        Ok(raw.filter(|id| !id.is_empty()).map(SessionId))
    }

    pub async fn set_session_id(&self, session_id: &SessionId) -> Result<()> {
        self.backend
            .write_slots(&[(Slot::SessionId, session_id.0.clone())])
            .await
    }

    /// Drops any previous attempt and records `session_id` as the only slot.
    pub async fn start_session(&self, session_id: &SessionId) -> Result<()> {
        self.backend
            .reset_slots(&[(Slot::SessionId, session_id.0.clone())])
            .await
    }

    pub async fn questions(&self) -> Result<Option<Vec<Question>>> {
        match self.backend.read_slot(Slot::Questions).await? {
            Some(raw) => decode(Slot::Questions, &raw).map(Some),
            None => Ok(None),
        }
    }

    pub async fn set_questions(&self, questions: &[Question]) -> Result<()> {
        let encoded = encode(Slot::Questions, &questions)?;
        self.backend
            .write_slots(&[(Slot::Questions, encoded)])
            .await
    }

    /// Caches a freshly fetched question set together with an empty answer map and
    /// index `0`.
    pub async fn begin_questionnaire(&self, questions: &[Question]) -> Result<()> {
        let values = [
            (Slot::Questions, encode(Slot::Questions, &questions)?),
            (Slot::Answers, encode(Slot::Answers, &AnswerMap::new())?),
            (Slot::CurrentIndex, 0.to_string()),
        ];
        self.backend.write_slots(&values).await
    }

    pub async fn answers(&self) -> Result<AnswerMap> {
        match self.backend.read_slot(Slot::Answers).await? {
            Some(raw) => decode(Slot::Answers, &raw),
            None => Ok(AnswerMap::new()),
        }
    }

    pub async fn set_answers(&self, answers: &AnswerMap) -> Result<()> {
        let encoded = encode(Slot::Answers, answers)?;
        self.backend.write_slots(&[(Slot::Answers, encoded)]).await
    }

    pub async fn current_index(&self) -> Result<usize> {
        match self.backend.read_slot(Slot::CurrentIndex).await? {
            Some(raw) => raw.trim().parse::<usize>().map_err(|err| {
                CorruptSlot {
                    slot: Slot::CurrentIndex,
                    detail: err.to_string(),
                }
                .into()
            }),
            None => Ok(0),
        }
    }

    pub async fn set_current_index(&self, index: usize) -> Result<()> {
        self.backend
            .write_slots(&[(Slot::CurrentIndex, index.to_string())])
            .await
    }

    /// Writes answers and index together.
    pub async fn save_progress(&self, answers: &AnswerMap, index: usize) -> Result<()> {
        let values = [
            (Slot::Answers, encode(Slot::Answers, answers)?),
            (Slot::CurrentIndex, index.to_string()),
        ];
        self.backend.write_slots(&values).await
    }

    pub async fn snapshot(&self) -> Result<CachedProgress> {
        Ok(CachedProgress {
            session_id: self.session_id().await?,
            questions: self.questions().await?,
            answers: self.answers().await?,
            current_index: self.current_index().await?,
        })
    }

    pub async fn clear(&self) -> Result<()> {
        self.backend.reset_slots(&[]).await
    }
}

fn encode<T: Serialize + ?Sized>(slot: Slot, value: &T) -> Result<String> {
    serde_json::to_string(value).with_context(|| format!("failed to encode slot '{slot}'"))
}

fn decode<T: DeserializeOwned>(slot: Slot, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|err| {
        CorruptSlot {
            slot,
            detail: err.to_string(),
        }
        .into()
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
