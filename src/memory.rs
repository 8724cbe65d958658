//! In-process store used when no database is configured, and by tests.
//! Nothing survives a restart.

use std::collections::HashMap;

use axum::async_trait;
use time::{Date, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        repo::{SessionRepo, UserRepo},
        repo_types::{NewUser, Session, User},
    },
    error::AppError,
    journal::{
        repo::EntryRepo,
        repo_types::{EntryFields, JournalEntry},
    },
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    sessions: HashMap<String, Session>,
    entries: HashMap<(Uuid, Date), JournalEntry>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create_user(&self, new: NewUser<'_>) -> Result<User, AppError> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.email == new.email) {
            return Err(AppError::UserExists);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email.to_string(),
            password_hash: new.password_hash.to_string(),
            name: new.name.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl SessionRepo for MemoryStore {
    async fn insert_session(&self, session: &Session) -> Result<(), AppError> {
        let mut t = self.tables.write().await;
        t.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn find_session_user(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> Result<Option<User>, AppError> {
        let t = self.tables.read().await;
        Ok(t.sessions
            .get(token)
            .filter(|s| s.is_live(now))
            .and_then(|s| t.users.get(&s.user_id))
            .cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        self.tables.write().await.sessions.remove(token);
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: OffsetDateTime) -> Result<u64, AppError> {
        let mut t = self.tables.write().await;
        let before = t.sessions.len();
        t.sessions.retain(|_, s| s.is_live(now));
        Ok((before - t.sessions.len()) as u64)
    }
}

#[async_trait]
impl EntryRepo for MemoryStore {
    async fn find_entry(
        &self,
        user_id: Uuid,
        date: Date,
    ) -> Result<Option<JournalEntry>, AppError> {
        let t = self.tables.read().await;
        Ok(t.entries.get(&(user_id, date)).cloned())
    }

    async fn upsert_entry(
        &self,
        user_id: Uuid,
        date: Date,
        fields: &EntryFields,
        now: OffsetDateTime,
    ) -> Result<JournalEntry, AppError> {
        let mut t = self.tables.write().await;
        let entry = t
            .entries
            .entry((user_id, date))
            .and_modify(|e| {
                e.fields = fields.clone();
                e.updated_at = now;
            })
            .or_insert_with(|| JournalEntry {
                id: Uuid::new_v4(),
                user_id,
                date,
                fields: fields.clone(),
                updated_at: now,
            });
        Ok(entry.clone())
    }

    async fn delete_entry(&self, user_id: Uuid, date: Date) -> Result<u64, AppError> {
        let removed = self.tables.write().await.entries.remove(&(user_id, date));
        Ok(u64::from(removed.is_some()))
    }

    async fn list_entry_dates(&self, user_id: Uuid) -> Result<Vec<Date>, AppError> {
        let t = self.tables.read().await;
        let mut dates: Vec<Date> = t
            .entries
            .keys()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, date)| *date)
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        Ok(dates)
    }
}
