use anyhow::Context;
use axum::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
    auth::{
        repo::{SessionRepo, UserRepo},
        repo_types::{NewUser, Session, User},
    },
    config::AppConfig,
    error::AppError,
    journal::{
        repo::EntryRepo,
        repo_types::{EntryFields, JournalEntry},
    },
};

const ENTRY_COLUMNS: &str = r#"
    id, user_id, entry_date,
    morning_gratitude1, morning_gratitude2, morning_gratitude3,
    morning_intention, morning_prayer,
    evening_reflection1, evening_reflection2, evening_reflection3,
    evening_learning, evening_gratitude, updated_at
"#;

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pub pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let url = config
            .database_url
            .as_deref()
            .context("DATABASE_URL is not set")?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl UserRepo for PgStore {
    async fn create_user(&self, new: NewUser<'_>) -> Result<User, AppError> {
        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.name)
        .fetch_one(&self.pool)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::UserExists),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl SessionRepo for PgStore {
    async fn insert_session(&self, session: &Session) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_session_user(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.name, u.created_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = $1 AND s.expires_at > $2
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: OffsetDateTime) -> Result<u64, AppError> {
        let res = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}

#[async_trait]
impl EntryRepo for PgStore {
    async fn find_entry(
        &self,
        user_id: Uuid,
        date: Date,
    ) -> Result<Option<JournalEntry>, AppError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE user_id = $1 AND entry_date = $2"
        );
        let entry = sqlx::query_as::<_, JournalEntry>(&sql)
            .bind(user_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(entry)
    }

    async fn upsert_entry(
        &self,
        user_id: Uuid,
        date: Date,
        fields: &EntryFields,
        now: OffsetDateTime,
    ) -> Result<JournalEntry, AppError> {
        // The conflict branch leaves `id` untouched, so a re-save keeps the first id.
        let sql = format!(
            r#"
            INSERT INTO journal_entries (
                id, user_id, entry_date,
                morning_gratitude1, morning_gratitude2, morning_gratitude3,
                morning_intention, morning_prayer,
                evening_reflection1, evening_reflection2, evening_reflection3,
                evening_learning, evening_gratitude, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (user_id, entry_date) DO UPDATE SET
                morning_gratitude1  = EXCLUDED.morning_gratitude1,
                morning_gratitude2  = EXCLUDED.morning_gratitude2,
                morning_gratitude3  = EXCLUDED.morning_gratitude3,
                morning_intention   = EXCLUDED.morning_intention,
                morning_prayer      = EXCLUDED.morning_prayer,
                evening_reflection1 = EXCLUDED.evening_reflection1,
                evening_reflection2 = EXCLUDED.evening_reflection2,
                evening_reflection3 = EXCLUDED.evening_reflection3,
                evening_learning    = EXCLUDED.evening_learning,
                evening_gratitude   = EXCLUDED.evening_gratitude,
                updated_at          = EXCLUDED.updated_at
            RETURNING {ENTRY_COLUMNS}
            "#
        );
        let entry = sqlx::query_as::<_, JournalEntry>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(date)
            .bind(&fields.morning_gratitude1)
            .bind(&fields.morning_gratitude2)
            .bind(&fields.morning_gratitude3)
            .bind(&fields.morning_intention)
            .bind(&fields.morning_prayer)
            .bind(&fields.evening_reflection1)
            .bind(&fields.evening_reflection2)
            .bind(&fields.evening_reflection3)
            .bind(&fields.evening_learning)
            .bind(&fields.evening_gratitude)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;
        Ok(entry)
    }

    async fn delete_entry(&self, user_id: Uuid, date: Date) -> Result<u64, AppError> {
        let res = sqlx::query("DELETE FROM journal_entries WHERE user_id = $1 AND entry_date = $2")
            .bind(user_id)
            .bind(date)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    async fn list_entry_dates(&self, user_id: Uuid) -> Result<Vec<Date>, AppError> {
        let dates = sqlx::query_scalar::<_, Date>(
            r#"
            SELECT entry_date
            FROM journal_entries
            WHERE user_id = $1
            ORDER BY entry_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(dates)
    }
}

/// These run against a live Postgres when `DATABASE_URL` is set and are
/// skipped otherwise.
#[cfg(test)]
mod tests {
    use super::*;
    use time::{macros::date, Duration};

    async fn store() -> Option<PgStore> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect to DATABASE_URL");
        let store = PgStore { pool };
        store.migrate().await.expect("migrate");
        Some(store)
    }

    async fn seed_user(store: &PgStore) -> User {
        let email = format!("{}@db-test.local", Uuid::new_v4());
        store
            .create_user(NewUser {
                email: &email,
                password_hash: "x",
                name: "Ann",
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_is_user_exists() {
        let Some(store) = store().await else { return };
        let user = seed_user(&store).await;
        let err = store
            .create_user(NewUser {
                email: &user.email,
                password_hash: "y",
                name: "Other",
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserExists));
    }

    #[tokio::test]
    async fn upsert_keeps_one_row_and_its_id() {
        let Some(store) = store().await else { return };
        let user = seed_user(&store).await;
        let day = date!(2024 - 01 - 01);

        let first = EntryFields {
            morning_gratitude1: Some("sun".into()),
            evening_learning: Some("patience".into()),
            ..Default::default()
        };
        let saved = store
            .upsert_entry(user.id, day, &first, OffsetDateTime::now_utc())
            .await
            .unwrap();

        let second = EntryFields {
            morning_gratitude1: Some("rain".into()),
            ..Default::default()
        };
        let resaved = store
            .upsert_entry(user.id, day, &second, OffsetDateTime::now_utc())
            .await
            .unwrap();

        assert_eq!(resaved.id, saved.id);
        assert_eq!(resaved.fields.morning_gratitude1.as_deref(), Some("rain"));
        assert_eq!(resaved.fields.evening_learning, None);

        let found = store.find_entry(user.id, day).await.unwrap().unwrap();
        assert_eq!(found.id, saved.id);
        assert_eq!(store.list_entry_dates(user.id).await.unwrap(), vec![day]);

        assert_eq!(store.delete_entry(user.id, day).await.unwrap(), 1);
        assert_eq!(store.delete_entry(user.id, day).await.unwrap(), 0);
        assert!(store.find_entry(user.id, day).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dates_come_back_newest_first() {
        let Some(store) = store().await else { return };
        let user = seed_user(&store).await;
        let fields = EntryFields::default();
        for day in [
            date!(2024 - 01 - 02),
            date!(2023 - 12 - 31),
            date!(2024 - 03 - 01),
        ] {
            store
                .upsert_entry(user.id, day, &fields, OffsetDateTime::now_utc())
                .await
                .unwrap();
        }

        assert_eq!(
            store.list_entry_dates(user.id).await.unwrap(),
            vec![date!(2024 - 03 - 01), date!(2024 - 01 - 02), date!(2023 - 12 - 31)]
        );
    }

    #[tokio::test]
    async fn expired_sessions_do_not_resolve() {
        let Some(store) = store().await else { return };
        let user = seed_user(&store).await;
        let live = Session::issue(user.id, Duration::days(7)).unwrap();
        let stale = Session::issue(user.id, Duration::hours(-1)).unwrap();
        store.insert_session(&live).await.unwrap();
        store.insert_session(&stale).await.unwrap();

        let now = OffsetDateTime::now_utc();
        let owner = store.find_session_user(&live.id, now).await.unwrap().unwrap();
        assert_eq!(owner.id, user.id);
        assert!(store.find_session_user(&stale.id, now).await.unwrap().is_none());

        assert!(store.delete_expired_sessions(now).await.unwrap() >= 1);
        store.delete_session(&live.id).await.unwrap();
        assert!(store.find_session_user(&live.id, now).await.unwrap().is_none());
    }
}
