use crate::models::github::StarEvent;
use crate::models::push::Subscription;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{info, warn};

/// Durable store of push subscriptions, keyed by endpoint URL.
///
/// Backed by SQLite through a sqlx pool; every mutation is committed before
/// the call returns. The pool is cheap to clone and safe to share across
/// handlers.
#[derive(Clone)]
pub struct SubscriptionStore {
    pool: SqlitePool,
}

impl SubscriptionStore {
    /// Open (creating if necessary) the database at `database_url`
    /// (e.g. `sqlite:star_notifier.db`) and run the schema migration.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:");
        let mut options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // In-memory databases exist per connection; a single connection keeps
        // tests looking at the same data.
        let max_connections = if in_memory { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        info!("Database initialized at {}", database_url);
        Ok(store)
    }

    async fn init_schema(&self) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subscriptions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                endpoint TEXT UNIQUE NOT NULL,
                p256dh TEXT NOT NULL,
                auth TEXT NOT NULL,
                user_agent TEXT,
                created_at TEXT NOT NULL,
                last_seen TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_is_active ON subscriptions(is_active)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notifications_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                repo_full_name TEXT NOT NULL,
                sender_login TEXT NOT NULL,
                sender_avatar_url TEXT,
                starred_at TEXT,
                payload TEXT,
                sent_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace a subscription, keyed on endpoint. Re-registering an
    /// existing endpoint overwrites its credentials, refreshes `last_seen` and
    /// reactivates it. Returns the row id.
    pub async fn upsert(
        &self,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
        user_agent: Option<&str>,
    ) -> sqlx::Result<i64> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO subscriptions (endpoint, p256dh, auth, user_agent, created_at, last_seen, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5, 1)
            ON CONFLICT(endpoint) DO UPDATE SET
                p256dh = excluded.p256dh,
                auth = excluded.auth,
                user_agent = excluded.user_agent,
                last_seen = excluded.last_seen,
                is_active = 1
            RETURNING id
            "#,
        )
        .bind(endpoint)
        .bind(p256dh)
        .bind(auth)
        .bind(user_agent)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Hard-delete a subscription. Returns false when no such row existed,
    /// which callers treat as "already gone", not an error.
    pub async fn remove(&self, endpoint: &str) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE endpoint = ?1")
            .bind(endpoint)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_active(&self, endpoint: &str) -> sqlx::Result<Option<Subscription>> {
        sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE endpoint = ?1 AND is_active = 1",
        )
        .bind(endpoint)
        .fetch_optional(&self.pool)
        .await
    }

    /// Snapshot of all active subscriptions. Order is unspecified.
    pub async fn list_active(&self) -> sqlx::Result<Vec<Subscription>> {
        sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE is_active = 1")
            .fetch_all(&self.pool)
            .await
    }

    /// Deactivate a subscription whose endpoint the push service reported as
    /// permanently gone. The row is kept for audit; a second call is a no-op.
    pub async fn mark_inactive(&self, endpoint: &str) -> sqlx::Result<()> {
        sqlx::query("UPDATE subscriptions SET is_active = 0 WHERE endpoint = ?1")
            .bind(endpoint)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn count(&self) -> sqlx::Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await
    }

    /// Audit-log a dispatched star notification. Failures are logged and
    /// swallowed; the audit trail is not worth failing a webhook over.
    ///
    /// Only dispatched notifications are logged: the webhook path skips this
    /// entirely when there are no active subscribers.
    pub async fn log_notification(&self, event: &StarEvent, raw_payload: &[u8]) {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications_log
                (repo_full_name, sender_login, sender_avatar_url, starred_at, payload, sent_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&event.repository.full_name)
        .bind(&event.sender.login)
        .bind(&event.sender.avatar_url)
        .bind(&event.starred_at)
        .bind(String::from_utf8_lossy(raw_payload).into_owned())
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!("⚠️ Failed to write notification log: {}", e);
        }
    }

    /// Audit-log rows as (repo_full_name, sender_login) pairs, newest first.
    pub async fn logged_notifications(&self) -> sqlx::Result<Vec<(String, String)>> {
        sqlx::query_as(
            "SELECT repo_full_name, sender_login FROM notifications_log ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await
    }
}
