use std::collections::HashSet;

use sqlx::sqlite::SqlitePool;

const KEY_TOURNAMENT_ID: &str = "tournament_id";
const KEY_ROUND: &str = "round";

/// Last-used monitoring target and the watched player list. Keys are written
/// independently; nothing here assumes atomicity across them.
#[derive(Clone)]
pub struct PrefsStore {
    pool: SqlitePool,
}

impl PrefsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn last_tournament_id(&self) -> Result<Option<u32>, sqlx::Error> {
        Ok(self.setting(KEY_TOURNAMENT_ID).await?.and_then(|v| v.parse().ok()))
    }

    pub async fn last_round(&self) -> Result<Option<u32>, sqlx::Error> {
        Ok(self.setting(KEY_ROUND).await?.and_then(|v| v.parse().ok()))
    }

    pub async fn save_last_target(&self, tournament_id: u32, round: u32) -> Result<(), sqlx::Error> {
        self.put_setting(KEY_TOURNAMENT_ID, &tournament_id.to_string()).await?;
        self.put_setting(KEY_ROUND, &round.to_string()).await
    }

    pub async fn watch_list(&self) -> Result<HashSet<String>, sqlx::Error> {
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM watch_list")
            .fetch_all(&self.pool)
            .await?;
        Ok(names.into_iter().collect())
    }

    pub async fn add_to_watch_list(&self, name: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO watch_list (name) VALUES (?1) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn remove_from_watch_list(&self, name: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM watch_list WHERE name = ?1")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn setting(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
