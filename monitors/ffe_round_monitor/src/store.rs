use chrono::DateTime;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::debug;

use crate::types::GameRecord;

const CREATE_GAMES: &str = "\
CREATE TABLE IF NOT EXISTS games (
    id TEXT PRIMARY KEY,
    tournament_id INTEGER NOT NULL,
    round INTEGER NOT NULL,
    table_num INTEGER NOT NULL,
    player1_name TEXT NOT NULL,
    player1_rating TEXT NOT NULL,
    player1_points TEXT NOT NULL,
    result TEXT NOT NULL,
    raw_result TEXT NOT NULL,
    player2_name TEXT NOT NULL,
    player2_rating TEXT NOT NULL,
    player2_points TEXT NOT NULL,
    finished_at INTEGER,
    observed_at INTEGER NOT NULL
)";

const CREATE_SETTINGS: &str = "\
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";

const CREATE_WATCH_LIST: &str = "\
CREATE TABLE IF NOT EXISTS watch_list (
    name TEXT PRIMARY KEY
)";

/// Open (creating if needed) the monitor database and apply the schema.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePool::connect(database_url).await?;
    sqlx::query(CREATE_GAMES).execute(&pool).await?;
    sqlx::query(CREATE_SETTINGS).execute(&pool).await?;
    sqlx::query(CREATE_WATCH_LIST).execute(&pool).await?;
    Ok(pool)
}

/// Batch storage for game records, keyed by (tournament, round). The batch
/// for a key is only ever replaced wholesale, inside one transaction.
#[derive(Clone)]
pub struct GameStore {
    pool: SqlitePool,
}

impl GameStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Most-recent-first view: finished games by their finish time, the rest
    /// by last observation.
    pub async fn games_for_round(
        &self,
        tournament_id: u32,
        round: u32,
    ) -> Result<Vec<GameRecord>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, tournament_id, round, table_num, \
                    player1_name, player1_rating, player1_points, \
                    result, raw_result, \
                    player2_name, player2_rating, player2_points, \
                    finished_at, observed_at \
             FROM games WHERE tournament_id = ?1 AND round = ?2 \
             ORDER BY COALESCE(finished_at, observed_at) DESC",
        )
        .bind(tournament_id)
        .bind(round)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(game_from_row).collect()
    }

    pub async fn replace_round(
        &self,
        tournament_id: u32,
        round: u32,
        games: &[GameRecord],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM games WHERE tournament_id = ?1 AND round = ?2")
            .bind(tournament_id)
            .bind(round)
            .execute(&mut *tx)
            .await?;

        for game in games {
            sqlx::query(
                "INSERT INTO games (id, tournament_id, round, table_num, \
                                    player1_name, player1_rating, player1_points, \
                                    result, raw_result, \
                                    player2_name, player2_rating, player2_points, \
                                    finished_at, observed_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            )
            .bind(&game.id)
            .bind(game.tournament_id)
            .bind(game.round)
            .bind(game.table_num)
            .bind(&game.player1_name)
            .bind(&game.player1_rating)
            .bind(&game.player1_points)
            .bind(&game.result)
            .bind(&game.raw_result)
            .bind(&game.player2_name)
            .bind(&game.player2_rating)
            .bind(&game.player2_points)
            .bind(game.finished_at.map(|t| t.timestamp_millis()))
            .bind(game.observed_at.timestamp_millis())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(
            "stored {} games for tournament {} round {}",
            games.len(),
            tournament_id,
            round
        );
        Ok(())
    }

    pub async fn count_for_round(&self, tournament_id: u32, round: u32) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM games WHERE tournament_id = ?1 AND round = ?2",
        )
        .bind(tournament_id)
        .bind(round)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn clear_round(&self, tournament_id: u32, round: u32) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM games WHERE tournament_id = ?1 AND round = ?2")
            .bind(tournament_id)
            .bind(round)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn game_from_row(row: &SqliteRow) -> Result<GameRecord, sqlx::Error> {
    let finished_at: Option<i64> = row.try_get("finished_at")?;
    let observed_at: i64 = row.try_get("observed_at")?;
    Ok(GameRecord {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        round: row.try_get("round")?,
        table_num: row.try_get("table_num")?,
        player1_name: row.try_get("player1_name")?,
        player1_rating: row.try_get("player1_rating")?,
        player1_points: row.try_get("player1_points")?,
        result: row.try_get("result")?,
        raw_result: row.try_get("raw_result")?,
        player2_name: row.try_get("player2_name")?,
        player2_rating: row.try_get("player2_rating")?,
        player2_points: row.try_get("player2_points")?,
        finished_at: finished_at.and_then(DateTime::from_timestamp_millis),
        observed_at: DateTime::from_timestamp_millis(observed_at).unwrap_or_default(),
    })
}
