use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name the pairing software puts in the opponent slot of a bye.
pub const EXEMPT_NAME: &str = "EXEMPT";

/// One pairing in one round of one tournament, as listed on the results page.
/// Rating and points fields keep the raw page text; parsing into numbers
/// happens when players are aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: String,
    pub tournament_id: u32,
    pub round: u32,
    pub table_num: u32,
    pub player1_name: String,
    pub player1_rating: String,
    pub player1_points: String,
    pub result: String,
    pub raw_result: String,
    pub player2_name: String,
    pub player2_rating: String,
    pub player2_points: String,
    pub finished_at: Option<DateTime<Utc>>,
    pub observed_at: DateTime<Utc>,
}

impl GameRecord {
    /// Stable id for a table across re-fetches of the same round.
    pub fn game_id(tournament_id: u32, round: u32, table_num: u32) -> String {
        format!("{}_{}_{}", tournament_id, round, table_num)
    }

    /// A game is finished once the result cell carries anything other than
    /// the unplayed marker.
    pub fn is_finished(&self) -> bool {
        let trimmed = self.result.trim();
        !trimmed.is_empty() && trimmed != "-"
    }

    /// Score for each player. Unrecognized result text still counts as a
    /// completed game but contributes no points.
    pub fn score(&self) -> (f32, f32) {
        match self.result.replace(' ', "").as_str() {
            "1-0" => (1.0, 0.0),
            "0-1" => (0.0, 1.0),
            "X-X" | "½-½" => (0.5, 0.5),
            "1-0F" | "+/-" => (1.0, 0.0),
            "0-1F" | "-/+" => (0.0, 1.0),
            _ => (0.0, 0.0),
        }
    }

    pub fn formatted_result(&self) -> String {
        format!(
            "{} ({}) {} {} ({})",
            self.player1_name, self.player1_rating, self.result, self.player2_name, self.player2_rating
        )
    }
}

/// A player as they appear in the current round's pairings. Recomputed from
/// the game set every cycle, never stored on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub rating: u32,
    pub points: f32,
}

/// Ratings come with federation suffixes ("2105 F"); keep the digits only.
pub fn parse_rating(raw: &str) -> u32 {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Points-before-round text uses the half-point glyph ("1½", "½").
pub fn parse_points(raw: &str) -> f32 {
    let mut cleaned = raw.replace('½', ".5").replace(' ', "");
    if cleaned.starts_with('.') {
        cleaned.insert(0, '0');
    }
    cleaned.parse().unwrap_or(0.0)
}

/// Bye slots and blank cells never make it into player aggregation.
pub fn is_listed_player(name: &str) -> bool {
    !name.trim().is_empty() && !name.eq_ignore_ascii_case(EXEMPT_NAME)
}

/// Everything extracted from one fetched results page.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundPage {
    pub tournament_name: String,
    pub games: Vec<GameRecord>,
    pub players: Vec<PlayerRecord>,
}

/// Output of one successful fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentSnapshot {
    pub tournament_name: String,
    pub games: Vec<GameRecord>,
    pub players: Vec<PlayerRecord>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
    NetworkError,
    HttpError,
    Error,
}
