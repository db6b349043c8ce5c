use std::cmp::Ordering;

use crate::types::{is_listed_player, parse_points, parse_rating, GameRecord, PlayerRecord};

/// Derive the ranked player list from the current game set.
///
/// Players are deduplicated by name across both slots of every game; the
/// rating and points-before-round values seen at the *first* encounter win,
/// matching the upstream page's own convention. Ranking is points descending,
/// rating descending on ties, stable otherwise.
pub fn rank(games: &[GameRecord]) -> Vec<PlayerRecord> {
    let mut players: Vec<PlayerRecord> = Vec::new();
    for game in games {
        collect_player(&mut players, &game.player1_name, &game.player1_rating, &game.player1_points);
        collect_player(&mut players, &game.player2_name, &game.player2_rating, &game.player2_points);
    }
    players.sort_by(|a, b| {
        b.points
            .partial_cmp(&a.points)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.rating.cmp(&a.rating))
    });
    players
}

fn collect_player(players: &mut Vec<PlayerRecord>, name: &str, rating: &str, points: &str) {
    if !is_listed_player(name) {
        return;
    }
    if players.iter().any(|p| p.name == name) {
        // First encounter wins; later rows for the same name are ignored.
        return;
    }
    players.push(PlayerRecord {
        name: name.to_string(),
        rating: parse_rating(rating),
        points: parse_points(points),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn game(table_num: u32, p1: (&str, &str, &str), p2: (&str, &str, &str)) -> GameRecord {
        GameRecord {
            id: GameRecord::game_id(1, 1, table_num),
            tournament_id: 1,
            round: 1,
            table_num,
            player1_name: p1.0.to_string(),
            player1_rating: p1.1.to_string(),
            player1_points: p1.2.to_string(),
            result: "-".to_string(),
            raw_result: "-".to_string(),
            player2_name: p2.0.to_string(),
            player2_rating: p2.1.to_string(),
            player2_points: p2.2.to_string(),
            finished_at: None,
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn ranks_by_points_then_rating() {
        let games = vec![
            game(1, ("DUPONT Pierre", "2105", "2"), ("MARTIN Paul", "1987", "1½")),
            game(2, ("BERNARD Luc", "1890", "1½"), ("PETIT Anne", "2200", "1½")),
        ];
        let ranked = rank(&games);
        let names: Vec<&str> = ranked.iter().map(|p| p.name.as_str()).collect();
        // 2 points first; the three on 1.5 are ordered by rating descending.
        assert_eq!(
            names,
            vec!["DUPONT Pierre", "PETIT Anne", "MARTIN Paul", "BERNARD Luc"]
        );
    }

    #[test]
    fn first_encounter_wins_on_duplicate_rows() {
        let games = vec![
            game(1, ("DUPONT Pierre", "2105", "2"), ("MARTIN Paul", "1987", "0")),
            game(2, ("DUPONT Pierre", "9999", "5"), ("PETIT Anne", "1700", "0")),
        ];
        let ranked = rank(&games);
        let dupont = ranked.iter().find(|p| p.name == "DUPONT Pierre").unwrap();
        assert_eq!(dupont.rating, 2105);
        assert_eq!(dupont.points, 2.0);
    }

    #[test]
    fn exempt_and_blank_slots_are_excluded() {
        let games = vec![
            game(1, ("MOREAU Jean", "1600", "½"), ("EXEMPT", "", "")),
            game(2, ("", "", ""), ("PETIT Anne", "1700", "1")),
        ];
        let ranked = rank(&games);
        let names: Vec<&str> = ranked.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["PETIT Anne", "MOREAU Jean"]);
    }

    #[test]
    fn ranking_is_deterministic() {
        let games = vec![
            game(1, ("DUPONT Pierre", "2105", "1"), ("MARTIN Paul", "1987", "1")),
            game(2, ("BERNARD Luc", "1890", "1"), ("PETIT Anne", "1750", "1")),
        ];
        assert_eq!(rank(&games), rank(&games));
    }
}
