use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::types::GameRecord;

/// Index a stored batch by game id for the merge below.
pub fn keyed_by_id(games: Vec<GameRecord>) -> HashMap<String, GameRecord> {
    games.into_iter().map(|g| (g.id.clone(), g)).collect()
}

/// Merge a freshly parsed batch with the previously stored batch for the same
/// round, resolving each record's `finished_at`:
///
/// - finished for the first time (no previous record, or previous was
///   unfinished) → stamped with `now`;
/// - already finished before → the original stamp is carried over unchanged,
///   so repeated fetches of a finished game can never move it;
/// - unfinished in the incoming batch → no stamp, even if one existed before
///   (the source can retract a result and we track what it shows).
///
/// The incoming batch is the new truth for which games exist this round:
/// output preserves it wholesale, and previous records without an incoming
/// counterpart are dropped.
pub fn reconcile(
    previous: &HashMap<String, GameRecord>,
    incoming: Vec<GameRecord>,
    now: DateTime<Utc>,
) -> Vec<GameRecord> {
    incoming
        .into_iter()
        .map(|mut game| {
            game.finished_at = match previous.get(&game.id) {
                _ if !game.is_finished() => None,
                Some(prev) if prev.is_finished() => prev.finished_at,
                _ => Some(now),
            };
            game
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn game(table_num: u32, result: &str) -> GameRecord {
        GameRecord {
            id: GameRecord::game_id(7, 1, table_num),
            tournament_id: 7,
            round: 1,
            table_num,
            player1_name: "DUPONT Pierre".to_string(),
            player1_rating: "2105".to_string(),
            player1_points: "1".to_string(),
            result: result.to_string(),
            raw_result: result.to_string(),
            player2_name: "MARTIN Paul".to_string(),
            player2_rating: "1987".to_string(),
            player2_points: "1".to_string(),
            finished_at: None,
            observed_at: Utc.timestamp_millis_opt(500).unwrap(),
        }
    }

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn first_seen_finished_gets_stamped() {
        let out = reconcile(&HashMap::new(), vec![game(1, "1-0")], at(1000));
        assert_eq!(out[0].finished_at, Some(at(1000)));
    }

    #[test]
    fn first_seen_unfinished_has_no_stamp() {
        let out = reconcile(&HashMap::new(), vec![game(1, "-")], at(1000));
        assert_eq!(out[0].finished_at, None);
    }

    #[test]
    fn transition_stamps_with_current_time() {
        let previous = keyed_by_id(reconcile(&HashMap::new(), vec![game(1, "-")], at(1000)));
        let out = reconcile(&previous, vec![game(1, "1-0")], at(2000));
        assert_eq!(out[0].finished_at, Some(at(2000)));
    }

    #[test]
    fn finish_stamp_never_advances() {
        let previous = keyed_by_id(reconcile(&HashMap::new(), vec![game(1, "1-0")], at(1000)));
        let mut batch = previous;
        for cycle in 2..=5 {
            let out = reconcile(&batch, vec![game(1, "1-0")], at(cycle * 1000));
            assert_eq!(out[0].finished_at, Some(at(1000)));
            batch = keyed_by_id(out);
        }
    }

    #[test]
    fn retraction_clears_the_stamp_and_refinish_restamps() {
        let previous = keyed_by_id(reconcile(&HashMap::new(), vec![game(1, "1-0")], at(1000)));

        let retracted = reconcile(&previous, vec![game(1, "-")], at(2000));
        assert_eq!(retracted[0].finished_at, None);

        let refinished = reconcile(&keyed_by_id(retracted), vec![game(1, "0-1")], at(3000));
        assert_eq!(refinished[0].finished_at, Some(at(3000)));
    }

    #[test]
    fn rows_absent_from_the_latest_fetch_are_dropped() {
        let previous = keyed_by_id(reconcile(
            &HashMap::new(),
            vec![game(1, "1-0"), game(2, "-")],
            at(1000),
        ));
        let out = reconcile(&previous, vec![game(2, "0-1")], at(2000));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "7_1_2");
    }

    #[test]
    fn output_preserves_incoming_order() {
        let incoming = vec![game(3, "-"), game(1, "1-0"), game(2, "½-½")];
        let out = reconcile(&HashMap::new(), incoming, at(1000));
        let tables: Vec<u32> = out.iter().map(|g| g.table_num).collect();
        assert_eq!(tables, vec![3, 1, 2]);
    }
}
