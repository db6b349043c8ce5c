use std::collections::HashSet;

use tracing::{debug, info};

use crate::types::GameRecord;

/// Games that crossed the unfinished → finished boundary on this cycle.
/// `alerts` is the subset involving a watch-listed player; the rest is still
/// recorded in `newly_finished` so the distinction stays observable.
#[derive(Debug, Clone, Default)]
pub struct Transitions {
    pub newly_finished: Vec<GameRecord>,
    pub alerts: Vec<GameRecord>,
}

/// Diff the reconciled batch against the previously known finished set.
///
/// A game appears at most once over its lifetime: once its id enters the
/// finished set, later cycles cannot produce it again (unless the result is
/// retracted and re-finished, which is a genuinely new transition).
pub fn detect(
    previous_finished: &HashSet<String>,
    reconciled: &[GameRecord],
    watch_list: &HashSet<String>,
) -> Transitions {
    let mut transitions = Transitions::default();

    for game in reconciled {
        if !game.is_finished() || previous_finished.contains(&game.id) {
            continue;
        }
        let watched = watch_list.contains(&game.player1_name)
            || watch_list.contains(&game.player2_name);
        if watched {
            info!("finished game with watched player: {}", game.formatted_result());
            transitions.alerts.push(game.clone());
        } else {
            debug!("finished game, no watched players: {}", game.formatted_result());
        }
        transitions.newly_finished.push(game.clone());
    }

    transitions
}
