use std::collections::HashSet;

use tracing::info;

use crate::types::GameRecord;

/// Receives the finished games computed by the transition detector. Delivery
/// and any further de-duplication are the sink's concern; the monitor hands
/// each event over exactly once.
pub trait NotificationSink: Send + Sync {
    fn game_finished(&self, game: &GameRecord, watch_list: &HashSet<String>);
}

/// Default sink: structured log lines, one per event.
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn game_finished(&self, game: &GameRecord, watch_list: &HashSet<String>) {
        let watched: Vec<&str> = [game.player1_name.as_str(), game.player2_name.as_str()]
            .into_iter()
            .filter(|name| watch_list.contains(*name))
            .collect();
        info!(
            "game finished [{}]: {}",
            watched.join(", "),
            game.formatted_result()
        );
    }
}
