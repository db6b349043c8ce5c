use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::fetch::{CycleError, PageFetcher};
use crate::notify::NotificationSink;
use crate::page_parser::parse_round_page;
use crate::prefs::PrefsStore;
use crate::reconcile::{keyed_by_id, reconcile};
use crate::standings;
use crate::store::GameStore;
use crate::transitions::{self, Transitions};
use crate::types::TournamentSnapshot;

/// What one successful cycle produced.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub snapshot: TournamentSnapshot,
    pub transitions: Transitions,
}

/// Drives one (tournament, round) target: fetch, parse, reconcile against the
/// stored batch, persist, rank, detect transitions, notify.
pub struct RoundMonitor {
    fetcher: PageFetcher,
    store: GameStore,
    prefs: PrefsStore,
    sink: Arc<dyn NotificationSink>,
    in_flight: Mutex<()>,
}

impl RoundMonitor {
    pub fn new(
        fetcher: PageFetcher,
        store: GameStore,
        prefs: PrefsStore,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            fetcher,
            store,
            prefs,
            sink,
            in_flight: Mutex::new(()),
        }
    }

    /// Run one fetch cycle. Returns `Ok(None)` when a cycle for this monitor
    /// is still in flight (the tick is dropped rather than queued). On any
    /// error the previously persisted batch is left untouched.
    pub async fn run_cycle(
        &self,
        tournament_id: u32,
        round: u32,
    ) -> Result<Option<CycleReport>, CycleError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!("cycle already in flight for tournament {} round {}, dropping tick", tournament_id, round);
            return Ok(None);
        };

        let previous = self.store.games_for_round(tournament_id, round).await?;
        let previous_finished: HashSet<String> = previous
            .iter()
            .filter(|g| g.is_finished())
            .map(|g| g.id.clone())
            .collect();
        let previous = keyed_by_id(previous);

        let watch_list = self.prefs.watch_list().await?;

        let html = self.fetcher.fetch_round_page(tournament_id, round).await?;

        let now = Utc::now();
        let page = parse_round_page(&html, tournament_id, round, now);
        let reconciled = reconcile(&previous, page.games, now);

        self.store.replace_round(tournament_id, round, &reconciled).await?;

        let players = standings::rank(&reconciled);
        let transitions = transitions::detect(&previous_finished, &reconciled, &watch_list);
        for game in &transitions.alerts {
            self.sink.game_finished(game, &watch_list);
        }

        let finished = reconciled.iter().filter(|g| g.is_finished()).count();
        info!(
            "cycle complete for tournament {} round {}: {} games, {} finished, {} newly finished, {} alerts",
            tournament_id,
            round,
            reconciled.len(),
            finished,
            transitions.newly_finished.len(),
            transitions.alerts.len(),
        );

        Ok(Some(CycleReport {
            snapshot: TournamentSnapshot {
                tournament_name: page.tournament_name,
                games: reconciled,
                players,
                fetched_at: now,
            },
            transitions,
        }))
    }
}
