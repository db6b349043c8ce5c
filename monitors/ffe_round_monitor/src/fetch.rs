use std::time::Duration;

use anyhow::Context;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use crate::config::MonitorConfig;
use crate::types::ConnectionStatus;

/// Why a fetch cycle failed. Transport problems are kept apart from non-2xx
/// responses so the caller can tell connectivity loss from a server-side
/// failure; either way the previously persisted batch stays untouched.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned HTTP {0}")]
    HttpStatus(StatusCode),
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl CycleError {
    /// Connectivity indicator shown on the status endpoint.
    pub fn status(&self) -> ConnectionStatus {
        match self {
            CycleError::Transport(_) => ConnectionStatus::NetworkError,
            CycleError::HttpStatus(_) => ConnectionStatus::HttpError,
            CycleError::Storage(_) | CycleError::Unknown(_) => ConnectionStatus::Error,
        }
    }
}

/// Thin HTTP boundary: one GET per cycle against the results page for a
/// (tournament, round) pair.
pub struct PageFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl PageFetcher {
    pub fn new(config: &MonitorConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.scraping.user_agent)
            .timeout(Duration::from_secs(config.scraping.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.scraping.base_url.clone(),
        })
    }

    /// The site keys result pages on the tournament id (twice) and the round
    /// zero-padded to two digits.
    pub fn round_url(&self, tournament_id: u32, round: u32) -> String {
        format!(
            "{}/Resultats.aspx?URL=Tournois/Id/{id}/{id}&Action={round:02}",
            self.base_url.trim_end_matches('/'),
            id = tournament_id,
            round = round,
        )
    }

    pub async fn fetch_round_page(
        &self,
        tournament_id: u32,
        round: u32,
    ) -> Result<String, CycleError> {
        let url = self.round_url(tournament_id, round);
        debug!("fetching {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CycleError::HttpStatus(response.status()));
        }

        let html = response.text().await?;
        debug!("fetched {} bytes for tournament {} round {}", html.len(), tournament_id, round);
        Ok(html)
    }
}
