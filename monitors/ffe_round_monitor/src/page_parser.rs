use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::debug;

use crate::types::{
    is_listed_player, parse_points, parse_rating, GameRecord, PlayerRecord, RoundPage,
};

#[derive(Debug, Error)]
enum RowError {
    #[error("table number {0:?} is not numeric")]
    BadTableNumber(String),
    #[error("missing cell {0}")]
    MissingCell(usize),
}

/// Parse one fetched results page. Total and pure: a malformed row is skipped
/// and logged, never fatal, and no I/O happens here. `observed_at` is the
/// fetch time stamped onto every extracted record.
pub fn parse_round_page(
    html: &str,
    tournament_id: u32,
    round: u32,
    observed_at: DateTime<Utc>,
) -> RoundPage {
    let document = Html::parse_document(html);

    let tournament_name = extract_tournament_name(&document);

    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    let mut games = Vec::new();
    let mut players: Vec<PlayerRecord> = Vec::new();

    for row in document.select(&row_selector) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        // Result rows have eight columns; the striped classes the site uses
        // (papi_liste_c / papi_liste_f) both render this shape, so matching
        // on the shape accepts both without caring about class names.
        if cells.len() < 8 {
            continue;
        }
        match parse_game_row(&cells, tournament_id, round, observed_at) {
            Ok(game) => {
                fold_player(&mut players, &game.player1_name, &game.player1_rating, &game.player1_points);
                fold_player(&mut players, &game.player2_name, &game.player2_rating, &game.player2_points);
                games.push(game);
            }
            Err(e) => debug!("skipping result row: {}", e),
        }
    }

    RoundPage {
        tournament_name,
        games,
        players,
    }
}

/// The tournament name sits in the title row, before the first line break.
fn extract_tournament_name(document: &Html) -> String {
    let title_selector = Selector::parse("tr.papi_titre td").unwrap();
    let Some(cell) = document.select(&title_selector).next() else {
        return String::new();
    };

    let mut name = String::new();
    for child in cell.children() {
        if let Some(el) = ElementRef::wrap(child) {
            if el.value().name() == "br" {
                break;
            }
            name.push_str(&el.text().collect::<String>());
        } else if let Some(text) = child.value().as_text() {
            name.push_str(text);
        }
    }
    name.trim().to_string()
}

fn parse_game_row(
    cells: &[ElementRef],
    tournament_id: u32,
    round: u32,
    observed_at: DateTime<Utc>,
) -> Result<GameRecord, RowError> {
    let text = |idx: usize| -> Result<String, RowError> {
        cells
            .get(idx)
            .map(|cell| cell.text().collect::<String>())
            .ok_or(RowError::MissingCell(idx))
    };

    // Fixed column order: table number, p1 points before the round, p1 name,
    // p1 rating, result, p2 name, p2 rating, p2 points before the round.
    let table_text = text(0)?.trim().to_string();
    let table_num = match table_text.parse::<u32>() {
        Ok(num) => num,
        Err(_) => return Err(RowError::BadTableNumber(table_text)),
    };

    let player1_points = text(1)?.trim().to_string();
    let player1_name = text(2)?.trim().to_string();
    let player1_rating = text(3)?.trim().to_string();
    // The raw result keeps its whitespace for display; logic uses the trim.
    let raw_result = text(4)?;
    let result = raw_result.trim().to_string();
    let player2_name = text(5)?.trim().to_string();
    let player2_rating = text(6)?.trim().to_string();
    let player2_points = text(7)?.trim().to_string();

    Ok(GameRecord {
        id: GameRecord::game_id(tournament_id, round, table_num),
        tournament_id,
        round,
        table_num,
        player1_name,
        player1_rating,
        player1_points,
        result,
        raw_result,
        player2_name,
        player2_rating,
        player2_points,
        finished_at: None,
        observed_at,
    })
}

/// Last write wins within a single page; both occurrences of a name on one
/// page should be identical anyway.
fn fold_player(players: &mut Vec<PlayerRecord>, name: &str, rating: &str, points: &str) {
    if !is_listed_player(name) {
        return;
    }
    let record = PlayerRecord {
        name: name.to_string(),
        rating: parse_rating(rating),
        points: parse_points(points),
    };
    if let Some(existing) = players.iter_mut().find(|p| p.name == name) {
        *existing = record;
    } else {
        players.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><body><table>
        <tr class="papi_titre"><td>Open de Test<br>Ronde 3</td></tr>
        <tr class="papi_small_t"><td>Ech.</td><td>Pts</td><td>Blancs</td><td>Elo</td><td>Res.</td><td>Noirs</td><td>Elo</td><td>Pts</td></tr>
        <tr class="papi_liste_c"><td>1</td><td>2</td><td>DUPONT Pierre</td><td>2105 F</td><td>1-0</td><td>MARTIN Paul</td><td>1987 N</td><td>1½</td></tr>
        <tr class="papi_liste_f"><td>2</td><td>1½</td><td>BERNARD Luc</td><td>1890 F</td><td>-</td><td>PETIT Anne</td><td>1750 F</td><td>1</td></tr>
        <tr class="papi_liste_c"><td>3</td><td>½</td><td>MOREAU Jean</td><td>1600 F</td><td>+/-</td><td>EXEMPT</td><td></td><td></td></tr>
    </table></body></html>"#;

    fn parse(html: &str) -> RoundPage {
        parse_round_page(html, 42, 3, Utc::now())
    }

    #[test]
    fn extracts_name_games_and_players() {
        let page = parse(PAGE);

        assert_eq!(page.tournament_name, "Open de Test");
        assert_eq!(page.games.len(), 3);

        let first = &page.games[0];
        assert_eq!(first.id, "42_3_1");
        assert_eq!(first.table_num, 1);
        assert_eq!(first.player1_name, "DUPONT Pierre");
        assert_eq!(first.result, "1-0");
        assert_eq!(first.player2_rating, "1987 N");
        assert!(first.is_finished());
        assert!(!page.games[1].is_finished());

        let names: Vec<&str> = page.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["DUPONT Pierre", "MARTIN Paul", "BERNARD Luc", "PETIT Anne", "MOREAU Jean"]
        );
        assert_eq!(page.players[0].rating, 2105);
        assert_eq!(page.players[1].points, 1.5);
    }

    #[test]
    fn header_row_with_eight_cells_is_skipped() {
        // "Ech." is not a table number; the row is dropped without affecting
        // the rest of the batch.
        let page = parse(PAGE);
        assert!(page.games.iter().all(|g| g.table_num >= 1));
    }

    #[test]
    fn missing_title_yields_empty_name() {
        let page = parse("<html><body><table><tr><td>nothing here</td></tr></table></body></html>");
        assert_eq!(page.tournament_name, "");
        assert!(page.games.is_empty());
    }

    #[test]
    fn short_rows_are_ignored() {
        let html = r#"<table>
            <tr class="papi_liste_c"><td>1</td><td>0</td><td>A B</td></tr>
            <tr class="papi_liste_f"><td>2</td><td>0</td><td>C D</td><td>1500</td><td>0-1</td><td>E F</td><td>1400</td><td>0</td></tr>
        </table>"#;
        let page = parse(html);
        assert_eq!(page.games.len(), 1);
        assert_eq!(page.games[0].table_num, 2);
    }

    #[test]
    fn raw_result_keeps_whitespace() {
        let html = r#"<table>
            <tr class="papi_liste_c"><td>1</td><td>0</td><td>A B</td><td>1500</td><td> 1-0 </td><td>C D</td><td>1400</td><td>0</td></tr>
        </table>"#;
        let page = parse(html);
        assert_eq!(page.games[0].raw_result, " 1-0 ");
        assert_eq!(page.games[0].result, "1-0");
    }
}
