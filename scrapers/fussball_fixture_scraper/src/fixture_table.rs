//! Fixture table parsing for the club fixture print page.
//!
//! The table body is a sequence of four-row blocks, one per fixture:
//!
//! 1. headline: `"Fr, 25.07.25 - 19:30 Uhr | Herren | Kreisfreundschaftsspiele"`,
//!    or just `"19:45"` when the date equals the previous fixture's
//! 2. competition: `"Herren | Kreispokal"` (class `row-competition`)
//! 3. clubs: two `td.column-club` cells around a `td.column-score`
//! 4. venue: `"Spielstätte: Name | Street | City"` in the last nested `div`
//!
//! Blocks that cannot produce a fixture are reported with a [`SkipReason`] and
//! the parser moves on to the next block. Rows after the last full block are
//! ignored.

use scraper::{ElementRef, Html};
use tracing::{debug, info, warn, Level};

use crate::date_time::parse_kickoff;
use crate::types::{BlockOutcome, BlockSkip, FixturePage, FixtureRecord, SkipReason, TableParse};
use crate::utils::{selector, stripped_text, Node};

pub const ROWS_PER_BLOCK: usize = 4;

const FIXTURE_TABLE: &str = "table.table.table-striped.table-full-width";
const NO_FIXTURES_MARKER: &str = "Kein Spielbetrieb";
const HEADLINE_SEPARATOR: &str = " | ";
const DATE_TIME_SEPARATOR: &str = " - ";
const TIME_SUFFIX: &str = " Uhr";
const BYE_MARKER: &str = "spielfrei";
const VENUE_MARKER: &str = "Spielstätte:";
const REFEREE_MARKER: &str = "Schiedsrichter";
const UNKNOWN: &str = "Unknown";

/// Most recent full date seen in one table. Time-only headlines reuse it.
#[derive(Debug, Default)]
pub struct DateContext {
    current_date: Option<String>,
}

impl DateContext {
    pub fn current_date(&self) -> Option<&str> {
        self.current_date.as_deref()
    }
}

/// Date, time and competition taken from a block's first two rows.
#[derive(Debug, PartialEq, Eq)]
struct Headline {
    date: String,
    time: String,
    age_group: String,
    league: String,
}

/// Parses a de-obfuscated fixture print page.
pub fn parse_fixture_page(html: &str) -> FixturePage {
    let document = Html::parse_document(html);
    match document.select(&selector(FIXTURE_TABLE)).next() {
        Some(table) => FixturePage::Table(parse_fixture_table(table)),
        None => {
            let page_text: String = document.root_element().text().collect();
            if page_text.contains(NO_FIXTURES_MARKER) {
                debug!("No fixtures on page ({})", NO_FIXTURES_MARKER);
                FixturePage::NoFixtures
            } else {
                warn!("No fixture table found on page");
                FixturePage::MissingTable
            }
        }
    }
}

pub fn parse_fixture_table(table: ElementRef<'_>) -> TableParse {
    let rows = body_rows(table);
    let blocks = rows.chunks_exact(ROWS_PER_BLOCK);
    let dropped_rows = blocks.remainder().len();
    if dropped_rows > 0 {
        debug!("Ignoring {} trailing row(s) that do not fill a block", dropped_rows);
    }

    let mut context = DateContext::default();
    let mut parse = TableParse {
        dropped_rows,
        ..TableParse::default()
    };

    for (block, rows) in blocks.enumerate() {
        parse.blocks += 1;
        match parse_block(rows, &mut context) {
            BlockOutcome::Fixture(fixture) => parse.fixtures.push(fixture),
            BlockOutcome::Skipped(reason) => {
                log_skip(block, &reason);
                parse.skipped.push(BlockSkip {
                    block,
                    first_row: block * ROWS_PER_BLOCK,
                    reason,
                });
            }
        }
    }

    info!(
        "Parsed {} fixture(s) from {} block(s), {} skipped",
        parse.fixtures.len(),
        parse.blocks,
        parse.skipped.len()
    );
    parse
}

/// Table rows outside `thead`, starting at the first row with a `td`.
pub fn body_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let td = selector("td");
    table
        .select(&selector("tr"))
        .filter(|row| {
            !row.ancestors()
                .filter_map(ElementRef::wrap)
                .take_while(|ancestor| ancestor.id() != table.id())
                .any(|ancestor| ancestor.value().name() == "thead")
        })
        .skip_while(|row| row.select(&td).next().is_none())
        .collect()
}

/// Turns one four-row block into a fixture, updating `context` when the
/// block carries a full date.
pub fn parse_block(rows: &[ElementRef<'_>], context: &mut DateContext) -> BlockOutcome {
    match try_parse_block(rows, context) {
        Ok(fixture) => BlockOutcome::Fixture(fixture),
        Err(reason) => BlockOutcome::Skipped(reason),
    }
}

fn try_parse_block(
    rows: &[ElementRef<'_>],
    context: &mut DateContext,
) -> Result<FixtureRecord, SkipReason> {
    let row = |index: usize| Node::from(rows.get(index).copied());
    let (headline_row, competition_row, club_row, venue_row) = (row(0), row(1), row(2), row(3));

    let headline = parse_headline(headline_row, competition_row, context)?;

    let club_cells: Vec<ElementRef<'_>> = match club_row {
        Node::Element(club_row) => club_row.select(&selector("td.column-club")).collect(),
        Node::Text(_) | Node::Absent => Vec::new(),
    };
    let row_text = club_row.text().unwrap_or_default();
    let [home_cell, away_cell] = club_cells[..] else {
        return Err(SkipReason::InvalidClubRow {
            row_text,
            note: None,
        });
    };

    let name = selector("div.club-name");
    let (home, away) = match (
        Node::Element(home_cell).find(&name).text(),
        Node::Element(away_cell).find(&name).text(),
    ) {
        (Some(home), Some(away)) => (home, away),
        _ if row_text.contains(BYE_MARKER) => return Err(SkipReason::ByeRound),
        _ => {
            let note = Node::Element(home_cell)
                .find(&selector("span.info-text"))
                .text();
            return Err(SkipReason::InvalidClubRow { row_text, note });
        }
    };
    let match_url = Node::Element(home_cell)
        .find(&selector("a"))
        .attr("href")
        .unwrap_or_default();

    check_score(club_row)?;

    let kickoff = parse_kickoff(&headline.date, &headline.time).map_err(|e| {
        SkipReason::UnparseableDate {
            date: e.date,
            time: e.time,
        }
    })?;

    let (venue_name, venue_address) = parse_venue(venue_row)?;

    Ok(FixtureRecord {
        kickoff,
        home,
        away,
        age_group: headline.age_group,
        league: headline.league,
        venue_name,
        venue_address,
        match_url,
    })
}

fn parse_headline(
    headline_row: Node<'_>,
    competition_row: Node<'_>,
    context: &mut DateContext,
) -> Result<Headline, SkipReason> {
    let Some(text) = headline_row.find(&selector("span[data-obfuscation]")).text() else {
        return Err(SkipReason::UnparseableHeadline { headline: None });
    };

    if text.contains(HEADLINE_SEPARATOR) {
        let parts: Vec<&str> = text.split(HEADLINE_SEPARATOR).map(str::trim).collect();
        let [date_time, age_group, league, ..] = parts[..] else {
            return Err(SkipReason::UnparseableHeadline { headline: Some(text) });
        };
        let Some((date, time)) = date_time.split_once(DATE_TIME_SEPARATOR) else {
            return Err(SkipReason::UnparseableHeadline { headline: Some(text) });
        };

        let date = date.trim().to_string();
        context.current_date = Some(date.clone());
        return Ok(Headline {
            date,
            time: strip_time_suffix(time),
            age_group: age_group.to_string(),
            league: league.to_string(),
        });
    }

    let Some(date) = context.current_date() else {
        return Err(SkipReason::UnparseableHeadline { headline: Some(text) });
    };
    let (age_group, league) = competition(competition_row)
        .unwrap_or_else(|| (UNKNOWN.to_string(), UNKNOWN.to_string()));
    Ok(Headline {
        date: date.to_string(),
        time: strip_time_suffix(&text),
        age_group,
        league,
    })
}

/// Age group and league from a `row-competition` row such as `"Herren | Kreispokal"`.
fn competition(row: Node<'_>) -> Option<(String, String)> {
    let Node::Element(row) = row else {
        return None;
    };
    if !Node::Element(row).has_class("row-competition") {
        return None;
    }
    // The row may also carry the kickoff time and a match-type badge.
    let cell = row.select(&selector("td.column-team")).next().unwrap_or(row);
    let text = stripped_text(cell);
    let (age_group, league) = text.split_once('|')?;
    let league = league.split('|').next().unwrap_or_default();
    Some((age_group.trim().to_string(), league.trim().to_string()))
}

fn check_score(club_row: Node<'_>) -> Result<(), SkipReason> {
    let score = club_row.find(&selector("td.column-score"));
    if matches!(score, Node::Absent) {
        return Err(SkipReason::MissingScore { note: None });
    }

    let left = score.find(&selector("span.score-left"));
    let right = score.find(&selector("span.score-right"));
    match (left, right) {
        (Node::Element(_), Node::Element(_)) => Ok(()),
        _ => Err(SkipReason::MissingScore {
            note: score.find(&selector("span.info-text")).text(),
        }),
    }
}

/// Venue name and `"street, city"` from the block's last row.
fn parse_venue(venue_row: Node<'_>) -> Result<(String, String), SkipReason> {
    let Some(text) = venue_row.find_last(&selector("div")).text() else {
        return Err(SkipReason::MissingVenueMarker { text: None });
    };

    if !text.contains(VENUE_MARKER) {
        if text.contains(REFEREE_MARKER) {
            return Err(SkipReason::RefereeOnlyNoVenue);
        }
        return Err(SkipReason::MissingVenueMarker { text: Some(text) });
    }

    let venue = text.replace(VENUE_MARKER, "");
    let parts: Vec<&str> = venue.split('|').map(str::trim).collect();
    let [name, street, city] = parts[..] else {
        return Err(SkipReason::InvalidVenueFormat { venue: text });
    };
    Ok((name.to_string(), format!("{street}, {city}")))
}

fn strip_time_suffix(time: &str) -> String {
    time.replace(TIME_SUFFIX, "").trim().to_string()
}

fn log_skip(block: usize, reason: &SkipReason) {
    if reason.severity() == Level::DEBUG {
        debug!("Skipping block {} ({}): {:?}", block, reason.label(), reason);
    } else {
        warn!("Skipping block {} ({}): {:?}", block, reason.label(), reason);
    }
}
