//! Raw page to fixtures: de-obfuscate, then parse the fixture table.

use chrono::NaiveDate;
use tracing::info;

use crate::deobfuscator::{DeobfuscationReport, Deobfuscator, FontFetcher};
use crate::fixture_table::parse_fixture_page;
use crate::http::{FetchError, HttpClient};
use crate::types::{ClubListing, FixturePage};
use crate::{club_list, urls};

pub struct ProcessedPage {
    pub page: FixturePage,
    pub report: DeobfuscationReport,
}

pub fn process_fixture_page<F: FontFetcher>(deobfuscator: &Deobfuscator<F>, html: &str) -> ProcessedPage {
    let deobfuscated = deobfuscator.deobfuscate_with_report(html);
    ProcessedPage {
        page: parse_fixture_page(&deobfuscated.html),
        report: deobfuscated.report,
    }
}

/// Downloads and parses one club's fixture print page for `from..=to`.
pub fn fetch_club_fixtures<F: FontFetcher>(
    client: &HttpClient,
    deobfuscator: &Deobfuscator<F>,
    club_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<ProcessedPage, FetchError> {
    let url = urls::club_fixtures_url(client.base_url(), club_id, from, to);
    info!("Fetching fixtures for club {} ({} to {})", club_id, from, to);
    let html = client.get_text(&url)?;
    Ok(process_fixture_page(deobfuscator, &html))
}

pub fn fetch_clubs_for_postal_code(
    client: &HttpClient,
    postal_code: &str,
) -> Result<Vec<ClubListing>, FetchError> {
    let url = urls::club_search_url(client.base_url(), postal_code);
    let html = client.get_text(&url)?;
    Ok(club_list::parse_club_list(&html))
}
