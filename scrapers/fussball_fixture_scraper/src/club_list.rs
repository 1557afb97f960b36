use scraper::Html;
use tracing::{debug, error};

use crate::types::ClubListing;
use crate::utils::{element_text, selector};

/// Clubs listed on a club search result page (`#clublist`).
pub fn parse_club_list(html: &str) -> Vec<ClubListing> {
    let document = Html::parse_document(html);
    let mut clubs = Vec::new();

    for anchor in document.select(&selector("#clublist ul li a")) {
        let Some(href) = anchor.value().attr("href") else {
            debug!("Club entry without link: {}", element_text(anchor));
            continue;
        };
        let external_id = href.rsplit('/').next().unwrap_or_default().to_string();

        // Anchors hold the name on the first line, followed by the address.
        let text = element_text(anchor);
        let name = text.lines().next().unwrap_or_default().trim().to_string();
        if name.is_empty() {
            error!("Club name is empty for external_id: {}", external_id);
            continue;
        }

        clubs.push(ClubListing { external_id, name });
    }

    debug!("Found {} club(s) on search page", clubs.len());
    clubs
}
