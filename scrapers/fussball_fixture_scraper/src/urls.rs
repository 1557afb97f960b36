//! URL templates for the fussball.de pages and font resources the scraper touches.

use chrono::NaiveDate;
use urlencoding::encode;

pub const DEFAULT_BASE_URL: &str = "https://www.fussball.de";

/// WOFF font governing every span tagged with `data-obfuscation="{id}"`.
pub fn font_url(base_url: &str, obfuscation_id: &str) -> String {
    format!(
        "{}/export.fontface/-/format/woff/id/{}/type/font",
        base_url.trim_end_matches('/'),
        encode(obfuscation_id)
    )
}

/// Printable fixture list of one club, venues included.
pub fn club_fixtures_url(base_url: &str, club_id: &str, from: NaiveDate, to: NaiveDate) -> String {
    format!(
        "{}/vereinsspielplan.druck/-/datum-bis/{}/datum-von/{}/id/{}/match-type/-1/max/999/mode/PRINT/show-venues/true#!/",
        base_url.trim_end_matches('/'),
        to.format("%Y-%m-%d"),
        from.format("%Y-%m-%d"),
        encode(club_id)
    )
}

pub fn club_search_url(base_url: &str, postal_code: &str) -> String {
    format!(
        "{}/suche.verein/-/plz/{}#!/",
        base_url.trim_end_matches('/'),
        encode(postal_code)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_url() {
        assert_eq!(
            font_url(DEFAULT_BASE_URL, "ctnmzv7x"),
            "https://www.fussball.de/export.fontface/-/format/woff/id/ctnmzv7x/type/font"
        );
        assert_eq!(
            font_url("http://127.0.0.1:1234/", "a b"),
            "http://127.0.0.1:1234/export.fontface/-/format/woff/id/a%20b/type/font"
        );
    }

    #[test]
    fn test_club_fixtures_url() {
        let from = NaiveDate::from_ymd_opt(2025, 7, 25).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 8, 6).unwrap();
        assert_eq!(
            club_fixtures_url(DEFAULT_BASE_URL, "00ES8GN8VS000030VV0AG08LVUPGND5I", from, to),
            "https://www.fussball.de/vereinsspielplan.druck/-/datum-bis/2025-08-06/datum-von/2025-07-25/id/00ES8GN8VS000030VV0AG08LVUPGND5I/match-type/-1/max/999/mode/PRINT/show-venues/true#!/"
        );
    }

    #[test]
    fn test_club_search_url() {
        assert_eq!(
            club_search_url(DEFAULT_BASE_URL, "01099"),
            "https://www.fussball.de/suche.verein/-/plz/01099#!/"
        );
    }
}
