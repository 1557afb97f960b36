use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::Level;

/// One fixture reconstructed from a four-row block of the fixture table.
///
/// `kickoff` is civil time as printed on the page (German local time); the
/// persistence side decides how to pin it to a timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureRecord {
    pub kickoff: NaiveDateTime,
    pub home: String,
    pub away: String,
    pub age_group: String,
    pub league: String,
    pub venue_name: String,
    pub venue_address: String,
    pub match_url: String,
}

/// Why a row block did not produce a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    UnparseableHeadline { headline: Option<String> },
    InvalidClubRow { row_text: String, note: Option<String> },
    ByeRound,
    MissingScore { note: Option<String> },
    MissingVenueMarker { text: Option<String> },
    RefereeOnlyNoVenue,
    InvalidVenueFormat { venue: String },
    UnparseableDate { date: String, time: String },
}

impl SkipReason {
    /// Level the skip is logged at. Expected conditions (bye weeks, fixtures
    /// without a venue yet, explained score gaps) stay at DEBUG.
    pub fn severity(&self) -> Level {
        match self {
            SkipReason::ByeRound | SkipReason::RefereeOnlyNoVenue => Level::DEBUG,
            SkipReason::MissingScore { note: Some(_) } => Level::DEBUG,
            SkipReason::UnparseableHeadline { .. }
            | SkipReason::InvalidClubRow { .. }
            | SkipReason::MissingScore { note: None }
            | SkipReason::MissingVenueMarker { .. }
            | SkipReason::InvalidVenueFormat { .. }
            | SkipReason::UnparseableDate { .. } => Level::WARN,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::UnparseableHeadline { .. } => "unparseable_headline",
            SkipReason::InvalidClubRow { .. } => "invalid_club_row",
            SkipReason::ByeRound => "bye_round",
            SkipReason::MissingScore { .. } => "missing_score",
            SkipReason::MissingVenueMarker { .. } => "missing_venue_marker",
            SkipReason::RefereeOnlyNoVenue => "referee_only_no_venue",
            SkipReason::InvalidVenueFormat { .. } => "invalid_venue_format",
            SkipReason::UnparseableDate { .. } => "unparseable_date",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    Fixture(FixtureRecord),
    Skipped(SkipReason),
}

/// A skipped block together with where it sat in the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSkip {
    pub block: usize,
    pub first_row: usize,
    #[serde(flatten)]
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableParse {
    pub fixtures: Vec<FixtureRecord>,
    pub skipped: Vec<BlockSkip>,
    pub blocks: usize,
    /// Trailing rows that did not fill a whole block.
    pub dropped_rows: usize,
}

impl TableParse {
    pub fn skip_reasons(&self) -> impl Iterator<Item = &SkipReason> {
        self.skipped.iter().map(|skip| &skip.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixturePage {
    Table(TableParse),
    /// The club has no fixtures in the requested range ("Kein Spielbetrieb").
    NoFixtures,
    MissingTable,
}

impl FixturePage {
    pub fn fixtures(&self) -> &[FixtureRecord] {
        match self {
            FixturePage::Table(parse) => &parse.fixtures,
            FixturePage::NoFixtures | FixturePage::MissingTable => &[],
        }
    }

    pub fn into_table_parse(self) -> TableParse {
        match self {
            FixturePage::Table(parse) => parse,
            FixturePage::NoFixtures | FixturePage::MissingTable => TableParse::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubListing {
    pub external_id: String,
    pub name: String,
}
