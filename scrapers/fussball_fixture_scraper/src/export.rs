use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs, io::Write, path::Path};

use crate::types::{BlockSkip, ClubListing, FixtureRecord, TableParse};

pub const FIXTURE_HEADERS: [&str; 8] = [
    "kickoff",
    "home",
    "away",
    "age_group",
    "league",
    "venue_name",
    "venue_address",
    "match_url",
];

pub fn write_fixtures_csv<W: Write>(writer: W, fixtures: &[FixtureRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(FIXTURE_HEADERS)?;
    for fixture in fixtures {
        wtr.write_record([
            fixture.kickoff.format("%Y-%m-%dT%H:%M:%S").to_string().as_str(),
            fixture.home.as_str(),
            fixture.away.as_str(),
            fixture.age_group.as_str(),
            fixture.league.as_str(),
            fixture.venue_name.as_str(),
            fixture.venue_address.as_str(),
            fixture.match_url.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_clubs_csv<W: Write>(writer: W, clubs: &[ClubListing]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for club in clubs {
        wtr.serialize(club)?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    source: &'a str,
    fixtures: &'a [FixtureRecord],
    skipped: &'a [BlockSkip],
    blocks: usize,
    dropped_rows: usize,
}

/// Fixtures plus skip diagnostics for one page.
pub fn write_parse_json<W: Write>(writer: W, source: &str, parse: &TableParse) -> Result<()> {
    let report = JsonReport {
        source,
        fixtures: &parse.fixtures,
        skipped: &parse.skipped,
        blocks: parse.blocks,
        dropped_rows: parse.dropped_rows,
    };
    serde_json::to_writer_pretty(writer, &report)?;
    Ok(())
}

pub fn create_output_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }
    fs::File::create(path).with_context(|| format!("Failed to create {:?}", path))
}
