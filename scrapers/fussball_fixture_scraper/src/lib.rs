pub mod club_list;
pub mod config;
pub mod date_time;
pub mod deobfuscator;
pub mod export;
pub mod fixture_table;
pub mod glyph_map;
pub mod http;
pub mod pipeline;
pub mod types;
pub mod urls;
pub mod utils;
pub mod woff;

pub use deobfuscator::{Deobfuscator, FontFetcher};
pub use fixture_table::parse_fixture_page;
pub use glyph_map::GlyphMap;
pub use types::{FixturePage, FixtureRecord, SkipReason, TableParse};
