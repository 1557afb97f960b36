mod common;

use fussball_fixture_scraper::glyph_map::{FontDecodeError, Glyph, GlyphMap};
use fussball_fixture_scraper::woff;
use pretty_assertions::assert_eq;

use common::{obfuscated, obfuscating_cmap, sfnt_font, standard_font, standard_glyphs, woff_font};

#[test]
fn test_build_from_sfnt_resolves_every_glyph() {
    let map = GlyphMap::build(&standard_font()).unwrap();

    assert_eq!(map.len(), standard_glyphs().len());
    assert_eq!(map.get(obfuscated('7')), Some(&Glyph::Resolved('7')));
    assert_eq!(map.get(obfuscated('|')), Some(&Glyph::Resolved('|')));
    assert_eq!(map.get(obfuscated('ß')), Some(&Glyph::Resolved('ß')));
    assert_eq!(map.get(obfuscated('Q')), Some(&Glyph::Resolved('Q')));
    assert_eq!(map.get('7'), None);
    assert!(map.unresolved_names().is_empty());
}

#[test]
fn test_woff_and_sfnt_give_the_same_map() {
    let sfnt = sfnt_font(&obfuscating_cmap(&standard_glyphs()), 3, 10);
    let woff = woff_font(&sfnt);
    assert_eq!(&woff[..4], b"wOFF");

    let unwrapped = woff::to_sfnt(&woff).unwrap();
    assert_eq!(unwrapped.len() % 4, 0);
    assert_eq!(GlyphMap::build(&woff).unwrap(), GlyphMap::build(&sfnt).unwrap());
}

#[test]
fn test_substitution_replaces_only_mapped_code_points() {
    let map = GlyphMap::build(&standard_font()).unwrap();
    let obfuscated_time: String = "19:30".chars().map(obfuscated).collect();
    let text = format!("{obfuscated_time} Uhr \u{E999}");

    assert_eq!(map.substitute(&text), "19:30 Uhr \u{E999}");
    // Already readable text passes through untouched.
    assert_eq!(map.substitute("Fr, 25.07.25"), "Fr, 25.07.25");
}

#[test]
fn test_unknown_glyph_names_stay_visible() {
    let mappings = vec![
        (0xE101, "one".to_string()),
        (0xE102, "Euro".to_string()),
        (0xE103, "uni00E9".to_string()),
    ];
    let map = GlyphMap::build(&sfnt_font(&mappings, 3, 10)).unwrap();

    assert_eq!(map.get('\u{E102}'), Some(&Glyph::Unresolved("Euro".to_string())));
    assert_eq!(map.get('\u{E103}'), Some(&Glyph::Resolved('é')));
    assert_eq!(map.unresolved_names().into_iter().collect::<Vec<_>>(), vec!["Euro"]);
    assert_eq!(map.substitute("\u{E101}\u{E102}"), "1Euro");
}

#[test]
fn test_falls_back_to_any_cmap_subtable() {
    let mappings = vec![(0x41, "zero".to_string()), (0x42, "one".to_string())];
    let map = GlyphMap::build(&sfnt_font(&mappings, 1, 0)).unwrap();
    assert_eq!(map.substitute("BA"), "10");
}

#[test]
fn test_empty_cmap_gives_empty_map() {
    let map = GlyphMap::build(&sfnt_font(&[], 3, 10)).unwrap();
    assert!(map.is_empty());
    assert_eq!(map.substitute("\u{E031}"), "\u{E031}");
}

#[test]
fn test_broken_fonts_are_errors() {
    assert!(matches!(
        GlyphMap::build(b"wOF2\0\0\0\0"),
        Err(FontDecodeError::UnsupportedContainer(_))
    ));

    let mut truncated = standard_font();
    truncated.truncate(40);
    assert!(matches!(GlyphMap::build(&truncated), Err(FontDecodeError::Parse(_))));
}
