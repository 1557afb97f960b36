//! Code point → character tables recovered from obfuscation fonts.
//!
//! Each font maps private-use code points to glyphs whose PostScript names
//! (`zero`, `udieresis`, `bar`, ...) reveal the character actually drawn.
//! Glyph names outside the known table are kept as [`Glyph::Unresolved`]
//! so callers can see that the recovered text is incomplete.

use std::collections::{BTreeSet, HashMap};

use ttf_parser::{cmap, Face, GlyphId, PlatformId};

use crate::woff;

#[derive(Debug, thiserror::Error)]
pub enum FontDecodeError {
    #[error("malformed font container: {0}")]
    Container(&'static str),
    #[error("unsupported font container: {0}")]
    UnsupportedContainer(&'static str),
    #[error("failed to inflate font table {tag}: {source}")]
    Inflate {
        tag: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse font: {0}")]
    Parse(#[from] ttf_parser::FaceParsingError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Glyph {
    Resolved(char),
    /// Glyph name with no known character. Substitution writes the name itself.
    Unresolved(String),
}

/// Same order as fontTools' `getBestCmap`: full Unicode tables first.
const CMAP_PREFERENCE: [(PlatformId, u16); 8] = [
    (PlatformId::Windows, 10),
    (PlatformId::Unicode, 6),
    (PlatformId::Unicode, 4),
    (PlatformId::Windows, 1),
    (PlatformId::Unicode, 3),
    (PlatformId::Unicode, 2),
    (PlatformId::Unicode, 1),
    (PlatformId::Unicode, 0),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphMap {
    entries: HashMap<char, Glyph>,
}

impl GlyphMap {
    /// Builds the map from raw font bytes (WOFF or SFNT).
    pub fn build(font_bytes: &[u8]) -> Result<Self, FontDecodeError> {
        let sfnt = woff::to_sfnt(font_bytes)?;
        let face = Face::parse(&sfnt, 0)?;

        let Some(subtable) = face.tables().cmap.and_then(|table| best_subtable(table.subtables))
        else {
            return Ok(Self::default());
        };

        let mut entries = HashMap::new();
        subtable.codepoints(|code_point| {
            let Some(ch) = char::from_u32(code_point) else {
                return;
            };
            // Code points on .notdef have no drawn glyph to recover.
            let Some(glyph_id) = subtable.glyph_index(code_point).filter(|id| id.0 != 0) else {
                return;
            };
            entries.insert(ch, glyph_for(&face, glyph_id));
        });

        Ok(Self { entries })
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (char, Glyph)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, ch: char) -> Option<&Glyph> {
        self.entries.get(&ch)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Glyph names in the font that have no known character.
    pub fn unresolved_names(&self) -> BTreeSet<&str> {
        self.entries
            .values()
            .filter_map(|glyph| match glyph {
                Glyph::Unresolved(name) => Some(name.as_str()),
                Glyph::Resolved(_) => None,
            })
            .collect()
    }

    /// Replaces every mapped code point in `text`; unmapped ones are kept.
    pub fn substitute(&self, text: &str) -> String {
        self.substitute_tracking(text, &mut BTreeSet::new())
    }

    /// Like [`GlyphMap::substitute`], also collecting the unresolved glyph
    /// names that were written into the output.
    pub fn substitute_tracking(&self, text: &str, unresolved: &mut BTreeSet<String>) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match self.entries.get(&ch) {
                Some(Glyph::Resolved(real)) => out.push(*real),
                Some(Glyph::Unresolved(name)) => {
                    if !unresolved.contains(name) {
                        unresolved.insert(name.clone());
                    }
                    out.push_str(name);
                }
                None => out.push(ch),
            }
        }
        out
    }
}

fn best_subtable(subtables: cmap::Subtables<'_>) -> Option<cmap::Subtable<'_>> {
    CMAP_PREFERENCE
        .iter()
        .find_map(|&(platform, encoding)| {
            subtables
                .into_iter()
                .find(|s| s.platform_id == platform && s.encoding_id == encoding)
        })
        .or_else(|| subtables.into_iter().next())
}

fn glyph_for(face: &Face<'_>, glyph_id: GlyphId) -> Glyph {
    match face.glyph_name(glyph_id) {
        Some(name) => resolve_glyph_name(name)
            .map(Glyph::Resolved)
            .unwrap_or_else(|| Glyph::Unresolved(name.to_string())),
        // fontTools names unnamed glyphs the same way.
        None => Glyph::Unresolved(format!("glyph{:05}", glyph_id.0)),
    }
}

/// Character drawn by a glyph called `name`, if known.
pub fn resolve_glyph_name(name: &str) -> Option<char> {
    named_glyph(name)
        .or_else(|| single_letter(name))
        .or_else(|| unicode_glyph_name(name))
}

fn single_letter(name: &str) -> Option<char> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if ch.is_ascii_alphabetic() => Some(ch),
        _ => None,
    }
}

/// `uniXXXX` and `uXXXX`..`uXXXXXX` names from the Adobe Glyph List conventions.
fn unicode_glyph_name(name: &str) -> Option<char> {
    let hex = name
        .strip_prefix("uni")
        .filter(|hex| hex.len() == 4)
        .or_else(|| name.strip_prefix('u').filter(|hex| (4..=6).contains(&hex.len())))?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

fn named_glyph(name: &str) -> Option<char> {
    let ch = match name {
        // Digits
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        // Punctuation
        "comma" => ',',
        "period" => '.',
        "colon" => ':',
        "space" => ' ',
        "hyphen" | "minus" => '-',
        "bar" | "pipe" => '|',
        // German
        "germandbls" => 'ß',
        "adieresis" => 'ä',
        "odieresis" => 'ö',
        "udieresis" => 'ü',
        "Adieresis" => 'Ä',
        "Odieresis" => 'Ö',
        "Udieresis" => 'Ü',
        // Latin-1 lowercase
        "aacute" => 'á',
        "agrave" => 'à',
        "acircumflex" => 'â',
        "atilde" => 'ã',
        "aring" => 'å',
        "eacute" => 'é',
        "egrave" => 'è',
        "ecircumflex" => 'ê',
        "edieresis" => 'ë',
        "iacute" => 'í',
        "igrave" => 'ì',
        "icircumflex" => 'î',
        "idieresis" => 'ï',
        "oacute" => 'ó',
        "ograve" => 'ò',
        "ocircumflex" => 'ô',
        "otilde" => 'õ',
        "oslash" => 'ø',
        "uacute" => 'ú',
        "ugrave" => 'ù',
        "ucircumflex" => 'û',
        "yacute" => 'ý',
        "ydieresis" => 'ÿ',
        "ccedilla" => 'ç',
        "ntilde" => 'ñ',
        "ae" => 'æ',
        "oe" => 'œ',
        // Latin-1 uppercase
        "Aacute" => 'Á',
        "Agrave" => 'À',
        "Acircumflex" => 'Â',
        "Atilde" => 'Ã',
        "Aring" => 'Å',
        "Eacute" => 'É',
        "Egrave" => 'È',
        "Ecircumflex" => 'Ê',
        "Edieresis" => 'Ë',
        "Iacute" => 'Í',
        "Igrave" => 'Ì',
        "Icircumflex" => 'Î',
        "Idieresis" => 'Ï',
        "Oacute" => 'Ó',
        "Ograve" => 'Ò',
        "Ocircumflex" => 'Ô',
        "Otilde" => 'Õ',
        "Oslash" => 'Ø',
        "Uacute" => 'Ú',
        "Ugrave" => 'Ù',
        "Ucircumflex" => 'Û',
        "Yacute" => 'Ý',
        "Ydieresis" => 'Ÿ',
        "Ccedilla" => 'Ç',
        "Ntilde" => 'Ñ',
        "AE" => 'Æ',
        "OE" => 'Œ',
        // Latin Extended-A
        "scaron" => 'š',
        "Scaron" => 'Š',
        "zcaron" => 'ž',
        "Zcaron" => 'Ž',
        "cacute" => 'ć',
        "Cacute" => 'Ć',
        "ccaron" => 'č',
        "Ccaron" => 'Č',
        "dcaron" => 'ď',
        "Dcaron" => 'Ď',
        "ecaron" => 'ě',
        "Ecaron" => 'Ě',
        "lacute" => 'ĺ',
        "Lacute" => 'Ĺ',
        "lcaron" => 'ľ',
        "Lcaron" => 'Ľ',
        "nacute" => 'ń',
        "Nacute" => 'Ń',
        "ncaron" => 'ň',
        "Ncaron" => 'Ň',
        "racute" => 'ŕ',
        "Racute" => 'Ŕ',
        "rcaron" => 'ř',
        "Rcaron" => 'Ř',
        "sacute" => 'ś',
        "Sacute" => 'Ś',
        "tcaron" => 'ť',
        "Tcaron" => 'Ť',
        "uring" => 'ů',
        "Uring" => 'Ů',
        "zacute" => 'ź',
        "Zacute" => 'Ź',
        "zdotaccent" => 'ż',
        "Zdotaccent" => 'Ż',
        _ => return None,
    };
    Some(ch)
}
