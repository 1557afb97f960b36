#![allow(dead_code)]

use std::{
    collections::HashMap,
    io::Write,
    sync::Mutex,
};

use flate2::{write::ZlibEncoder, Compression};
use fussball_fixture_scraper::{deobfuscator::FontFetcher, http::FetchError};
use regex::Regex;

pub const OBFUSCATION_ID: &str = "ctnmzv7x";

/// Private-use code point the test fonts use for `ch`.
pub fn obfuscated(ch: char) -> char {
    char::from_u32(0xE000 + ch as u32).unwrap()
}

/// Glyph names for every character the standard test font draws.
pub fn standard_glyphs() -> Vec<(char, String)> {
    let mut glyphs: Vec<(char, String)> = ('a'..='z')
        .chain('A'..='Z')
        .map(|ch| (ch, ch.to_string()))
        .collect();
    let named = [
        ('0', "zero"),
        ('1', "one"),
        ('2', "two"),
        ('3', "three"),
        ('4', "four"),
        ('5', "five"),
        ('6', "six"),
        ('7', "seven"),
        ('8', "eight"),
        ('9', "nine"),
        (':', "colon"),
        ('.', "period"),
        (',', "comma"),
        ('-', "hyphen"),
        ('|', "bar"),
        ('ä', "adieresis"),
        ('ö', "odieresis"),
        ('ü', "udieresis"),
        ('ß', "germandbls"),
    ];
    glyphs.extend(named.iter().map(|(ch, name)| (*ch, name.to_string())));
    glyphs
}

/// Code point → glyph name pairs for a font that draws `glyphs` at their
/// obfuscated code points.
pub fn obfuscating_cmap(glyphs: &[(char, String)]) -> Vec<(u32, String)> {
    glyphs
        .iter()
        .map(|(ch, name)| (obfuscated(*ch) as u32, name.clone()))
        .collect()
}

/// Replaces every character the standard font draws with its obfuscated code point.
pub fn obfuscate(text: &str) -> String {
    let drawn: HashMap<char, ()> = standard_glyphs().into_iter().map(|(ch, _)| (ch, ())).collect();
    text.chars()
        .map(|ch| if drawn.contains_key(&ch) { obfuscated(ch) } else { ch })
        .collect()
}

/// Obfuscates the text of every `data-obfuscation` span in a readable page.
pub fn obfuscate_spans(html: &str) -> String {
    let span = Regex::new(r#"(<span data-obfuscation="[^"]*"[^>]*>)([^<]*)(</span>)"#).unwrap();
    span.replace_all(html, |caps: &regex::Captures| {
        format!("{}{}{}", &caps[1], obfuscate(&caps[2]), &caps[3])
    })
    .into_owned()
}

pub fn standard_font() -> Vec<u8> {
    sfnt_font(&obfuscating_cmap(&standard_glyphs()), 3, 10)
}

pub fn standard_woff_font() -> Vec<u8> {
    woff_font(&sfnt_font(&obfuscating_cmap(&standard_glyphs()), 3, 10))
}

/// Minimal TrueType font: `head`, `hhea`, `maxp`, a format 12 `cmap` under
/// (`platform_id`, `encoding_id`) and a version 2 `post` table carrying the
/// glyph names. Glyph 0 is `.notdef`.
pub fn sfnt_font(mappings: &[(u32, String)], platform_id: u16, encoding_id: u16) -> Vec<u8> {
    let mut mappings = mappings.to_vec();
    mappings.sort_by_key(|(code_point, _)| *code_point);
    let num_glyphs = mappings.len() as u16 + 1;

    let mut tables: Vec<([u8; 4], Vec<u8>)> = vec![
        (*b"cmap", cmap_table(&mappings, platform_id, encoding_id)),
        (*b"head", head_table()),
        (*b"hhea", hhea_table()),
        (*b"maxp", maxp_table(num_glyphs)),
        (*b"post", post_table(&mappings)),
    ];
    tables.sort_by_key(|(tag, _)| *tag);
    sfnt_container(&tables)
}

fn sfnt_container(tables: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let mut out = Vec::new();
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&num_tables.to_be_bytes());
    out.extend_from_slice(&[0, 0, 0, 0, 0, 0]);

    let mut offset = 12 + 16 * tables.len();
    let mut body = Vec::new();
    for (tag, data) in tables {
        out.extend_from_slice(tag);
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        body.extend_from_slice(data);
        while body.len() % 4 != 0 {
            body.push(0);
        }
        offset = 12 + 16 * tables.len() + body.len();
    }
    out.extend_from_slice(&body);
    out
}

fn head_table() -> Vec<u8> {
    let mut head = vec![0u8; 54];
    head[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    head[4..8].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    head[12..16].copy_from_slice(&0x5F0F_3CF5u32.to_be_bytes());
    head[18..20].copy_from_slice(&1000u16.to_be_bytes());
    // indexToLocFormat (offset 50) and glyphDataFormat stay 0.
    head
}

fn hhea_table() -> Vec<u8> {
    let mut hhea = vec![0u8; 36];
    hhea[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    hhea
}

fn maxp_table(num_glyphs: u16) -> Vec<u8> {
    let mut maxp = Vec::new();
    maxp.extend_from_slice(&0x0000_5000u32.to_be_bytes());
    maxp.extend_from_slice(&num_glyphs.to_be_bytes());
    maxp
}

fn cmap_table(mappings: &[(u32, String)], platform_id: u16, encoding_id: u16) -> Vec<u8> {
    let mut cmap = Vec::new();
    cmap.extend_from_slice(&0u16.to_be_bytes());
    cmap.extend_from_slice(&1u16.to_be_bytes());
    cmap.extend_from_slice(&platform_id.to_be_bytes());
    cmap.extend_from_slice(&encoding_id.to_be_bytes());
    cmap.extend_from_slice(&12u32.to_be_bytes());

    let groups = mappings.len() as u32;
    cmap.extend_from_slice(&12u16.to_be_bytes());
    cmap.extend_from_slice(&0u16.to_be_bytes());
    cmap.extend_from_slice(&(16 + 12 * groups).to_be_bytes());
    cmap.extend_from_slice(&0u32.to_be_bytes());
    cmap.extend_from_slice(&groups.to_be_bytes());
    for (index, (code_point, _)) in mappings.iter().enumerate() {
        let glyph_id = index as u32 + 1;
        cmap.extend_from_slice(&code_point.to_be_bytes());
        cmap.extend_from_slice(&code_point.to_be_bytes());
        cmap.extend_from_slice(&glyph_id.to_be_bytes());
    }
    cmap
}

fn post_table(mappings: &[(u32, String)]) -> Vec<u8> {
    let mut post = vec![0u8; 32];
    post[0..4].copy_from_slice(&0x0002_0000u32.to_be_bytes());

    let num_glyphs = mappings.len() as u16 + 1;
    post.extend_from_slice(&num_glyphs.to_be_bytes());
    // .notdef is standard name 0; every other glyph gets a custom name.
    post.extend_from_slice(&0u16.to_be_bytes());
    for index in 0..mappings.len() {
        post.extend_from_slice(&(258 + index as u16).to_be_bytes());
    }
    for (_, name) in mappings {
        post.push(name.len() as u8);
        post.extend_from_slice(name.as_bytes());
    }
    post
}

/// Wraps SFNT data as WOFF 1.0, compressing tables where that saves space.
pub fn woff_font(sfnt: &[u8]) -> Vec<u8> {
    let read_u16 = |at: usize| u16::from_be_bytes([sfnt[at], sfnt[at + 1]]);
    let read_u32 =
        |at: usize| u32::from_be_bytes([sfnt[at], sfnt[at + 1], sfnt[at + 2], sfnt[at + 3]]);

    let num_tables = read_u16(4) as usize;
    let mut directory = Vec::new();
    let mut body = Vec::new();
    let data_start = 44 + 20 * num_tables;

    for i in 0..num_tables {
        let record = 12 + 16 * i;
        let tag = &sfnt[record..record + 4];
        let checksum = read_u32(record + 4);
        let offset = read_u32(record + 8) as usize;
        let length = read_u32(record + 12) as usize;
        let table = &sfnt[offset..offset + length];

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(table).unwrap();
        let compressed = encoder.finish().unwrap();
        let stored = if compressed.len() < table.len() { compressed } else { table.to_vec() };

        directory.extend_from_slice(tag);
        directory.extend_from_slice(&((data_start + body.len()) as u32).to_be_bytes());
        directory.extend_from_slice(&(stored.len() as u32).to_be_bytes());
        directory.extend_from_slice(&(length as u32).to_be_bytes());
        directory.extend_from_slice(&checksum.to_be_bytes());

        body.extend_from_slice(&stored);
        while body.len() % 4 != 0 {
            body.push(0);
        }
    }

    let mut woff = Vec::new();
    woff.extend_from_slice(b"wOFF");
    woff.extend_from_slice(&sfnt[0..4]);
    woff.extend_from_slice(&((data_start + body.len()) as u32).to_be_bytes());
    woff.extend_from_slice(&(num_tables as u16).to_be_bytes());
    woff.extend_from_slice(&0u16.to_be_bytes());
    woff.extend_from_slice(&(sfnt.len() as u32).to_be_bytes());
    woff.extend_from_slice(&1u16.to_be_bytes());
    woff.extend_from_slice(&0u16.to_be_bytes());
    woff.extend_from_slice(&[0u8; 20]);
    woff.extend_from_slice(&directory);
    woff.extend_from_slice(&body);
    woff
}

/// Serves fonts from memory and records every request.
#[derive(Default)]
pub struct MapFontFetcher {
    fonts: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl MapFontFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font(mut self, obfuscation_id: &str, font: Vec<u8>) -> Self {
        self.fonts.insert(obfuscation_id.to_string(), font);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl FontFetcher for MapFontFetcher {
    fn fetch_font(&self, obfuscation_id: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().unwrap().push(obfuscation_id.to_string());
        self.fonts
            .get(obfuscation_id)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: format!("memory://{obfuscation_id}"),
                status: 404,
            })
    }
}
