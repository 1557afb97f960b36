//! Rewrites glyph-obfuscated spans back to readable text.
//!
//! fussball.de wraps dates, times, scores and venues in
//! `<span data-obfuscation="{id}">` elements whose text only reads correctly
//! when drawn with the font issued for `{id}`. Every distinct id is resolved
//! through one font download, then all text beneath that id's spans is
//! substituted in place. Markup outside those text nodes is left alone.

use std::collections::{BTreeSet, HashMap};

use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};

use crate::glyph_map::{FontDecodeError, GlyphMap};
use crate::http::FetchError;
use crate::utils::selector;

/// Source of font bytes for an obfuscation id.
pub trait FontFetcher {
    fn fetch_font(&self, obfuscation_id: &str) -> Result<Vec<u8>, FetchError>;
}

impl<T: FontFetcher + ?Sized> FontFetcher for &T {
    fn fetch_font(&self, obfuscation_id: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch_font(obfuscation_id)
    }
}

impl<T: FontFetcher + ?Sized> FontFetcher for Box<T> {
    fn fetch_font(&self, obfuscation_id: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch_font(obfuscation_id)
    }
}

/// Literal fixups applied after substitution, most specific first.
const CLEANUP_PATTERNS: [(&str, &str); 10] = [
    ("k.A. bar k.A. bar k.A.", "k.A. | k.A. | k.A."),
    (" bar ", " | "),
    ("germandbls", "ß"),
    ("Adieresis", "Ä"),
    ("Odieresis", "Ö"),
    ("Udieresis", "Ü"),
    ("adieresis", "ä"),
    ("odieresis", "ö"),
    ("udieresis", "ü"),
    ("\u{a0}", " "),
];

pub fn cleanup(text: &str) -> String {
    CLEANUP_PATTERNS
        .iter()
        .fold(text.to_string(), |acc, (pattern, replacement)| {
            if acc.contains(pattern) {
                acc.replace(pattern, replacement)
            } else {
                acc
            }
        })
}

#[derive(Debug, thiserror::Error)]
pub enum GroupFailure {
    #[error("font download failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("font could not be decoded: {0}")]
    Decode(#[from] FontDecodeError),
}

#[derive(Debug)]
pub struct GroupReport {
    pub obfuscation_id: String,
    pub spans: usize,
    pub text_nodes_rewritten: usize,
    /// Set when the group was left obfuscated.
    pub failure: Option<GroupFailure>,
    /// Glyph names written literally because no character is known for them.
    pub unresolved_glyphs: BTreeSet<String>,
}

impl GroupReport {
    pub fn is_resolved(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Default)]
pub struct DeobfuscationReport {
    pub groups: Vec<GroupReport>,
}

impl DeobfuscationReport {
    pub fn failed_groups(&self) -> impl Iterator<Item = &GroupReport> {
        self.groups.iter().filter(|group| !group.is_resolved())
    }

    pub fn has_unresolved_glyphs(&self) -> bool {
        self.groups
            .iter()
            .any(|group| !group.unresolved_glyphs.is_empty())
    }
}

pub struct Deobfuscated {
    pub html: String,
    pub report: DeobfuscationReport,
}

pub struct Deobfuscator<F: FontFetcher> {
    fetcher: F,
}

impl<F: FontFetcher> Deobfuscator<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn deobfuscate(&self, html: &str) -> String {
        self.deobfuscate_with_report(html).html
    }

    pub fn deobfuscate_with_report(&self, html: &str) -> Deobfuscated {
        let mut document = Html::parse_document(html);

        // (id, span count, text nodes) in document order. A text node belongs
        // to its nearest obfuscated ancestor only.
        let mut groups: Vec<(String, usize, Vec<_>)> = Vec::new();
        let mut index_by_id: HashMap<String, usize> = HashMap::new();
        for element in document.select(&selector("[data-obfuscation]")) {
            let Some(id) = element.value().attr("data-obfuscation") else {
                continue;
            };
            let index = *index_by_id.entry(id.to_string()).or_insert_with(|| {
                groups.push((id.to_string(), 0, Vec::new()));
                groups.len() - 1
            });

            let (_, spans, text_nodes) = &mut groups[index];
            *spans += 1;
            text_nodes.extend(
                element
                    .descendants()
                    .filter(|node| node.value().is_text())
                    .filter(|node| {
                        node.ancestors()
                            .filter_map(ElementRef::wrap)
                            .find(|ancestor| ancestor.value().attr("data-obfuscation").is_some())
                            .map(|ancestor| ancestor.id())
                            == Some(element.id())
                    })
                    .map(|node| node.id()),
            );
        }

        if groups.is_empty() {
            return Deobfuscated {
                html: html.to_string(),
                report: DeobfuscationReport::default(),
            };
        }

        let mut report = DeobfuscationReport::default();
        for (obfuscation_id, spans, text_nodes) in groups {
            let mut group_report = GroupReport {
                obfuscation_id,
                spans,
                text_nodes_rewritten: 0,
                failure: None,
                unresolved_glyphs: BTreeSet::new(),
            };

            let glyph_map = match self.load_glyph_map(&group_report.obfuscation_id) {
                Ok(glyph_map) => glyph_map,
                Err(failure) => {
                    warn!(
                        "Leaving {} span(s) of obfuscation group {} untouched: {}",
                        group_report.spans, group_report.obfuscation_id, failure
                    );
                    group_report.failure = Some(failure);
                    report.groups.push(group_report);
                    continue;
                }
            };

            for node_id in text_nodes {
                let Some(mut node) = document.tree.get_mut(node_id) else {
                    continue;
                };
                if let scraper::Node::Text(text) = node.value() {
                    let substituted =
                        glyph_map.substitute_tracking(&text.text, &mut group_report.unresolved_glyphs);
                    text.text = cleanup(&substituted).as_str().into();
                    group_report.text_nodes_rewritten += 1;
                }
            }

            if !group_report.unresolved_glyphs.is_empty() {
                warn!(
                    "Obfuscation group {} contains glyphs without a known character: {:?}",
                    group_report.obfuscation_id, group_report.unresolved_glyphs
                );
            }
            debug!(
                "Rewrote {} text node(s) in obfuscation group {}",
                group_report.text_nodes_rewritten, group_report.obfuscation_id
            );
            report.groups.push(group_report);
        }

        info!(
            "De-obfuscated {} of {} obfuscation group(s)",
            report.groups.iter().filter(|group| group.is_resolved()).count(),
            report.groups.len()
        );

        Deobfuscated {
            html: document.html(),
            report,
        }
    }

    fn load_glyph_map(&self, obfuscation_id: &str) -> Result<GlyphMap, GroupFailure> {
        let font = self.fetcher.fetch_font(obfuscation_id)?;
        let glyph_map = GlyphMap::build(&font)?;
        debug!(
            "Font for obfuscation group {} maps {} code point(s)",
            obfuscation_id,
            glyph_map.len()
        );
        Ok(glyph_map)
    }
}
