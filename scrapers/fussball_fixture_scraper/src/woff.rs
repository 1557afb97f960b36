//! WOFF 1.0 unwrapping.
//!
//! fussball.de serves its obfuscation fonts as WOFF. `ttf_parser` only reads
//! plain SFNT data, so the WOFF table directory is walked here, compressed
//! tables are inflated, and an equivalent SFNT file is reassembled.
//! Anything that is not WOFF is handed through untouched.

use std::borrow::Cow;
use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::glyph_map::FontDecodeError;

const WOFF_SIGNATURE: &[u8; 4] = b"wOFF";
const WOFF2_SIGNATURE: &[u8; 4] = b"wOF2";
const WOFF_HEADER_LEN: usize = 44;
const WOFF_TABLE_ENTRY_LEN: usize = 20;
const SFNT_HEADER_LEN: usize = 12;
const SFNT_TABLE_RECORD_LEN: usize = 16;
/// Largest directory whose SFNT search fields still fit in 16 bits.
const MAX_SFNT_TABLES: usize = u16::MAX as usize / SFNT_TABLE_RECORD_LEN;
/// Upper bound on up-front allocation for one inflated table.
const MAX_PREALLOC: usize = 1 << 20;

struct WoffTable<'a> {
    tag: [u8; 4],
    checksum: u32,
    orig_length: usize,
    data: &'a [u8],
}

/// Returns SFNT bytes for `data`, unwrapping WOFF when needed.
pub fn to_sfnt(data: &[u8]) -> Result<Cow<'_, [u8]>, FontDecodeError> {
    match data.get(..4) {
        Some(signature) if signature == WOFF_SIGNATURE => unwrap_woff(data).map(Cow::Owned),
        Some(signature) if signature == WOFF2_SIGNATURE => {
            Err(FontDecodeError::UnsupportedContainer("WOFF2"))
        }
        _ => Ok(Cow::Borrowed(data)),
    }
}

fn unwrap_woff(data: &[u8]) -> Result<Vec<u8>, FontDecodeError> {
    if data.len() < WOFF_HEADER_LEN {
        return Err(FontDecodeError::Container("WOFF header is truncated"));
    }
    let flavor = read_u32(data, 4).ok_or(FontDecodeError::Container("missing flavor"))?;
    let num_tables =
        read_u16(data, 12).ok_or(FontDecodeError::Container("missing table count"))? as usize;
    if num_tables > MAX_SFNT_TABLES {
        return Err(FontDecodeError::Container("WOFF declares too many tables"));
    }

    let mut tables = Vec::with_capacity(num_tables);
    for i in 0..num_tables {
        let entry = WOFF_HEADER_LEN + i * WOFF_TABLE_ENTRY_LEN;
        let (Some(tag), Some(offset), Some(comp_length), Some(orig_length), Some(checksum)) = (
            data.get(entry..entry + 4),
            read_u32(data, entry + 4),
            read_u32(data, entry + 8),
            read_u32(data, entry + 12),
            read_u32(data, entry + 16),
        ) else {
            return Err(FontDecodeError::Container("WOFF table directory is truncated"));
        };

        let start = offset as usize;
        let end = start
            .checked_add(comp_length as usize)
            .ok_or(FontDecodeError::Container("WOFF table offset overflows"))?;
        let table_data = data
            .get(start..end)
            .ok_or(FontDecodeError::Container("WOFF table points outside the file"))?;

        let mut tag_bytes = [0u8; 4];
        tag_bytes.copy_from_slice(tag);
        tables.push(WoffTable {
            tag: tag_bytes,
            checksum,
            orig_length: orig_length as usize,
            data: table_data,
        });
    }

    // SFNT readers may binary-search the directory.
    tables.sort_by_key(|table| table.tag);

    let mut sfnt = Vec::new();
    write_sfnt_header(&mut sfnt, flavor, num_tables as u16);

    let mut offset = SFNT_HEADER_LEN + num_tables * SFNT_TABLE_RECORD_LEN;
    let mut body = Vec::new();
    for table in &tables {
        let decoded = decode_table(table)?;
        sfnt.extend_from_slice(&table.tag);
        sfnt.extend_from_slice(&table.checksum.to_be_bytes());
        sfnt.extend_from_slice(&(offset as u32).to_be_bytes());
        sfnt.extend_from_slice(&(decoded.len() as u32).to_be_bytes());

        body.extend_from_slice(&decoded);
        while body.len() % 4 != 0 {
            body.push(0);
        }
        offset = SFNT_HEADER_LEN + num_tables * SFNT_TABLE_RECORD_LEN + body.len();
    }
    sfnt.extend_from_slice(&body);
    Ok(sfnt)
}

fn decode_table<'a>(table: &WoffTable<'a>) -> Result<Cow<'a, [u8]>, FontDecodeError> {
    let data: &'a [u8] = table.data;
    if data.len() >= table.orig_length {
        // Stored uncompressed.
        return Ok(Cow::Borrowed(&data[..table.orig_length]));
    }

    // One byte past the declared length is enough to detect a mismatch.
    let mut inflated = Vec::with_capacity(table.orig_length.min(MAX_PREALLOC));
    ZlibDecoder::new(data)
        .take(table.orig_length as u64 + 1)
        .read_to_end(&mut inflated)
        .map_err(|source| FontDecodeError::Inflate {
            tag: String::from_utf8_lossy(&table.tag).into_owned(),
            source,
        })?;
    if inflated.len() != table.orig_length {
        return Err(FontDecodeError::Container(
            "inflated WOFF table does not match its declared length",
        ));
    }
    Ok(Cow::Owned(inflated))
}

/// Callers keep `num_tables` within [`MAX_SFNT_TABLES`].
fn write_sfnt_header(out: &mut Vec<u8>, flavor: u32, num_tables: u16) {
    let tables = u32::from(num_tables);
    let entry_selector = if tables > 0 { 31 - tables.leading_zeros() } else { 0 };
    let search_range = (1u32 << entry_selector) * SFNT_TABLE_RECORD_LEN as u32;
    let range_shift = (tables * SFNT_TABLE_RECORD_LEN as u32).saturating_sub(search_range);

    out.extend_from_slice(&flavor.to_be_bytes());
    out.extend_from_slice(&num_tables.to_be_bytes());
    out.extend_from_slice(&(search_range as u16).to_be_bytes());
    out.extend_from_slice(&(entry_selector as u16).to_be_bytes());
    out.extend_from_slice(&(range_shift as u16).to_be_bytes());
}

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    data.get(offset..offset + 2)
        .map(|bytes| u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    data.get(offset..offset + 4)
        .map(|bytes| u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
