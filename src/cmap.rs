//! Reading the glyph-to-Unicode mapping out of the Unicode `cmap` subtables.
//! Formats 4 and 12 are supported.

use crate::stream::{read_at, Readable, Reader};
use std::collections::BTreeMap;

#[derive(Debug)]
struct EncodingRecord {
    platform_id: u16,
    encoding_id: u16,
    subtable_offset: u32,
}

impl EncodingRecord {
    fn is_unicode(&self) -> bool {
        self.platform_id == 0
            || (self.platform_id == 3 && [0, 1, 10].contains(&self.encoding_id))
    }
}

impl Readable<'_> for EncodingRecord {
    const SIZE: usize = 8;

    fn read(r: &mut Reader) -> Option<Self> {
        let platform_id = r.read::<u16>()?;
        let encoding_id = r.read::<u16>()?;
        let subtable_offset = r.read::<u32>()?;

        Some(EncodingRecord { platform_id, encoding_id, subtable_offset })
    }
}

/// Map every glyph reachable from a Unicode subtable to the lowest code point
/// that maps to it.
pub fn glyph_to_unicode(cmap: &[u8]) -> BTreeMap<u16, char> {
    let mut map = BTreeMap::new();
    let mut insert = |c: u32, gid: u16| {
        let Some(c) = char::from_u32(c) else { return };
        if gid != 0 {
            map.entry(gid).and_modify(|prev: &mut char| *prev = (*prev).min(c)).or_insert(c);
        }
    };

    let mut r = Reader::new(cmap);
    let num_tables = r.skip::<u16>().and_then(|_| r.read::<u16>()).unwrap_or(0);

    for _ in 0..num_tables {
        let Some(record) = r.read::<EncodingRecord>() else { break };
        if !record.is_unicode() {
            continue;
        }

        let Some(data) = cmap.get(record.subtable_offset as usize..) else { continue };
        let parsed = match read_at::<u16>(data, 0).ok() {
            Some(4) => Subtable4::parse(data).map(|t| t.mappings(&mut insert)),
            Some(12) => Subtable12::parse(data).map(|t| t.mappings(&mut insert)),
            _ => Some(()),
        };

        if parsed.is_none() {
            log::warn!("skipping malformed cmap subtable at {}", record.subtable_offset);
        }
    }

    map
}

/// A format 4 subtable.
struct Subtable4<'a> {
    end_codes: Vec<u16>,
    start_codes: Vec<u16>,
    id_deltas: Vec<i16>,
    id_range_offsets: Vec<u16>,
    glyph_id_array: &'a [u8],
}

impl<'a> Subtable4<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        let mut r = Reader::new(data);
        r.skip_bytes(6)?; // format + length + language
        let seg_count = usize::from(r.read::<u16>()? / 2);
        r.skip_bytes(6)?; // search range + entry selector + range shift

        let read_vec = |r: &mut Reader<'a>| -> Option<Vec<u16>> {
            (0..seg_count).map(|_| r.read::<u16>()).collect()
        };

        let end_codes = read_vec(&mut r)?;
        r.skip::<u16>()?; // reserved pad
        let start_codes = read_vec(&mut r)?;
        let id_deltas = read_vec(&mut r)?.into_iter().map(|d| d as i16).collect();
        let glyph_id_array = r.tail()?;
        let id_range_offsets = read_vec(&mut r)?;

        Some(Subtable4 { end_codes, start_codes, id_deltas, id_range_offsets, glyph_id_array })
    }

    /// Returns a glyph index for a code point in the given segment.
    fn glyph_index(&self, index: usize, code_point: u16) -> Option<u16> {
        let start_value = self.start_codes[index];
        let id_range_offset = self.id_range_offsets[index];
        let id_delta = self.id_deltas[index];

        if id_range_offset == 0 {
            return Some(code_point.wrapping_add(id_delta as u16));
        } else if id_range_offset == 0xFFFF {
            // Some malformed fonts have 0xFFFF as the last offset,
            // which is invalid and should be ignored.
            return None;
        }

        let delta = (code_point - start_value).wrapping_mul(2);
        let pos = ((index * 2) as u16).wrapping_add(delta).wrapping_add(id_range_offset);
        let glyph_array_value = read_at::<u16>(self.glyph_id_array, usize::from(pos)).ok()?;

        // 0 indicates missing glyph.
        if glyph_array_value == 0 {
            return None;
        }

        Some((glyph_array_value as i16).wrapping_add(id_delta) as u16)
    }

    fn mappings(&self, mut f: impl FnMut(u32, u16)) {
        for (index, (start, end)) in self.start_codes.iter().zip(&self.end_codes).enumerate() {
            // 0xFFFF value is special and indicates codes end.
            if *start == 0xFFFF && *end == 0xFFFF {
                break;
            }

            for code_point in *start..=*end {
                if let Some(gid) = self.glyph_index(index, code_point) {
                    f(u32::from(code_point), gid);
                }
            }
        }
    }
}

/// A format 12 subtable.
struct Subtable12 {
    /// Start code, end code and start glyph of each group.
    groups: Vec<(u32, u32, u32)>,
}

impl Subtable12 {
    fn parse(data: &[u8]) -> Option<Self> {
        let mut r = Reader::new(data);
        r.skip_bytes(12)?; // format + reserved + length + language
        let num_groups = r.read::<u32>()?;

        let mut groups = vec![];
        for _ in 0..num_groups {
            groups.push((r.read::<u32>()?, r.read::<u32>()?, r.read::<u32>()?));
        }

        Some(Subtable12 { groups })
    }

    fn mappings(&self, mut f: impl FnMut(u32, u16)) {
        for &(start, end, start_glyph) in &self.groups {
            for code_point in start..=end.min(char::MAX as u32) {
                let Some(gid) = start_glyph.checked_add(code_point - start) else { break };
                let Ok(gid) = u16::try_from(gid) else { break };
                f(code_point, gid);
            }
        }
    }
}
