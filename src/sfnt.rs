//! The sfnt container: a header, a table directory and the 4-byte aligned
//! table data.

use crate::stream::{Readable, Reader, Writeable, Writer};
use crate::{Error, Result, Tag};
use log::{debug, trace};

/// The value the whole-file checksum is balanced against.
const CHECKSUM_MAGIC: u32 = 0xB1B0AFBA;

/// What kind of contents the font has.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FontKind {
    /// TrueType outlines.
    TrueType,
    /// CFF outlines.
    Cff,
    /// A font collection.
    Collection,
}

impl FontKind {
    fn from_u32(v: u32) -> Option<Self> {
        match v {
            0x00010000 | 0x74727565 => Some(FontKind::TrueType),
            0x4F54544F => Some(FontKind::Cff),
            0x74746366 => Some(FontKind::Collection),
            _ => None,
        }
    }
}

/// Locates a table in the font file.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TableRecord {
    pub tag: Tag,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

impl Readable<'_> for TableRecord {
    const SIZE: usize = 16;

    fn read(r: &mut Reader) -> Option<Self> {
        Some(TableRecord {
            tag: r.read::<Tag>()?,
            checksum: r.read::<u32>()?,
            offset: r.read::<u32>()?,
            length: r.read::<u32>()?,
        })
    }
}

impl Writeable for TableRecord {
    fn write(&self, w: &mut Writer) {
        w.write::<Tag>(self.tag);
        w.write::<u32>(self.checksum);
        w.write::<u32>(self.offset);
        w.write::<u32>(self.length);
    }
}

/// A font face with OpenType tables.
pub struct Face<'a> {
    data: &'a [u8],
    /// The raw sfnt version, written back unchanged.
    pub version: u32,
    pub kind: FontKind,
    records: Vec<TableRecord>,
}

impl<'a> Face<'a> {
    /// Parse a font face from OpenType data.
    pub fn parse(data: &'a [u8], index: u32) -> Result<Self> {
        let mut r = Reader::new(data);
        let mut version = r.read::<u32>().ok_or(Error::MissingData)?;
        let mut kind = FontKind::from_u32(version).ok_or(Error::UnknownKind)?;

        // Parse font collection header if necessary.
        if kind == FontKind::Collection {
            let offset = crate::stream::read_at::<u32>(data, 12 + 4 * index as usize)?;
            r = Reader::new_at(data, offset as usize);
            version = r.read::<u32>().ok_or(Error::InvalidOffset)?;
            kind = FontKind::from_u32(version).ok_or(Error::UnknownKind)?;
            if kind == FontKind::Collection {
                return Err(Error::UnknownKind);
            }
        }

        // Read number of table records and skip the search fields.
        let count = r.read::<u16>().ok_or(Error::MissingData)?;
        r.skip_bytes(6).ok_or(Error::MissingData)?;

        let mut records = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            records.push(r.read::<TableRecord>().ok_or(Error::MissingData)?);
        }

        records.sort_by_key(|record| record.tag);

        if records.iter().any(|record| record.tag == Tag::CFF) {
            kind = FontKind::Cff;
        }

        Ok(Face { data, version, kind, records })
    }

    /// The data of a table, if it exists.
    pub fn table(&self, tag: Tag) -> Option<&'a [u8]> {
        let i = self.records.binary_search_by(|record| record.tag.cmp(&tag)).ok()?;
        let record = self.records.get(i)?;
        let start = record.offset as usize;
        let end = start.checked_add(record.length as usize)?;
        self.data.get(start..end)
    }

    /// The data of a table that must exist.
    pub fn expect_table(&self, tag: Tag) -> Result<&'a [u8]> {
        self.table(tag).ok_or(Error::MissingTable(tag))
    }

    /// All tags present in the table directory.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.records.iter().map(|record| record.tag)
    }
}

/// Assemble a font file from the given tables.
///
/// If a `head` table is present, its checksum adjustment is computed over the
/// finished file and patched in.
pub fn construct(version: u32, mut tables: Vec<(Tag, Vec<u8>)>) -> Vec<u8> {
    // Tables shall be sorted by tag.
    tables.sort_by_key(|&(tag, _)| tag);

    let count = tables.len() as u16;
    let mut w = Writer::with_capacity(
        12 + 16 * tables.len() + tables.iter().map(|(_, t)| t.len() + 3).sum::<usize>(),
    );
    w.write::<u32>(version);

    // Write table directory.
    let entry_selector = if count == 0 { 0 } else { 15 - count.leading_zeros() as u16 };
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = (count * 16).saturating_sub(search_range);
    w.write(count);
    w.write(search_range);
    w.write(entry_selector);
    w.write(range_shift);

    // This variable will hold the offset to the checksum adjustment field
    // in the head table, which we'll have to write in the end (after
    // checksumming the whole font).
    let mut checksum_adjustment_offset = None;

    // Write table records.
    let mut offset = 12 + tables.len() * 16;
    for (tag, data) in &mut tables {
        if *tag == Tag::HEAD {
            // Zero out checksum field in head table.
            if let Some(field) = data.get_mut(8..12) {
                field.fill(0);
                checksum_adjustment_offset = Some(offset + 8);
            }
        }

        let len = data.len();
        w.write(TableRecord {
            tag: *tag,
            checksum: checksum(data),
            offset: offset as u32,
            length: len as u32,
        });

        trace!("{tag}: {len} bytes at {offset}");

        // Increase offset, plus padding zeros to align to 4 bytes.
        offset += len;
        while offset % 4 != 0 {
            offset += 1;
        }
    }

    // Write tables.
    for (_, data) in &tables {
        // Write data plus padding zeros to align to 4 bytes.
        w.extend(data);
        w.align(4);
    }

    let mut data = w.finish();

    // Write checksum adjustment field in head table.
    if let Some(i) = checksum_adjustment_offset {
        let sum = checksum(&data);
        let val = CHECKSUM_MAGIC.wrapping_sub(sum);
        data[i..i + 4].copy_from_slice(&val.to_be_bytes());
        debug!("checksum adjustment {val:#010x}");
    }

    data
}

/// Calculate a checksum over the data, four bytes at a time.
///
/// The bytes of each group are weighted with `8, 4, 2, 1` and summed with
/// wrapping arithmetic. If the data length is not a multiple of four, it is
/// treated as if padded with zeros.
pub fn checksum(data: &[u8]) -> u32 {
    let mut sum = 0u32;
    for chunk in data.chunks(4) {
        let mut bytes = [0; 4];
        bytes[..chunk.len()].copy_from_slice(chunk);
        let [a, b, c, d] = bytes.map(u32::from);
        sum = sum
            .wrapping_add(a << 3)
            .wrapping_add(b << 2)
            .wrapping_add(c << 1)
            .wrapping_add(d);
    }
    sum
}
