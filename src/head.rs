//! The `head` table is decoded field by field and written back with a zeroed
//! checksum adjustment, which is patched in once the whole file is assembled.

use crate::stream::{Reader, Writer};
use crate::{Error, Result};

const MAGIC_NUMBER: u32 = 0x5F0F3CF5;

/// The font header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    pub font_revision: u32,
    pub flags: u16,
    pub units_per_em: u16,
    pub created: [u8; 8],
    pub modified: [u8; 8],
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: u16,
    pub lowest_rec_ppem: u16,
    pub font_direction_hint: i16,
    /// 0 for short `loca` offsets, 1 for long ones.
    pub index_to_loc_format: i16,
    pub glyph_data_format: i16,
}

impl Head {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        r.skip_bytes(4).ok_or(Error::MissingData)?; // version
        let font_revision = r.read::<u32>().ok_or(Error::MissingData)?;
        r.skip::<u32>().ok_or(Error::MissingData)?; // checksum adjustment
        if r.read::<u32>() != Some(MAGIC_NUMBER) {
            return Err(Error::MalformedFont);
        }

        let flags = r.read::<u16>().ok_or(Error::MissingData)?;
        let units_per_em = r.read::<u16>().ok_or(Error::MissingData)?;
        let created = r.read::<[u8; 8]>().ok_or(Error::MissingData)?;
        let modified = r.read::<[u8; 8]>().ok_or(Error::MissingData)?;

        Ok(Head {
            font_revision,
            flags,
            units_per_em,
            created,
            modified,
            x_min: r.read::<i16>().ok_or(Error::MissingData)?,
            y_min: r.read::<i16>().ok_or(Error::MissingData)?,
            x_max: r.read::<i16>().ok_or(Error::MissingData)?,
            y_max: r.read::<i16>().ok_or(Error::MissingData)?,
            mac_style: r.read::<u16>().ok_or(Error::MissingData)?,
            lowest_rec_ppem: r.read::<u16>().ok_or(Error::MissingData)?,
            font_direction_hint: r.read::<i16>().ok_or(Error::MissingData)?,
            index_to_loc_format: r.read::<i16>().ok_or(Error::MissingData)?,
            glyph_data_format: r.read::<i16>().ok_or(Error::MissingData)?,
        })
    }

    pub fn write(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(54);
        w.write::<u16>(1);
        w.write::<u16>(0);
        w.write::<u32>(self.font_revision);
        w.write::<u32>(0);
        w.write::<u32>(MAGIC_NUMBER);
        w.write::<u16>(self.flags);
        w.write::<u16>(self.units_per_em);
        w.write(self.created);
        w.write(self.modified);
        w.write::<i16>(self.x_min);
        w.write::<i16>(self.y_min);
        w.write::<i16>(self.x_max);
        w.write::<i16>(self.y_max);
        w.write::<u16>(self.mac_style);
        w.write::<u16>(self.lowest_rec_ppem);
        w.write::<i16>(self.font_direction_hint);
        w.write::<i16>(self.index_to_loc_format);
        w.write::<i16>(self.glyph_data_format);
        w.finish()
    }
}
