//! Only the glyph count of `maxp` changes when subsetting. The remaining
//! version 1.0 limits stay valid, since outlines are only ever removed.

use crate::stream::{Reader, Writer};
use crate::{Error, Result};

/// The maximum profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maxp {
    pub version: u32,
    pub num_glyphs: u16,
    /// The 13 limits of a version 1.0 table, absent for version 0.5.
    pub limits: Option<[u16; 13]>,
}

impl Maxp {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        let version = r.read::<u32>().ok_or(Error::MissingData)?;
        let num_glyphs = r.read::<u16>().ok_or(Error::MissingData)?;

        let limits = if version >= 0x00010000 {
            let mut limits = [0; 13];
            for limit in &mut limits {
                *limit = r.read::<u16>().ok_or(Error::MissingData)?;
            }
            Some(limits)
        } else {
            None
        };

        Ok(Maxp { version, num_glyphs, limits })
    }

    pub fn write(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(32);
        w.write::<u32>(self.version);
        w.write::<u16>(self.num_glyphs);
        if let Some(limits) = &self.limits {
            for limit in limits {
                w.write::<u16>(*limit);
            }
        }
        w.finish()
    }
}
