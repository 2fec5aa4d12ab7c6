use crate::cff::charset::Charset;
use crate::cff::strings::STANDARD_ENCODING;
use crate::stream::Reader;
use crate::{Error, Result};

/// Enumerates encoding IDs defined in the Adobe Technical Note #5176, Table 16
const STANDARD: usize = 0;
const EXPERT: usize = 1;

/// Maps character codes to glyphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding {
    Standard,
    Expert,
    Custom {
        /// The code of each glyph, starting at glyph 1.
        codes: Vec<u8>,
        /// Additional codes that map to the glyph with the given SID.
        supplements: Vec<(u8, u16)>,
    },
}

impl Encoding {
    /// The glyph a character code maps to.
    pub fn glyph_index(&self, charset: &Charset, code: u8) -> Option<u16> {
        match self {
            Encoding::Standard => {
                let sid = STANDARD_ENCODING[usize::from(code)];
                if sid == 0 {
                    return None;
                }
                charset.glyph_for_sid(u16::from(sid))
            }
            // Expert encoding needs a table of its own.
            Encoding::Expert => None,
            Encoding::Custom { codes, supplements } => {
                // +1 because .notdef is implicit.
                if let Some(i) = codes.iter().position(|&c| c == code) {
                    return Some(i as u16 + 1);
                }

                let &(_, sid) = supplements.iter().find(|(c, _)| *c == code)?;
                charset.glyph_for_sid(sid)
            }
        }
    }
}

/// Parse the encoding at `offset`.
pub fn parse_encoding(data: &[u8], offset: usize) -> Result<Encoding> {
    match offset {
        STANDARD => return Ok(Encoding::Standard),
        EXPERT => return Ok(Encoding::Expert),
        _ => {}
    }

    let mut r = Reader::new_at(data, offset);
    let format = r.read::<u8>().ok_or(Error::MissingData)?;
    // The high bit in the format indicates that supplements follow.
    let has_supplements = format & 0x80 != 0;

    let mut codes = vec![];
    match format & 0x7f {
        0 => {
            let count = r.read::<u8>().ok_or(Error::MissingData)?;
            let bytes = r.read_bytes(usize::from(count)).ok_or(Error::MissingData)?;
            codes.extend_from_slice(bytes);
        }
        1 => {
            let count = r.read::<u8>().ok_or(Error::MissingData)?;
            for _ in 0..count {
                let first = r.read::<u8>().ok_or(Error::MissingData)?;
                let left = r.read::<u8>().ok_or(Error::MissingData)?;
                codes.extend((0..=left).map(|i| first.wrapping_add(i)));
            }
        }
        other => return Err(Error::UnknownEncodingFormat(other)),
    }

    let mut supplements = vec![];
    if has_supplements {
        let count = r.read::<u8>().ok_or(Error::MissingData)?;
        for _ in 0..count {
            let code = r.read::<u8>().ok_or(Error::MissingData)?;
            let sid = r.read::<u16>().ok_or(Error::MissingData)?;
            supplements.push((code, sid));
        }
    }

    Ok(Encoding::Custom { codes, supplements })
}
