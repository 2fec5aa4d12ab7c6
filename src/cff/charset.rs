use crate::stream::{Reader, Writer};
use crate::{Error, Result};

/// Charset offsets below this value select a predefined charset.
const PREDEFINED_CHARSETS: usize = 3;
const ISO_ADOBE: usize = 0;

/// How a charset is laid out in the font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharsetFormat {
    /// One SID per glyph.
    Format0,
    /// Ranges of SIDs with 8-bit run lengths.
    Format1,
    /// Ranges of SIDs with 16-bit run lengths.
    Format2,
}

/// Maps glyph IDs to string IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charset {
    pub format: CharsetFormat,
    /// One SID per glyph, starting with `.notdef` at index 0.
    pub sids: Vec<u16>,
}

impl Charset {
    pub fn glyph_for_sid(&self, sid: u16) -> Option<u16> {
        self.sids.iter().position(|&s| s == sid).map(|gid| gid as u16)
    }
}

/// Parse the charset at `offset` for a font with `num_glyphs` glyphs.
pub fn parse_charset(data: &[u8], offset: usize, num_glyphs: u16) -> Result<Charset> {
    if offset < PREDEFINED_CHARSETS {
        // The expert charsets would need their own tables and are hardly used.
        if offset != ISO_ADOBE {
            return Err(Error::Unimplemented);
        }

        // In the ISOAdobe charset, glyph IDs and SIDs coincide.
        return Ok(Charset { format: CharsetFormat::Format0, sids: (0..num_glyphs).collect() });
    }

    let mut r = Reader::new_at(data, offset);
    let format = r.read::<u8>().ok_or(Error::MissingData)?;
    let num_glyphs = usize::from(num_glyphs);
    let mut sids = Vec::with_capacity(num_glyphs);
    // The `.notdef` glyph is implicit.
    sids.push(0);

    let format = match format {
        0 => {
            for _ in 1..num_glyphs {
                sids.push(r.read::<u16>().ok_or(Error::MissingData)?);
            }
            CharsetFormat::Format0
        }
        1 | 2 => {
            while sids.len() < num_glyphs {
                let first = r.read::<u16>().ok_or(Error::MissingData)?;
                let left = if format == 1 {
                    r.read::<u8>().map(u16::from)
                } else {
                    r.read::<u16>()
                }
                .ok_or(Error::MissingData)?;

                for i in 0..=left {
                    if sids.len() == num_glyphs {
                        break;
                    }
                    sids.push(first.checked_add(i).ok_or(Error::MalformedFont)?);
                }
            }
            if format == 1 {
                CharsetFormat::Format1
            } else {
                CharsetFormat::Format2
            }
        }
        _ => return Err(Error::UnknownCharsetFormat(format)),
    };

    Ok(Charset { format, sids })
}

/// Write the charset in the format it was parsed from.
pub fn write_charset(w: &mut Writer, charset: &Charset) {
    let sids = charset.sids.get(1..).unwrap_or_default();

    match charset.format {
        CharsetFormat::Format0 => {
            w.write::<u8>(0);
            for sid in sids {
                w.write::<u16>(*sid);
            }
        }
        CharsetFormat::Format1 => {
            w.write::<u8>(1);
            for (first, left) in ranges(sids, u16::from(u8::MAX)) {
                w.write::<u16>(first);
                w.write::<u8>(left as u8);
            }
        }
        CharsetFormat::Format2 => {
            w.write::<u8>(2);
            for (first, left) in ranges(sids, u16::MAX) {
                w.write::<u16>(first);
                w.write::<u16>(left);
            }
        }
    }
}

/// Split SIDs into runs of consecutive values, each at most `max_left + 1` long.
fn ranges(sids: &[u16], max_left: u16) -> Vec<(u16, u16)> {
    let mut ranges: Vec<(u16, u16)> = vec![];
    for &sid in sids {
        match ranges.last_mut() {
            Some((first, left))
                if *left < max_left && first.checked_add(*left + 1) == Some(sid) =>
            {
                *left += 1;
            }
            _ => ranges.push((sid, 0)),
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(charset: &Charset) -> Vec<u8> {
        let mut w = Writer::new();
        write_charset(&mut w, charset);
        w.finish()
    }

    #[test]
    fn format_0() {
        let data = [0, 0, 5, 0, 9, 0, 7];
        let mut padded = vec![0; 3];
        padded.extend(data);
        let charset = parse_charset(&padded, 3, 4).unwrap();
        assert_eq!(charset.sids, vec![0, 5, 9, 7]);
        assert_eq!(charset.format, CharsetFormat::Format0);
        assert_eq!(written(&charset), data);
        assert_eq!(charset.glyph_for_sid(9), Some(2));
    }

    #[test]
    fn format_1_ranges() {
        let data = [1, 0, 10, 2, 0, 50, 0];
        let mut padded = vec![0; 3];
        padded.extend(data);
        let charset = parse_charset(&padded, 3, 5).unwrap();
        assert_eq!(charset.sids, vec![0, 10, 11, 12, 50]);
        assert_eq!(written(&charset), data);
        assert!(parse_charset(&padded, 3, 7).is_err());
    }

    #[test]
    fn format_2_long_runs() {
        let mut data = vec![0; 3];
        data.extend([2, 0, 1, 1, 0x2B]);
        let charset = parse_charset(&data, 3, 301).unwrap();
        assert_eq!(charset.sids.len(), 301);
        assert_eq!(charset.sids[300], 300);
        assert_eq!(written(&charset), &data[3..]);

        // The same run needs two ranges with 8-bit lengths.
        let charset = Charset { format: CharsetFormat::Format1, ..charset };
        assert_eq!(written(&charset), vec![1, 0, 1, 255, 1, 1, 43]);
    }

    #[test]
    fn zeroed_gaps_are_separate_ranges() {
        let charset = Charset { format: CharsetFormat::Format1, sids: vec![0, 0, 0, 7] };
        assert_eq!(written(&charset), vec![1, 0, 0, 0, 0, 0, 0, 0, 7, 0]);
    }

    #[test]
    fn predefined_charsets() {
        let charset = parse_charset(&[], 0, 3).unwrap();
        assert_eq!(charset.sids, vec![0, 1, 2]);
        assert!(matches!(parse_charset(&[], 1, 3), Err(Error::Unimplemented)));
    }

    #[test]
    fn unknown_format() {
        let data = [0, 0, 0, 3, 0, 0];
        assert!(matches!(parse_charset(&data, 3, 2), Err(Error::UnknownCharsetFormat(3))));
    }
}
