//! Parsing and subsetting of the Compact Font Format.
//!
//! Glyph IDs are never renumbered. Charstrings of glyphs that are not needed are
//! replaced by a single `endchar`, and subroutines that no retained glyph calls
//! are emptied. The result is written as a bare, single-font CFF program.

mod argstack;
mod charset;
mod charstring;
mod dict;
mod encoding;
mod index;
mod number;
mod strings;

use self::charset::{parse_charset, write_charset, Charset};
use self::charstring::Tracer;
use self::dict::{PrivateDict, TopDict};
use self::encoding::{parse_encoding, Encoding};
use self::index::{index_len, parse_index, write_index, OffsetSize};
use self::number::encoded_len;
use self::strings::{STANDARD_STRINGS, STANDARD_STRINGS_LEN};
use crate::stream::{Reader, Writer};
use crate::{Error, Result};
use log::{debug, trace, warn};
use std::collections::BTreeSet;

/// The byte sequence [14] is the minimal valid charstring consisting of just a
/// single `endchar` operator.
const EMPTY_CHARSTRING: [u8; 1] = [14];

/// Each offset can change its width at most three times.
const MAX_OFFSET_PASSES: usize = 10;

/// A parsed CFF program.
#[derive(Debug, Clone)]
pub struct Cff {
    names: Vec<Vec<u8>>,
    /// The custom strings, with SIDs starting after the standard strings.
    strings: Vec<Vec<u8>>,
    global_subrs: Vec<Vec<u8>>,
    fonts: Vec<CffFont>,
}

/// One font of a CFF program.
#[derive(Debug, Clone)]
struct CffFont {
    top_dict: TopDict,
    char_strings: Vec<Vec<u8>>,
    charset: Charset,
    /// Absent for CID-keyed fonts.
    encoding: Option<Encoding>,
    private_dict: Option<PrivateDict>,
    local_subrs: Vec<Vec<u8>>,
}

impl Cff {
    /// Parse a CFF program, as found in the `CFF ` table of an OpenType font.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        let major = r.read::<u8>().ok_or(Error::MissingData)?;
        if major != 1 {
            return Err(Error::Unimplemented);
        }

        r.skip::<u8>().ok_or(Error::MissingData)?;
        let header_size = r.read::<u8>().ok_or(Error::MissingData)?;
        r.jump(usize::from(header_size));

        // Read four indices at fixed positions.
        let names = parse_index(&mut r)?;
        let top_dicts = parse_index(&mut r)?;
        let strings = parse_index(&mut r)?;
        let global_subrs = parse_index(&mut r)?;

        if names.len() == 0 || names.len() != top_dicts.len() {
            return Err(Error::MalformedFont);
        }

        let fonts = top_dicts
            .iter()
            .map(|top_dict| parse_font(data, top_dict))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            names: names.to_vec(),
            strings: strings.to_vec(),
            global_subrs: global_subrs.to_vec(),
            fonts,
        })
    }

    /// Subset the font at `font_index` to the requested glyphs.
    ///
    /// Glyphs that accented characters are built from are added to the
    /// request. Returns the glyphs that were retained, which always include
    /// glyph 0.
    pub fn subset(
        &mut self,
        font_index: usize,
        requested: &BTreeSet<u16>,
    ) -> Result<BTreeSet<u16>> {
        let font = self.fonts.get_mut(font_index).ok_or(Error::MissingData)?;
        if font.top_dict.is_cid() {
            // Rewriting FDArray and FDSelect is not supported.
            return Err(Error::Unimplemented);
        }

        let num_glyphs = font.char_strings.len();
        let mut retained = BTreeSet::new();
        let mut tracer = Tracer::new(&font.local_subrs, &self.global_subrs);
        let mut stack: Vec<u16> = requested.iter().copied().collect();
        stack.push(0);

        while let Some(gid) = stack.pop() {
            if !retained.insert(gid) {
                continue;
            }

            let charstring =
                font.char_strings.get(usize::from(gid)).ok_or(Error::InvalidGlyph(gid))?;
            let Some(codes) = tracer.trace(charstring)? else { continue };

            // The components of an accented character are addressed by their
            // code in the standard encoding.
            for code in codes {
                match Encoding::Standard.glyph_index(&font.charset, code) {
                    Some(component) => {
                        trace!("glyph {gid} is built from glyph {component}");
                        stack.push(component);
                    }
                    None => warn!("glyph {gid} uses missing standard code {code}"),
                }
            }
        }

        let used_local = std::mem::take(&mut tracer.used_local);
        let used_global = std::mem::take(&mut tracer.used_global);
        drop(tracer);

        let max_cp = retained.last().map_or(1, |&gid| usize::from(gid) + 1);
        font.char_strings.truncate(max_cp);
        font.charset.sids.truncate(max_cp);
        for gid in 0..max_cp {
            if !retained.contains(&(gid as u16)) {
                font.char_strings[gid] = EMPTY_CHARSTRING.to_vec();
                font.charset.sids[gid] = 0;
            }
        }

        prune_subrs(&mut font.local_subrs, &used_local);
        prune_subrs(&mut self.global_subrs, &used_global);

        // The subset is addressed by glyph ID, so the encoding is dropped.
        font.encoding = None;

        debug!(
            "retained {} of {} glyphs, {} local and {} global subroutines",
            retained.len(),
            num_glyphs,
            used_local.len(),
            used_global.len(),
        );

        Ok(retained)
    }

    /// Write the font at `font_index` as a standalone CFF program.
    pub fn write(&self, font_index: usize) -> Result<Vec<u8>> {
        let font = self.fonts.get(font_index).ok_or(Error::MissingData)?;
        let name = self.names.get(font_index).ok_or(Error::MissingData)?;
        let names = [name.as_slice()];

        let mut char_strings = Writer::new();
        write_index(&mut char_strings, &font.char_strings);
        let char_strings = char_strings.finish();

        let mut charset = Writer::new();
        write_charset(&mut charset, &font.charset);
        let charset = charset.finish();

        let private_dict = match &font.private_dict {
            Some(dict) => {
                let mut dict = dict.clone();
                Some(if font.local_subrs.is_empty() {
                    dict.subrs = None;
                    dict.to_vec()
                } else {
                    dict.to_vec_with_subrs()?
                })
            }
            None => None,
        };

        let mut top_dict = font.top_dict.clone();
        top_dict.encoding = None;

        // Everything after the four fixed indices, relative to where they end.
        let charset_start = char_strings.len();
        let private_start = charset_start + charset.len();
        let place = |top_dict: &mut TopDict, base: usize| {
            top_dict.char_strings = Some(base);
            top_dict.charset = Some(base + charset_start);
            top_dict.private =
                private_dict.as_ref().map(|data| (data.len(), base + private_start));
        };

        let fixed_len = |top_dict: &TopDict| {
            4 + index_len(&names)
                + index_len(&[top_dict.to_vec()])
                + index_len(&self.strings)
                + index_len(&self.global_subrs)
        };

        // The Top DICT contains offsets to data that comes after it, so its
        // own length depends on their encoded width. Widths only grow with the
        // base, so starting from zero reaches the fixed point from below.
        let widths = |base: usize| {
            [0, charset_start, private_start]
                .map(|offset| encoded_len(i32::try_from(base + offset).unwrap_or(i32::MAX)))
        };

        let mut base = 0;
        for _ in 0..MAX_OFFSET_PASSES {
            place(&mut top_dict, base);
            let len = fixed_len(&top_dict);
            let settled = widths(len) == widths(base);
            trace!("placing CFF data at {len} instead of {base}");
            base = len;
            if settled {
                break;
            }
        }

        place(&mut top_dict, base);
        let corrected = fixed_len(&top_dict);
        if corrected != base {
            return Err(Error::OffsetDrift);
        }

        let mut w = Writer::with_capacity(corrected + private_start + char_strings.len());

        // Header with absolute offset size patched in below.
        w.write::<[u8; 4]>([1, 0, 4, 0]);
        write_index(&mut w, &names);
        write_index(&mut w, &[top_dict.to_vec()]);
        write_index(&mut w, &self.strings);
        write_index(&mut w, &self.global_subrs);

        if w.len() != corrected {
            return Err(Error::OffsetDrift);
        }

        w.extend(&char_strings);
        w.extend(&charset);
        if let Some(private_dict) = &private_dict {
            w.extend(private_dict);
            if !font.local_subrs.is_empty() {
                write_index(&mut w, &font.local_subrs);
            }
        }

        let mut data = w.finish();
        data[3] = OffsetSize::for_max(data.len() as u32) as u8;
        debug!("wrote CFF program with {} bytes", data.len());

        Ok(data)
    }

    /// The number of glyphs in the first font.
    pub fn num_glyphs(&self) -> u16 {
        self.first().char_strings.len() as u16
    }

    /// The name of the first font.
    pub fn font_name(&self) -> Option<&str> {
        std::str::from_utf8(self.names.first()?).ok()
    }

    /// Resolve a string ID to a standard or custom string.
    pub fn string(&self, sid: u16) -> Option<&str> {
        let sid = usize::from(sid);
        if sid < STANDARD_STRINGS_LEN {
            return Some(STANDARD_STRINGS[sid]);
        }

        std::str::from_utf8(self.strings.get(sid - STANDARD_STRINGS_LEN)?).ok()
    }

    /// The name of a glyph in the first font.
    pub fn glyph_name(&self, gid: u16) -> Option<&str> {
        let sid = *self.first().charset.sids.get(usize::from(gid))?;
        self.string(sid)
    }

    /// The glyph a character code maps to through the encoding of the first
    /// font.
    pub fn glyph_index(&self, code: u8) -> Option<u16> {
        let font = self.first();
        font.encoding.as_ref()?.glyph_index(&font.charset, code)
    }

    /// The dominant width of vertical stems of the first font.
    pub fn std_vw(&self) -> Option<f64> {
        self.first().private_dict.as_ref()?.std_vw()
    }

    pub(crate) fn italic_angle(&self) -> f64 {
        self.first().top_dict.italic_angle()
    }

    pub(crate) fn is_fixed_pitch(&self) -> bool {
        self.first().top_dict.is_fixed_pitch()
    }

    fn first(&self) -> &CffFont {
        // Parsing guarantees at least one font.
        &self.fonts[0]
    }
}

fn parse_font(data: &[u8], top_dict: &[u8]) -> Result<CffFont> {
    let top_dict = TopDict::parse(top_dict)?;
    if top_dict.charstring_type() != 2 {
        return Err(Error::Unimplemented);
    }

    let offset = top_dict.char_strings.ok_or(Error::MalformedFont)?;
    let char_strings = parse_index(&mut Reader::new_at(data, offset))?.to_vec();
    if char_strings.is_empty() {
        return Err(Error::MalformedFont);
    }

    let num_glyphs = char_strings.len() as u16;
    let charset = parse_charset(data, top_dict.charset.unwrap_or(0), num_glyphs)?;
    let encoding = if top_dict.is_cid() {
        None
    } else {
        Some(parse_encoding(data, top_dict.encoding.unwrap_or(0))?)
    };

    let mut private_dict = None;
    let mut local_subrs = vec![];
    if let Some((size, start)) = top_dict.private {
        let end = start.checked_add(size).ok_or(Error::InvalidOffset)?;
        let dict = PrivateDict::parse(data.get(start..end).ok_or(Error::InvalidOffset)?)?;

        if let Some(offset) = dict.subrs {
            let offset = start.checked_add(offset).ok_or(Error::InvalidOffset)?;
            local_subrs = parse_index(&mut Reader::new_at(data, offset))?.to_vec();
        }

        private_dict = Some(dict);
    }

    Ok(CffFont { top_dict, char_strings, charset, encoding, private_dict, local_subrs })
}

/// Empty all subroutines that are not used and cut off unused ones at the end.
///
/// The INDEX never shrinks below the threshold of its bias band, because that
/// would change the bias and thus the meaning of all call sites.
fn prune_subrs(subrs: &mut Vec<Vec<u8>>, used: &BTreeSet<usize>) {
    let count = subrs.len();
    for (i, subr) in subrs.iter_mut().enumerate() {
        if !used.contains(&i) {
            subr.clear();
        }
    }

    let floor = if count >= 33900 {
        33900
    } else if count >= 1240 {
        1240
    } else {
        0
    };

    let len = used.last().map_or(0, |&i| i + 1).max(floor);
    subrs.truncate(len);
}
