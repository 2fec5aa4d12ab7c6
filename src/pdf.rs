//! Everything a PDF font dictionary and font descriptor need to know about a
//! subsetted font.

use crate::font::Font;
use md5::{Digest, Md5};

/// The symbolic font descriptor flag.
const SYMBOLIC: i32 = 1 << 2;
const FIXED_PITCH: i32 = 1 << 0;
const ITALIC: i32 = 1 << 6;

const CMAP_HEADER: &str = "\
/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo << /Registry (Adobe)/Ordering (UCS)/Supplement 0>> def
/CMapName /Adobe-Identity-UCS def /CMapType 2 def
1 begincodespacerange
";

const CMAP_FOOTER: &str = "\
endbfchar
endcmap CMapName currentdict /CMap defineresource pop end end";

/// Compute the six-letter subset tag for a set of glyphs.
///
/// The tag only depends on the set, not on the order or on duplicates, so
/// that the same subset always produces the same PDF.
pub fn char_tag(gids: &[u16]) -> String {
    let mut gids = gids.to_vec();
    gids.sort_unstable();
    gids.dedup();

    let mut hasher = Md5::new();
    for gid in &gids {
        hasher.update(gid.to_be_bytes());
    }

    let digest = hasher.finalize();
    (0..6)
        .map(|i| char::from(digest[2 * i].wrapping_add(digest[2 * i + 1]) / 26 + b'A'))
        .collect()
}

impl Font {
    /// The `/W` array for the subset glyphs, with one entry per run of
    /// consecutive glyph IDs.
    pub fn pdf_widths(&self) -> String {
        let units = f64::from(self.units_per_em()) / 1000.0;
        let width = |gid: u16| {
            let advance = f64::from(self.advance(gid).unwrap_or(0));
            (10.0 * advance / units).round() / 10.0
        };

        let mut out = String::from("[");
        let mut prev: Option<u16> = None;
        for &gid in self.subset_glyphs() {
            match prev {
                Some(p) if p.checked_add(1) == Some(gid) => {
                    out.push_str(&format!(" {}", width(gid)));
                }
                Some(_) => {
                    out.push_str(&format!("]{gid}[{}", width(gid)));
                }
                None => {
                    out.push_str(&format!("{gid}[{}", width(gid)));
                }
            }
            prev = Some(gid);
        }

        if prev.is_some() {
            out.push(']');
        }
        out.push(']');
        out
    }

    /// The `/ToUnicode` CMap program for the subset glyphs.
    ///
    /// Glyphs without a Unicode mapping are mapped to `<0000>`.
    pub fn pdf_cmap(&self) -> String {
        let glyphs = self.subset_glyphs();
        let mut out = String::from(CMAP_HEADER);
        out.push_str(&format!("<0001><{:04X}>\n", self.num_glyphs()));
        out.push_str("endcodespacerange\n");
        out.push_str(&format!("{} beginbfchar\n", glyphs.len()));

        for &gid in glyphs {
            out.push_str(&format!("<{gid:04X}><"));
            match self.unicode(gid) {
                Some(c) => {
                    let mut buf = [0; 2];
                    for unit in c.encode_utf16(&mut buf) {
                        out.push_str(&format!("{unit:04X}"));
                    }
                }
                None => out.push_str("0000"),
            }
            out.push_str(">\n");
        }

        out.push_str(CMAP_FOOTER);
        out
    }

    /// The `/BaseFont` name, prefixed with the subset tag.
    pub fn pdf_name(&self) -> String {
        format!(
            "/{}-{}",
            self.subset_tag().unwrap_or_default(),
            self.postscript_name().unwrap_or_default()
        )
    }

    /// The `/Ascent` of the font descriptor.
    pub fn pdf_ascent(&self) -> i32 {
        i32::from(self.hhea.ascender)
    }

    /// The `/Descent` of the font descriptor.
    pub fn pdf_descent(&self) -> i32 {
        i32::from(self.hhea.descender)
    }

    /// The `/CapHeight` of the font descriptor.
    pub fn pdf_cap_height(&self) -> i32 {
        self.os2.as_ref().map_or(0, |os2| i32::from(os2.cap_height))
    }

    /// The `/XHeight` of the font descriptor.
    pub fn pdf_x_height(&self) -> i32 {
        self.os2.as_ref().map_or(0, |os2| i32::from(os2.x_height))
    }

    /// The `/FontBBox` of the font descriptor.
    pub fn pdf_bbox(&self) -> String {
        format!("[0 {} 1000 {}]", self.pdf_descent(), self.pdf_ascent())
    }

    /// The `/ItalicAngle` of the font descriptor, truncated to an integer.
    pub fn pdf_italic_angle(&self) -> i32 {
        match (&self.post, self.cff()) {
            (Some(post), _) => post.italic_angle as i32,
            (None, Some(cff)) => cff.italic_angle() as i32,
            (None, None) => 0,
        }
    }

    /// The `/Flags` of the font descriptor.
    pub fn pdf_flags(&self) -> i32 {
        let mut flags = SYMBOLIC;
        let fixed = match (&self.post, self.cff()) {
            (Some(post), _) => post.is_fixed_pitch,
            (None, Some(cff)) => cff.is_fixed_pitch(),
            (None, None) => false,
        };

        if fixed {
            flags |= FIXED_PITCH;
        }

        if self.pdf_italic_angle() != 0 {
            flags |= ITALIC;
        }

        flags
    }

    /// The `/StemV` of the font descriptor, taken from the CFF private
    /// dictionary.
    pub fn pdf_stem_v(&self) -> i32 {
        self.cff().and_then(|cff| cff.std_vw()).map_or(0, |v| v.round() as i32)
    }
}
