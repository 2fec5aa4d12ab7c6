//! A decoded font that can be subsetted once and written back.
//!
//! All tables the subset depends on are decoded up front, so that the font
//! does not borrow from its source data. Tables that are neither needed for
//! rendering nor for the font descriptor are not carried over.

use crate::cff::Cff;
use crate::glyf::{self, GlyphData};
use crate::head::Head;
use crate::hhea::Hhea;
use crate::hmtx::{self, Metric};
use crate::maxp::Maxp;
use crate::os2::Os2;
use crate::pdf::char_tag;
use crate::post::Post;
use crate::sfnt::{self, Face, FontKind};
use crate::{cmap, name, Error, Result, Tag};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::io;

/// The kind of outlines a font has.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OutlineKind {
    /// Quadratic outlines in the `glyf` table.
    TrueType,
    /// Type 2 charstrings in the `CFF ` table.
    Cff,
}

#[derive(Debug, Clone)]
pub(crate) enum Outlines {
    TrueType {
        glyphs: Vec<GlyphData>,
        cvt: Option<Vec<u8>>,
        fpgm: Option<Vec<u8>>,
        prep: Option<Vec<u8>>,
    },
    Cff(Cff),
}

/// A font with TrueType or CFF outlines.
#[derive(Debug, Clone)]
pub struct Font {
    pub(crate) version: u32,
    pub(crate) head: Head,
    pub(crate) hhea: Hhea,
    pub(crate) maxp: Maxp,
    pub(crate) metrics: Vec<Metric>,
    pub(crate) outlines: Outlines,
    pub(crate) unicode: BTreeMap<u16, char>,
    pub(crate) postscript_name: Option<String>,
    pub(crate) os2: Option<Os2>,
    pub(crate) post: Option<Post>,
    pub(crate) subset: Option<Subset>,
}

/// The outcome of subsetting.
#[derive(Debug, Clone)]
pub(crate) struct Subset {
    pub(crate) glyphs: Vec<u16>,
    pub(crate) tag: String,
}

impl Font {
    /// Parse a font from OpenType data.
    ///
    /// The `index` selects a font from a collection and should be 0 otherwise.
    pub fn parse(data: &[u8], index: u32) -> Result<Self> {
        let face = Face::parse(data, index)?;

        let head = Head::parse(face.expect_table(Tag::HEAD)?)?;
        let hhea = Hhea::parse(face.expect_table(Tag::HHEA)?)?;
        let maxp = Maxp::parse(face.expect_table(Tag::MAXP)?)?;
        let num_glyphs = maxp.num_glyphs;
        let metrics =
            hmtx::parse(face.expect_table(Tag::HMTX)?, hhea.number_of_h_metrics, num_glyphs)?;

        let outlines = match face.kind {
            FontKind::TrueType => {
                let loca = face.expect_table(Tag::LOCA)?;
                let glyf = face.expect_table(Tag::GLYF)?;
                let long = head.index_to_loc_format == 1;
                Outlines::TrueType {
                    glyphs: glyf::parse(loca, glyf, long, num_glyphs)?,
                    cvt: face.table(Tag::CVT).map(<[u8]>::to_vec),
                    fpgm: face.table(Tag::FPGM).map(<[u8]>::to_vec),
                    prep: face.table(Tag::PREP).map(<[u8]>::to_vec),
                }
            }
            FontKind::Cff => {
                let cff = Cff::parse(face.expect_table(Tag::CFF)?)?;
                if cff.num_glyphs() != num_glyphs {
                    warn!(
                        "CFF has {} glyphs, but maxp declares {num_glyphs}",
                        cff.num_glyphs()
                    );
                }
                Outlines::Cff(cff)
            }
            FontKind::Collection => return Err(Error::UnknownKind),
        };

        let unicode = face.table(Tag::CMAP).map(cmap::glyph_to_unicode).unwrap_or_default();
        let postscript_name = face.table(Tag::NAME).and_then(name::postscript_name);
        let os2 = face.table(Tag::OS2).and_then(|data| match Os2::parse(data) {
            Ok(os2) => Some(os2),
            Err(err) => {
                warn!("ignoring OS/2 table: {err}");
                None
            }
        });
        let post = face.table(Tag::POST).and_then(|data| match Post::parse(data) {
            Ok(post) => Some(post),
            Err(err) => {
                warn!("ignoring post table: {err}");
                None
            }
        });

        debug!(
            "parsed {:?} font with {num_glyphs} glyphs and tables {:?}",
            face.kind,
            face.tags().collect::<Vec<_>>()
        );

        Ok(Font {
            version: face.version,
            head,
            hhea,
            maxp,
            metrics,
            outlines,
            unicode,
            postscript_name,
            os2,
            post,
            subset: None,
        })
    }

    /// Reduce the font to the given glyphs and everything they depend on.
    ///
    /// Glyph IDs stay the same. Glyphs that are not retained become empty and
    /// lose their advance, and all glyphs after the last retained one are
    /// removed. A font can only be subsetted once.
    pub fn subset(&mut self, gids: &[u16]) -> Result<()> {
        if self.subset.is_some() {
            return Err(Error::AlreadySubset);
        }

        if gids.is_empty() {
            return Err(Error::NoGlyphs);
        }

        let num_glyphs = self.num_glyphs();
        if let Some(&gid) = gids.iter().find(|&&gid| gid >= num_glyphs) {
            return Err(Error::InvalidGlyph(gid));
        }

        let mut requested: BTreeSet<u16> = gids.iter().copied().collect();
        requested.insert(0);

        let retained = match &mut self.outlines {
            Outlines::TrueType { glyphs, .. } => {
                let retained = glyf::closure(glyphs, requested.iter().copied())?;
                let max_cp = max_code_point(&retained);
                glyphs.truncate(max_cp);
                for (gid, glyph) in glyphs.iter_mut().enumerate() {
                    if !retained.contains(&(gid as u16)) {
                        *glyph = GlyphData::Empty;
                    }
                }
                retained
            }
            Outlines::Cff(cff) => cff.subset(0, &requested)?,
        };

        let max_cp = max_code_point(&retained);
        self.metrics.truncate(max_cp);
        for (gid, metric) in self.metrics.iter_mut().enumerate() {
            if !retained.contains(&(gid as u16)) {
                *metric = Metric::default();
            }
        }

        // Glyphs without an hmtx entry get a zero advance.
        self.metrics.resize(max_cp, Metric::default());
        self.maxp.num_glyphs = max_cp as u16;
        self.hhea.number_of_h_metrics = max_cp as u16;
        self.head.index_to_loc_format = 1;

        let glyphs: Vec<u16> = retained.into_iter().collect();
        let tag = char_tag(&glyphs);
        debug!(
            "subset {} to {} of {num_glyphs} glyphs with tag {tag}",
            self.postscript_name().unwrap_or("font"),
            glyphs.len(),
        );

        self.subset = Some(Subset { glyphs, tag });
        Ok(())
    }

    /// Write the font into a writer.
    ///
    /// TrueType fonts are written as an sfnt file, CFF fonts as a bare CFF
    /// program.
    pub fn write<W: io::Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(&self.to_vec()?)?;
        Ok(())
    }

    /// Write the font into a new vector.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let data = match &self.outlines {
            Outlines::TrueType { glyphs, cvt, fpgm, prep } => {
                let (glyf, loca) = glyf::write(glyphs);

                let mut head = self.head.clone();
                head.index_to_loc_format = 1;
                let mut hhea = self.hhea.clone();
                hhea.number_of_h_metrics = self.metrics.len() as u16;
                let mut maxp = self.maxp.clone();
                maxp.num_glyphs = glyphs.len() as u16;

                let mut tables = vec![
                    (Tag::GLYF, glyf),
                    (Tag::HEAD, head.write()),
                    (Tag::HHEA, hhea.write()),
                    (Tag::HMTX, hmtx::write(&self.metrics)),
                    (Tag::LOCA, loca),
                    (Tag::MAXP, maxp.write()),
                ];

                for (tag, table) in [(Tag::CVT, cvt), (Tag::FPGM, fpgm), (Tag::PREP, prep)] {
                    if let Some(table) = table {
                        tables.push((tag, table.clone()));
                    }
                }

                sfnt::construct(self.version, tables)
            }
            Outlines::Cff(cff) => cff.write(0)?,
        };

        debug!("wrote font of {} bytes", data.len());
        Ok(data)
    }

    /// The kind of outlines the font has.
    pub fn outline_kind(&self) -> OutlineKind {
        match self.outlines {
            Outlines::TrueType { .. } => OutlineKind::TrueType,
            Outlines::Cff(_) => OutlineKind::Cff,
        }
    }

    /// The number of glyphs, which shrinks when subsetting.
    pub fn num_glyphs(&self) -> u16 {
        self.maxp.num_glyphs
    }

    /// The units per em of the glyph coordinates.
    pub fn units_per_em(&self) -> u16 {
        self.head.units_per_em
    }

    /// The advance width of a glyph in font units.
    pub fn advance(&self, gid: u16) -> Option<u16> {
        self.metrics.get(usize::from(gid)).map(|m| m.advance)
    }

    /// The lowest Unicode code point that maps to a glyph.
    pub fn unicode(&self, gid: u16) -> Option<char> {
        self.unicode.get(&gid).copied()
    }

    /// The PostScript name from the `name` table, or else the CFF font name.
    pub fn postscript_name(&self) -> Option<&str> {
        self.postscript_name.as_deref().or_else(|| self.cff()?.font_name())
    }

    /// The CFF program, for fonts with CFF outlines.
    pub fn cff(&self) -> Option<&Cff> {
        match &self.outlines {
            Outlines::Cff(cff) => Some(cff),
            Outlines::TrueType { .. } => None,
        }
    }

    /// The six-letter tag identifying the subset, once the font is subsetted.
    pub fn subset_tag(&self) -> Option<&str> {
        self.subset.as_ref().map(|s| s.tag.as_str())
    }

    /// The sorted glyphs that survived subsetting. Empty before subsetting.
    pub fn subset_glyphs(&self) -> &[u16] {
        self.subset.as_ref().map_or(&[], |s| s.glyphs.as_slice())
    }
}

fn max_code_point(retained: &BTreeSet<u16>) -> usize {
    retained.last().map_or(1, |&gid| usize::from(gid) + 1)
}
