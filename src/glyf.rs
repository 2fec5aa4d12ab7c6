//! The `glyf` table contains the main description of the glyphs. Subsetting it
//! works in three steps:
//! 1. We form the glyph closure. Glyphs can reference other glyphs, meaning that
//!    if a user for example requests the glyph 1, and this glyph references the
//!    glyph 2, then we need to include both of them in our subset.
//! 2. Glyphs outside the closure are replaced by empty glyphs. Glyph IDs are
//!    never changed, so component references stay valid as they are.
//! 3. The `loca` table is rebuilt from the new glyph lengths, always in the long
//!    format.

use crate::stream::{read_at, Readable, Reader, Writer};
use crate::{Error, Result};
use log::trace;
use std::collections::BTreeSet;

const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

/// The description of a single glyph.
#[derive(Debug, Clone, PartialEq)]
pub enum GlyphData {
    /// A glyph without an outline.
    Empty,
    /// A glyph made of contours.
    Simple(Vec<u8>),
    /// A glyph made of other glyphs.
    Composite {
        data: Vec<u8>,
        components: Vec<Component>,
    },
}

impl GlyphData {
    /// Decode the description of a glyph from its raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(GlyphData::Empty);
        }

        let num_contours = read_at::<i16>(data, 0)?;
        if num_contours >= 0 {
            return Ok(GlyphData::Simple(data.to_vec()));
        }

        // Skip the header of the glyph (number of contours and bbox).
        let mut r = Reader::new_at(data, 10);
        let mut components = vec![];
        loop {
            let component = r.read::<Component>().ok_or(Error::MissingData)?;
            let more = component.flags & MORE_COMPONENTS != 0;
            components.push(component);
            if !more {
                break;
            }
        }

        Ok(GlyphData::Composite { data: data.to_vec(), components })
    }

    /// The raw bytes of the glyph.
    pub fn data(&self) -> &[u8] {
        match self {
            GlyphData::Empty => &[],
            GlyphData::Simple(data) => data,
            GlyphData::Composite { data, .. } => data,
        }
    }

    /// The glyphs this glyph is directly composed of.
    pub fn component_glyphs(&self) -> impl Iterator<Item = u16> + '_ {
        let components = match self {
            GlyphData::Composite { components, .. } => components.as_slice(),
            _ => &[],
        };
        components.iter().map(|c| c.glyph_index)
    }
}

/// A reference to another glyph inside a composite glyph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Component {
    pub flags: u16,
    pub glyph_index: u16,
    /// Either an offset or a pair of point numbers, depending on the flags.
    pub args: (i32, i32),
    pub transform: Transform,
}

/// The linear transform of a component, in raw F2Dot14 units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Identity,
    Scale(i16),
    XyScale(i16, i16),
    TwoByTwo([i16; 4]),
}

impl Readable<'_> for Component {
    const SIZE: usize = 4;

    fn read(r: &mut Reader) -> Option<Self> {
        let flags = r.read::<u16>()?;
        let glyph_index = r.read::<u16>()?;

        let xy = flags & ARGS_ARE_XY_VALUES != 0;
        let args = match (flags & ARG_1_AND_2_ARE_WORDS != 0, xy) {
            (true, true) => (i32::from(r.read::<i16>()?), i32::from(r.read::<i16>()?)),
            (true, false) => (i32::from(r.read::<u16>()?), i32::from(r.read::<u16>()?)),
            (false, true) => (i32::from(r.read::<i8>()?), i32::from(r.read::<i8>()?)),
            (false, false) => (i32::from(r.read::<u8>()?), i32::from(r.read::<u8>()?)),
        };

        let transform = if flags & WE_HAVE_A_SCALE != 0 {
            Transform::Scale(r.read::<i16>()?)
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            Transform::XyScale(r.read::<i16>()?, r.read::<i16>()?)
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            let mut m = [0; 4];
            for v in &mut m {
                *v = r.read::<i16>()?;
            }
            Transform::TwoByTwo(m)
        } else {
            Transform::Identity
        };

        Some(Component { flags, glyph_index, args, transform })
    }
}

/// Parse all glyphs with the help of the `loca` table.
pub fn parse(loca: &[u8], glyf: &[u8], long: bool, num_glyphs: u16) -> Result<Vec<GlyphData>> {
    let offset = |i: u16| -> Result<usize> {
        Ok(if long {
            read_at::<u32>(loca, 4 * usize::from(i))? as usize
        } else {
            2 * usize::from(read_at::<u16>(loca, 2 * usize::from(i))?)
        })
    };

    let mut glyphs = Vec::with_capacity(usize::from(num_glyphs));
    let mut start = offset(0)?;
    for i in 0..num_glyphs {
        let end = offset(i + 1)?;
        // Some fonts have zero-length glyphs whose end lies before the start.
        let data = if end <= start {
            &[]
        } else {
            glyf.get(start..end).ok_or(Error::InvalidOffset)?
        };
        glyphs.push(GlyphData::parse(data)?);
        start = end;
    }

    Ok(glyphs)
}

/// Expand the requested glyphs by every glyph they are transitively composed of.
pub fn closure(
    glyphs: &[GlyphData],
    requested: impl IntoIterator<Item = u16>,
) -> Result<BTreeSet<u16>> {
    let mut visited = BTreeSet::new();
    let mut stack: Vec<u16> = requested.into_iter().collect();

    while let Some(gid) = stack.pop() {
        if !visited.insert(gid) {
            continue;
        }

        let glyph = glyphs.get(usize::from(gid)).ok_or(Error::InvalidGlyph(gid))?;
        for component in glyph.component_glyphs() {
            if !visited.contains(&component) {
                trace!("glyph {gid} pulls in component {component}");
                stack.push(component);
            }
        }
    }

    Ok(visited)
}

/// Write the `glyf` and the long `loca` table.
pub fn write(glyphs: &[GlyphData]) -> (Vec<u8>, Vec<u8>) {
    let mut glyf = Writer::new();
    let mut loca = Writer::with_capacity(4 * (glyphs.len() + 1));

    for glyph in glyphs {
        loca.write::<u32>(glyf.len() as u32);
        glyf.extend(glyph.data());
    }

    // Write the final offset.
    loca.write::<u32>(glyf.len() as u32);

    (glyf.finish(), loca.finish())
}
