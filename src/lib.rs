/*!
Subsets TrueType and CFF fonts for embedding in PDF documents.

# Example
In the example below, we keep only the glyphs with IDs 68, 69 and 70, which in
many fonts correspond to the letters 'a', 'b' and 'c'.

```no_run
use fontsub::subset;

# fn main() -> Result<(), Box<dyn std::error::Error>> {
// Read the raw font data.
let data = std::fs::read("fonts/NotoSans-Regular.ttf")?;

// Keep three glyphs plus whatever they are composed of.
let (sub, meta) = subset(&data, 0, &[68, 69, 70])?;

// The metadata carries everything a PDF font dictionary needs.
println!("{} {}", meta.base_font, meta.widths);

// Write the resulting file.
std::fs::write("target/Noto-Small.ttf", sub)?;
# Ok(())
# }
```

Subsetting never renumbers glyphs. Glyphs that are not needed keep their slot
but lose their outline and metrics, and everything after the highest retained
glyph is cut off. Composite glyphs and CFF subroutines are followed so that the
retained glyphs still render exactly as before.

For TrueType outlines the result is a new sfnt file. For CFF outlines the
result is a bare CFF program, as embedded with `/FontFile3` and
`/Subtype /Type1C`.
*/

#![deny(unsafe_code)]
#![deny(missing_docs)]

mod cff;
mod cmap;
mod font;
mod glyf;
mod head;
mod hhea;
mod hmtx;
mod maxp;
mod name;
mod os2;
mod pdf;
mod post;
mod sfnt;
mod stream;

pub use crate::cff::Cff;
pub use crate::font::{Font, OutlineKind};
pub use crate::pdf::char_tag;

use std::fmt::{self, Debug, Display, Formatter};

/// Subset a font to the given glyphs and collect the metadata needed to
/// embed it.
///
/// - The `data` must be in the OpenType font format.
/// - The `index` is only relevant if the data contains a font collection
///   (`.ttc` or `.otc` file). Otherwise, it should be 0.
/// - The `gids` may be unsorted and contain duplicates. The `.notdef` glyph is
///   always kept.
pub fn subset(data: &[u8], index: u32, gids: &[u16]) -> Result<(Vec<u8>, Metadata)> {
    let mut font = Font::parse(data, index)?;
    font.subset(gids)?;

    let bytes = font.to_vec()?;
    let meta = Metadata {
        tag: font.subset_tag().unwrap_or_default().to_string(),
        base_font: font.pdf_name(),
        widths: font.pdf_widths(),
        to_unicode: font.pdf_cmap(),
        retained: font.subset_glyphs().to_vec(),
    };

    Ok((bytes, meta))
}

/// Everything besides the font program that a PDF font dictionary needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// The six-letter subset tag.
    pub tag: String,
    /// The `/BaseFont` name, including the subset tag.
    pub base_font: String,
    /// The `/W` array of the CID font.
    pub widths: String,
    /// The `/ToUnicode` CMap program.
    pub to_unicode: String,
    /// The sorted glyph IDs that survived subsetting.
    pub retained: Vec<u16>,
}

/// A 4-byte OpenType tag.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    // General tables.
    const CMAP: Self = Self(*b"cmap");
    const HEAD: Self = Self(*b"head");
    const HHEA: Self = Self(*b"hhea");
    const HMTX: Self = Self(*b"hmtx");
    const MAXP: Self = Self(*b"maxp");
    const NAME: Self = Self(*b"name");
    const OS2: Self = Self(*b"OS/2");
    const POST: Self = Self(*b"post");

    // TrueType.
    const GLYF: Self = Self(*b"glyf");
    const LOCA: Self = Self(*b"loca");
    const PREP: Self = Self(*b"prep");
    const FPGM: Self = Self(*b"fpgm");
    const CVT: Self = Self(*b"cvt ");

    // CFF.
    const CFF: Self = Self(*b"CFF ");
}

impl stream::Readable<'_> for Tag {
    const SIZE: usize = 4;

    fn read(r: &mut stream::Reader) -> Option<Self> {
        r.read::<[u8; 4]>().map(Self)
    }
}

impl stream::Writeable for Tag {
    fn write(&self, w: &mut stream::Writer) {
        w.write::<[u8; 4]>(self.0)
    }
}

impl Debug for Tag {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad(std::str::from_utf8(&self.0).unwrap_or("..."))
    }
}

/// The result type for everything.
pub type Result<T> = std::result::Result<T, Error>;

/// Parsing, subsetting or writing a font failed.
#[derive(Debug)]
pub enum Error {
    /// The file contains an unknown kind of font.
    UnknownKind,
    /// An offset pointed outside of the data.
    InvalidOffset,
    /// Parsing expected more data.
    MissingData,
    /// A table the font cannot do without is missing.
    MissingTable(Tag),
    /// A CFF INDEX declared an offset size other than 1 to 4.
    InvalidOffsetSize(u8),
    /// A CFF charset used an unknown format number.
    UnknownCharsetFormat(u8),
    /// A CFF encoding used an unknown format number.
    UnknownEncodingFormat(u8),
    /// A CFF DICT contained an operator that does not exist.
    InvalidOperator(u8),
    /// The font is structurally broken in some other way.
    MalformedFont,
    /// The font relies on some unimplemented feature, and thus we cannot guarantee
    /// that the subsetted font would be correct.
    Unimplemented,
    /// Subsetting was requested without any glyphs.
    NoGlyphs,
    /// The font was already subsetted once.
    AlreadySubset,
    /// A glyph ID does not exist in the font.
    InvalidGlyph(u16),
    /// A charstring called a subroutine that does not exist.
    InvalidSubroutine(i32),
    /// The CFF offsets did not settle after re-encoding the Top DICT.
    OffsetDrift,
    /// Writing the font failed.
    Io(std::io::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::UnknownKind => f.pad("unknown font kind"),
            Self::InvalidOffset => f.pad("invalid offset"),
            Self::MissingData => f.pad("missing more data"),
            Self::MissingTable(tag) => write!(f, "missing {tag} table"),
            Self::InvalidOffsetSize(size) => write!(f, "invalid INDEX offset size {size}"),
            Self::UnknownCharsetFormat(format) => {
                write!(f, "unknown charset format {format}")
            }
            Self::UnknownEncodingFormat(format) => {
                write!(f, "unknown encoding format {format}")
            }
            Self::InvalidOperator(op) => write!(f, "invalid DICT operator 12 {op}"),
            Self::MalformedFont => f.pad("malformed font"),
            Self::Unimplemented => f.pad("unimplemented feature in font"),
            Self::NoGlyphs => f.pad("no glyphs requested"),
            Self::AlreadySubset => f.pad("font was already subsetted"),
            Self::InvalidGlyph(gid) => write!(f, "glyph {gid} does not exist"),
            Self::InvalidSubroutine(index) => {
                write!(f, "call to nonexistent subroutine {index}")
            }
            Self::OffsetDrift => f.pad("CFF offsets did not converge"),
            Self::Io(err) => write!(f, "failed to write font: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
