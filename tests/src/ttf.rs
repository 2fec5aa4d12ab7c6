use crate::{cmap, head, hhea, hmtx, maxp, name, sfnt, Sink};
use fontsub::{char_tag, subset, Font, OutlineKind};
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::DrawSettings;
use skrifa::MetadataProvider;
use ttf_parser::GlyphId;

const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const MORE_COMPONENTS: u16 = 0x0020;

/// A triangle with on-curve points only.
fn triangle(size: i16) -> Vec<u8> {
    let mut data = vec![];
    for v in [1, 0, 0, size, 2 * size, 2, 0] {
        data.extend(v.to_be_bytes());
    }
    data.extend([1, 1, 1]);
    for v in [0, size, -size / 2, 0, 0, 2 * size] {
        data.extend(v.to_be_bytes());
    }
    data
}

fn composite(components: &[(u16, i16)]) -> Vec<u8> {
    let mut data = vec![];
    for v in [-1i16, 0, 0, 200, 200] {
        data.extend(v.to_be_bytes());
    }

    for (i, &(gid, dx)) in components.iter().enumerate() {
        let mut flags = ARG_1_AND_2_ARE_WORDS | ARGS_ARE_XY_VALUES;
        if i + 1 < components.len() {
            flags |= MORE_COMPONENTS;
        }
        data.extend(flags.to_be_bytes());
        data.extend(gid.to_be_bytes());
        data.extend(dx.to_be_bytes());
        data.extend(0i16.to_be_bytes());
    }

    data
}

/// Ten glyphs: glyph 5 is made of glyph 7 and glyph 8 of glyphs 3 and 4.
fn font(short_loca: bool) -> Vec<u8> {
    let glyphs: Vec<Vec<u8>> = (0..10)
        .map(|gid| match gid {
            5 => composite(&[(7, 30)]),
            8 => composite(&[(3, 0), (4, 100)]),
            _ => triangle(100 + 10 * gid),
        })
        .collect();

    let mut glyf = vec![];
    let mut loca = vec![];
    for glyph in &glyphs {
        if short_loca {
            loca.extend((glyf.len() as u16 / 2).to_be_bytes());
        } else {
            loca.extend((glyf.len() as u32).to_be_bytes());
        }
        glyf.extend(glyph);
        glyf.resize(glyf.len().next_multiple_of(2), 0);
    }

    if short_loca {
        loca.extend((glyf.len() as u16 / 2).to_be_bytes());
    } else {
        loca.extend((glyf.len() as u32).to_be_bytes());
    }

    let advances: Vec<u16> = (0..10).map(|gid| 500 + 10 * gid).collect();
    sfnt(
        0x00010000,
        vec![
            (b"cmap", cmap(&[('A', 2), ('B', 5), ('C', 7), ('D', 9)])),
            (b"fpgm", vec![0xB0, 0x00]),
            (b"glyf", glyf),
            (b"head", head(1000, if short_loca { 0 } else { 1 })),
            (b"hhea", hhea(10)),
            (b"hmtx", hmtx(&advances)),
            (b"loca", loca),
            (b"maxp", maxp(10)),
            (b"name", name("Synthetic-Regular")),
        ],
    )
}

fn draw_ttf(face: &ttf_parser::Face, gid: u16) -> Option<Sink> {
    let mut sink = Sink::default();
    face.outline_glyph(GlyphId(gid), &mut sink)?;
    Some(sink)
}

fn draw_skrifa(data: &[u8], gid: u16) -> Sink {
    let font = skrifa::FontRef::new(data).unwrap();
    let glyph = font.outline_glyphs().get(skrifa::GlyphId::new(u32::from(gid))).unwrap();
    let settings = DrawSettings::unhinted(Size::unscaled(), LocationRef::default());
    let mut sink = Sink::default();
    glyph.draw(settings, &mut sink).unwrap();
    sink
}

#[test]
fn composite_closure_keeps_glyph_ids() {
    let data = font(false);
    let (sub, meta) = subset(&data, 0, &[2, 5]).unwrap();
    assert_eq!(meta.retained, vec![0, 2, 5, 7]);
    assert_eq!(meta.tag, char_tag(&[7, 5, 2, 0]));

    let old = ttf_parser::Face::parse(&data, 0).unwrap();
    let new = ttf_parser::Face::parse(&sub, 0).unwrap();
    assert_eq!(new.number_of_glyphs(), 8);
    assert_eq!(new.tables().hhea.number_of_metrics, 8);
    assert_eq!(new.units_per_em(), old.units_per_em());
    assert_eq!(new.ascender(), old.ascender());

    for gid in [0, 2, 5, 7] {
        assert_eq!(draw_ttf(&new, gid), draw_ttf(&old, gid), "glyph {gid}");
        assert_eq!(new.glyph_hor_advance(GlyphId(gid)), old.glyph_hor_advance(GlyphId(gid)));
        assert_eq!(new.glyph_bounding_box(GlyphId(gid)), old.glyph_bounding_box(GlyphId(gid)));
    }

    for gid in [1, 3, 4, 6] {
        assert_eq!(draw_ttf(&new, gid), None);
        assert_eq!(new.glyph_hor_advance(GlyphId(gid)), Some(0));
    }

    for gid in [2, 5] {
        assert_eq!(draw_skrifa(&sub, gid), draw_skrifa(&data, gid));
    }
}

#[test]
fn short_loca_is_widened() {
    let data = font(true);
    let (sub, _) = subset(&data, 0, &[8]).unwrap();

    let old = ttf_parser::Face::parse(&data, 0).unwrap();
    let new = ttf_parser::Face::parse(&sub, 0).unwrap();
    assert_eq!(new.number_of_glyphs(), 9);
    assert_eq!(
        new.tables().head.index_to_location_format,
        ttf_parser::head::IndexToLocationFormat::Long
    );

    for gid in [3, 4, 8] {
        assert_eq!(draw_ttf(&new, gid), draw_ttf(&old, gid), "glyph {gid}");
    }
    assert_eq!(draw_skrifa(&sub, 8), draw_skrifa(&data, 8));
}

#[test]
fn only_known_tables_are_written() {
    let data = font(false);
    let (sub, _) = subset(&data, 0, &[9]).unwrap();
    let face = ttf_parser::RawFace::parse(&sub, 0).unwrap();
    let tags: Vec<_> = face.table_records.into_iter().map(|r| r.tag.to_bytes()).collect();
    assert_eq!(tags, [*b"fpgm", *b"glyf", *b"head", *b"hhea", *b"hmtx", *b"loca", *b"maxp"]);
    assert_eq!(face.table(ttf_parser::Tag::from_bytes(b"fpgm")), Some([0xB0, 0x00].as_slice()));
}

#[test]
fn pdf_metadata() {
    let data = font(false);
    let (_, meta) = subset(&data, 0, &[2, 5, 9]).unwrap();
    assert_eq!(meta.retained, vec![0, 2, 5, 7, 9]);
    assert_eq!(meta.base_font, format!("/{}-Synthetic-Regular", meta.tag));
    assert_eq!(meta.widths, "[0[500]2[520]5[550]7[570]9[590]]");
    assert!(meta.to_unicode.contains("<0001><000A>\nendcodespacerange\n5 beginbfchar\n"));
    assert!(meta
        .to_unicode
        .contains("<0002><0041>\n<0005><0042>\n<0007><0043>\n<0009><0044>\n"));

    let mut font = Font::parse(&data, 0).unwrap();
    assert_eq!(font.outline_kind(), OutlineKind::TrueType);
    assert_eq!(font.postscript_name(), Some("Synthetic-Regular"));
    assert_eq!(font.unicode(7), Some('C'));
    font.subset(&[1]).unwrap();
    assert_eq!(font.pdf_bbox(), "[0 -200 1000 800]");
    assert_eq!(font.pdf_flags(), 4);
    assert_eq!(font.pdf_cap_height(), 0);
}

#[test]
fn subset_everything() {
    let data = font(false);
    let gids: Vec<u16> = (0..10).collect();
    let (sub, meta) = subset(&data, 0, &gids).unwrap();
    assert_eq!(meta.retained, gids);

    let old = ttf_parser::Face::parse(&data, 0).unwrap();
    let new = ttf_parser::Face::parse(&sub, 0).unwrap();
    for gid in gids {
        assert_eq!(draw_ttf(&new, gid), draw_ttf(&old, gid), "glyph {gid}");
        assert_eq!(new.glyph_hor_advance(GlyphId(gid)), old.glyph_hor_advance(GlyphId(gid)));
    }
}

#[test]
fn invalid_requests() {
    let data = font(false);
    assert!(matches!(subset(&data, 0, &[]), Err(fontsub::Error::NoGlyphs)));
    assert!(matches!(subset(&data, 0, &[1, 10]), Err(fontsub::Error::InvalidGlyph(10))));
}
