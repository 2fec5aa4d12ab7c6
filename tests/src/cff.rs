use crate::{head, hhea, hmtx, maxp, sfnt, Sink};
use fontsub::{subset, Cff, Font, OutlineKind};
use ttf_parser::GlyphId;

fn index(items: &[Vec<u8>]) -> Vec<u8> {
    let mut data = (items.len() as u16).to_be_bytes().to_vec();
    if items.is_empty() {
        return data;
    }

    data.push(4);
    let mut offset = 1u32;
    data.extend(offset.to_be_bytes());
    for item in items {
        offset += item.len() as u32;
        data.extend(offset.to_be_bytes());
    }

    for item in items {
        data.extend(item);
    }

    data
}

fn int5(data: &mut Vec<u8>, n: usize) {
    data.push(29);
    data.extend((n as i32).to_be_bytes());
}

fn charstrings() -> Vec<Vec<u8>> {
    vec![
        // endchar
        vec![14],
        // 100 100 rmoveto -107 callsubr endchar
        vec![239, 239, 21, 32, 10, 14],
        // 50 500 rmoveto 100 100 rlineto endchar
        vec![189, 248, 136, 21, 239, 239, 5, 14],
        // 0 0 'A' 'acute' endchar
        vec![139, 139, 204, 247, 86, 14],
        // -107 callgsubr endchar
        vec![32, 29, 14],
        // 100 100 rmoveto -106 callsubr endchar
        vec![239, 239, 21, 33, 10, 14],
    ]
}

/// A CFF program with six glyphs named `.notdef A acute Custom B C`, where
/// glyph 3 is an accented character built from glyphs 1 and 2.
fn program() -> Vec<u8> {
    let names = index(&[b"Synthetic".to_vec()]);
    let strings = index(&[b"Custom".to_vec()]);
    // 100 100 rmoveto 300 0 rlineto return
    let global = index(&[vec![239, 239, 21, 247, 192, 139, 5, 11]]);
    let char_strings = index(&charstrings());
    let local = index(&[
        // 200 0 rlineto 0 200 rlineto return
        vec![247, 92, 139, 5, 139, 247, 92, 5, 11],
        // 0 300 rlineto return
        vec![139, 247, 192, 5, 11],
    ]);

    let mut charset = vec![0];
    for sid in [34u16, 125, 391, 35, 36] {
        charset.extend(sid.to_be_bytes());
    }

    // StdVW 88, Subrs
    let mut private = vec![227, 11];
    int5(&mut private, 8);
    private.push(19);

    let top = |fixed: usize| {
        let mut top = vec![];
        int5(&mut top, fixed + char_strings.len());
        top.push(15);
        int5(&mut top, fixed);
        top.push(17);
        int5(&mut top, private.len());
        int5(&mut top, fixed + char_strings.len() + charset.len());
        top.push(18);
        top
    };

    let fixed = 4 + names.len() + index(&[top(0)]).len() + strings.len() + global.len();

    let mut data = vec![1, 0, 4, 4];
    data.extend(&names);
    data.extend(index(&[top(fixed)]));
    data.extend(&strings);
    data.extend(&global);
    data.extend(&char_strings);
    data.extend(&charset);
    data.extend(&private);
    data.extend(&local);
    data
}

fn font() -> Vec<u8> {
    sfnt(
        0x4F54544F,
        vec![
            (b"CFF ", program()),
            (b"head", head(1000, 0)),
            (b"hhea", hhea(6)),
            (b"hmtx", hmtx(&[500, 600, 300, 600, 650, 700])),
            (b"maxp", maxp(6)),
        ],
    )
}

fn draw(table: &ttf_parser::cff::Table, gid: u16) -> Sink {
    let mut sink = Sink::default();
    // Empty glyphs have no bounding box and report an error.
    let _ = table.outline(GlyphId(gid), &mut sink);
    sink
}

#[test]
fn accented_character_pulls_in_components() {
    let data = font();
    let (sub, meta) = subset(&data, 0, &[3]).unwrap();
    assert_eq!(meta.retained, vec![0, 1, 2, 3]);

    let old = ttf_parser::Face::parse(&data, 0).unwrap();
    let new = ttf_parser::cff::Table::parse(&sub).unwrap();
    assert_eq!(new.number_of_glyphs(), 4);

    for gid in 0..4 {
        let mut sink = Sink::default();
        old.outline_glyph(GlyphId(gid), &mut sink);
        assert_eq!(draw(&new, gid), sink, "glyph {gid}");
    }

    assert_eq!(new.glyph_name(GlyphId(2)), Some("acute"));
    assert_eq!(new.glyph_name(GlyphId(3)), Some("Custom"));

    // Without an encoding entry, the standard encoding applies.
    let cff = Cff::parse(&sub).unwrap();
    assert_eq!(cff.glyph_index(b'A'), Some(1));
    assert_eq!(cff.glyph_index(0xC2), Some(2));
    assert_eq!(cff.string(391), Some("Custom"));
    assert_eq!(cff.std_vw(), Some(88.0));
}

#[test]
fn unused_glyphs_and_subroutines_are_emptied() {
    let data = font();
    let (sub, meta) = subset(&data, 0, &[5, 4]).unwrap();
    assert_eq!(meta.retained, vec![0, 4, 5]);
    assert_eq!(meta.widths, "[0[500]4[650 700]]");

    let old = ttf_parser::Face::parse(&data, 0).unwrap();
    let new = ttf_parser::cff::Table::parse(&sub).unwrap();
    assert_eq!(new.number_of_glyphs(), 6);

    for gid in [4, 5] {
        let mut sink = Sink::default();
        old.outline_glyph(GlyphId(gid), &mut sink);
        assert_eq!(draw(&new, gid), sink, "glyph {gid}");
    }

    for gid in 1..4 {
        assert_eq!(draw(&new, gid), Sink::default());
        assert_eq!(new.glyph_name(GlyphId(gid)), Some(".notdef"));
    }

    let cff = Cff::parse(&sub).unwrap();
    assert_eq!(cff.num_glyphs(), 6);
    assert_eq!(cff.glyph_name(5), Some("C"));
    assert!(sub.len() < program().len());
}

#[test]
fn font_accessors() {
    let data = font();
    let mut font = Font::parse(&data, 0).unwrap();
    assert_eq!(font.outline_kind(), OutlineKind::Cff);
    assert_eq!(font.postscript_name(), Some("Synthetic"));
    assert_eq!(font.cff().map(Cff::num_glyphs), Some(6));
    assert_eq!(font.cff().and_then(|cff| cff.glyph_index(b'A')), Some(1));

    font.subset(&[2]).unwrap();
    assert_eq!(font.pdf_stem_v(), 88);
    assert_eq!(font.pdf_italic_angle(), 0);
    assert_eq!(font.pdf_name(), format!("/{}-Synthetic", font.subset_tag().unwrap()));
    assert_eq!(font.to_vec().unwrap()[..3], [1, 0, 4]);
}
