use skrifa::outline::OutlinePen;

mod cff;
mod ttf;

/// Assemble an sfnt file. Checksums are left at zero, which parsers accept.
fn sfnt(version: u32, mut tables: Vec<(&[u8; 4], Vec<u8>)>) -> Vec<u8> {
    tables.sort_by_key(|(tag, _)| **tag);

    let mut data = vec![];
    data.extend(version.to_be_bytes());
    data.extend((tables.len() as u16).to_be_bytes());
    data.extend([0; 6]);

    let mut offset = 12 + 16 * tables.len();
    for (tag, table) in &tables {
        data.extend(*tag);
        data.extend(0u32.to_be_bytes());
        data.extend((offset as u32).to_be_bytes());
        data.extend((table.len() as u32).to_be_bytes());
        offset += table.len().next_multiple_of(4);
    }

    for (_, table) in &tables {
        data.extend(table);
        data.resize(data.len().next_multiple_of(4), 0);
    }

    data
}

fn head(units_per_em: u16, index_to_loc_format: i16) -> Vec<u8> {
    let mut data = vec![];
    data.extend(0x00010000u32.to_be_bytes());
    data.extend(0x00010000u32.to_be_bytes());
    data.extend(0u32.to_be_bytes());
    data.extend(0x5F0F3CF5u32.to_be_bytes());
    data.extend(0u16.to_be_bytes());
    data.extend(units_per_em.to_be_bytes());
    data.extend([0; 16]);
    for v in [0i16, -200, 1000, 800] {
        data.extend(v.to_be_bytes());
    }
    data.extend(0u16.to_be_bytes());
    data.extend(8u16.to_be_bytes());
    data.extend(2i16.to_be_bytes());
    data.extend(index_to_loc_format.to_be_bytes());
    data.extend(0i16.to_be_bytes());
    data
}

fn hhea(number_of_h_metrics: u16) -> Vec<u8> {
    let mut data = vec![];
    data.extend(0x00010000u32.to_be_bytes());
    for v in [800i16, -200, 0, 1000, 0, 0, 1000, 1, 0, 0, 0, 0, 0, 0, 0] {
        data.extend(v.to_be_bytes());
    }
    data.extend(number_of_h_metrics.to_be_bytes());
    data
}

fn maxp(num_glyphs: u16) -> Vec<u8> {
    let mut data = vec![];
    data.extend(0x00005000u32.to_be_bytes());
    data.extend(num_glyphs.to_be_bytes());
    data
}

fn hmtx(advances: &[u16]) -> Vec<u8> {
    let mut data = vec![];
    for advance in advances {
        data.extend(advance.to_be_bytes());
        data.extend(0i16.to_be_bytes());
    }
    data
}

/// A Windows Unicode `cmap` with one format 4 segment per mapping.
fn cmap(mappings: &[(char, u16)]) -> Vec<u8> {
    let mut segments: Vec<(u16, u16)> =
        mappings.iter().map(|&(c, gid)| (c as u16, gid)).collect();
    segments.sort();
    segments.push((0xFFFF, 1));
    let seg_count = segments.len() as u16;

    let mut sub = vec![];
    sub.extend(4u16.to_be_bytes());
    sub.extend((16 + 8 * seg_count).to_be_bytes());
    sub.extend(0u16.to_be_bytes());
    sub.extend((2 * seg_count).to_be_bytes());
    sub.extend([0; 6]);
    segments.iter().for_each(|(c, _)| sub.extend(c.to_be_bytes()));
    sub.extend(0u16.to_be_bytes());
    segments.iter().for_each(|(c, _)| sub.extend(c.to_be_bytes()));
    segments.iter().for_each(|(c, gid)| sub.extend(gid.wrapping_sub(*c).to_be_bytes()));
    segments.iter().for_each(|_| sub.extend(0u16.to_be_bytes()));

    let mut data = vec![0, 0, 0, 1];
    data.extend([0, 3, 0, 1]);
    data.extend(12u32.to_be_bytes());
    data.extend(sub);
    data
}

/// A `name` table with just a Windows PostScript name.
fn name(postscript_name: &str) -> Vec<u8> {
    let string: Vec<u8> = postscript_name.encode_utf16().flat_map(u16::to_be_bytes).collect();
    let mut data = vec![];
    for v in [0, 1, 18, 3, 1, 0x409, 6, string.len() as u16, 0] {
        data.extend(v.to_be_bytes());
    }
    data.extend(string);
    data
}

#[derive(Debug, Default, PartialEq)]
struct Sink(Vec<Inst>);

#[derive(Debug, PartialEq)]
enum Inst {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    QuadTo(f32, f32, f32, f32),
    CurveTo(f32, f32, f32, f32, f32, f32),
    Close,
}

impl OutlinePen for Sink {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.push(Inst::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.0.push(Inst::LineTo(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.0.push(Inst::QuadTo(x1, y1, x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.0.push(Inst::CurveTo(x1, y1, x2, y2, x, y));
    }

    fn close(&mut self) {
        self.0.push(Inst::Close);
    }
}

impl ttf_parser::OutlineBuilder for Sink {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.push(Inst::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.0.push(Inst::LineTo(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.0.push(Inst::QuadTo(x1, y1, x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.0.push(Inst::CurveTo(x1, y1, x2, y2, x, y));
    }

    fn close(&mut self) {
        self.0.push(Inst::Close);
    }
}
