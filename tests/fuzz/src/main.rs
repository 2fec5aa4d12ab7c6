use fontsub::{subset, Font, OutlineKind};
use rand::distr::weighted::WeightedIndex;
use rand::prelude::{IteratorRandom, ThreadRng};
use rand::rng;
use rand_distr::Distribution;
use rayon::iter::IntoParallelRefIterator;
use rayon::iter::ParallelIterator;
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::MetadataProvider;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use ttf_parser::GlyphId;

// Note that this is not really meant as an example for how to use this crate, but
// rather just so that we can conveniently run the fuzzer.

const NUM_ITERATIONS: usize = 200;

fn main() {
    let exclude_fonts = [
        // Color font.
        "NotoColorEmojiCompatTest-Regular.ttf",
    ];

    let paths = walkdir::WalkDir::new(std::env::var("FONTS_DIR").unwrap())
        .into_iter()
        .map(|p| p.unwrap().path().to_path_buf())
        .filter(|p| {
            let extension = p.extension().and_then(OsStr::to_str);
            (extension == Some("ttf") || extension == Some("otf"))
                && !exclude_fonts.contains(&p.file_name().unwrap().to_str().unwrap())
        })
        .collect::<Vec<_>>();

    loop {
        println!("Starting an iteration...");

        paths.par_iter().for_each(|path| {
            let mut rng = rng();
            if let Err(msg) = run_test(path, &mut rng) {
                println!("Error while fuzzing {:?}: {:}", path, msg)
            }
        });
    }
}

fn run_test(path: &Path, rng: &mut ThreadRng) -> Result<(), String> {
    let data = fs::read(path).map_err(|_| "failed to read file".to_string())?;
    let old_ttf_face = ttf_parser::Face::parse(&data, 0)
        .map_err(|_| "failed to parse old face".to_string())?;

    // Fonts this crate cannot handle, like CID-keyed ones, are skipped.
    let Ok(font) = Font::parse(&data, 0) else { return Ok(()) };
    let kind = font.outline_kind();

    let num_glyphs = old_ttf_face.number_of_glyphs();
    let possible_gids = (0..num_glyphs).collect::<Vec<_>>();
    let dist = get_distribution(num_glyphs);

    for _ in 0..NUM_ITERATIONS {
        let num = dist.sample(rng);
        let sample = possible_gids.clone().into_iter().choose_multiple(rng, num);
        let sample_strings = sample.iter().map(|g| g.to_string()).collect::<Vec<_>>();
        let (subset, meta) = subset(&data, 0, &sample).map_err(|e| {
            format!("subset failed for gids {:?}: {}", sample_strings.join(","), e)
        })?;

        if sample.iter().any(|g| meta.retained.binary_search(g).is_err()) {
            return Err(format!("missing glyphs in {:?}", sample_strings.join(",")));
        }

        match kind {
            OutlineKind::TrueType => {
                let new_ttf_face = ttf_parser::Face::parse(&subset, 0).map_err(|_| {
                    format!(
                        "failed to parse new ttf face with gids {:?}",
                        sample_strings.join(",")
                    )
                })?;

                glyph_outlines_ttf_parser(&old_ttf_face, &sample, |gid, sink| {
                    new_ttf_face.outline_glyph(GlyphId(gid), sink).is_some()
                })
                .map_err(|g| {
                    format!(
                        "outlines didn't match for gid {:?} with ttf-parser, with sample {:?}",
                        g,
                        sample_strings.join(",")
                    )
                })?;

                glyph_outlines_skrifa(&data, &subset, &sample).map_err(|g| {
                    format!(
                        "outlines didn't match for gid {:?} with skrifa, with sample {:?}",
                        g,
                        sample_strings.join(",")
                    )
                })?;

                ttf_parser_glyph_metrics(&old_ttf_face, &new_ttf_face, &sample).map_err(
                    |e| {
                        format!(
                            "glyph metrics for sample {:?} didn't match: {:?}",
                            sample_strings.join(","),
                            e
                        )
                    },
                )?;
            }
            OutlineKind::Cff => {
                let table = ttf_parser::cff::Table::parse(&subset).ok_or_else(|| {
                    format!(
                        "failed to parse new CFF table with gids {:?}",
                        sample_strings.join(",")
                    )
                })?;

                glyph_outlines_ttf_parser(&old_ttf_face, &sample, |gid, sink| {
                    table.outline(GlyphId(gid), sink).is_ok()
                })
                .map_err(|g| {
                    format!(
                        "CFF outlines didn't match for gid {:?}, with sample {:?}",
                        g,
                        sample_strings.join(",")
                    )
                })?;
            }
        }
    }

    Ok(())
}

fn get_distribution(num_glyphs: u16) -> WeightedIndex<usize> {
    let mut weights = vec![0];

    for i in 1..num_glyphs {
        if i <= 10 {
            weights.push(8000);
        } else if i <= 50 {
            weights.push(16000);
        } else if i <= 200 {
            weights.push(6000);
        } else if i <= 2000 {
            weights.push(100);
        } else if i <= 5000 {
            weights.push(2);
        }
    }

    WeightedIndex::new(&weights).unwrap()
}

fn ttf_parser_glyph_metrics(
    old_face: &ttf_parser::Face,
    new_face: &ttf_parser::Face,
    gids: &[u16],
) -> Result<(), String> {
    for glyph in gids.iter().copied() {
        if old_face.glyph_hor_side_bearing(GlyphId(glyph))
            != new_face.glyph_hor_side_bearing(GlyphId(glyph))
        {
            return Err(format!("glyph hor side bearing for glyph {:?} didn't match.", glyph));
        }

        if old_face.glyph_hor_advance(GlyphId(glyph))
            != new_face.glyph_hor_advance(GlyphId(glyph))
        {
            return Err(format!("glyph hor advance for glyph {:?} didn't match.", glyph));
        }
    }

    Ok(())
}

fn glyph_outlines_skrifa(old_data: &[u8], new_data: &[u8], gids: &[u16]) -> Result<(), u16> {
    let old_face = skrifa::FontRef::new(old_data).map_err(|_| 0u16)?;
    let new_face = skrifa::FontRef::new(new_data).map_err(|_| 0u16)?;

    for glyph in gids.iter().copied() {
        let mut sink1 = Sink::default();
        let mut sink2 = Sink::default();
        let id = skrifa::GlyphId::new(u32::from(glyph));

        // Hinting is left out, since skrifa fails to hint many of the source
        // fonts already.
        let settings = || DrawSettings::unhinted(Size::new(150.0), LocationRef::default());

        let Some(glyph1) = old_face.outline_glyphs().get(id) else { continue };
        if glyph1.draw(settings(), &mut sink1).is_err() {
            continue;
        }

        let glyph2 = new_face.outline_glyphs().get(id).ok_or(glyph)?;
        glyph2.draw(settings(), &mut sink2).map_err(|_| glyph)?;

        if sink1 != sink2 {
            return Err(glyph);
        }
    }

    Ok(())
}

fn glyph_outlines_ttf_parser(
    old_face: &ttf_parser::Face,
    gids: &[u16],
    mut draw_new: impl FnMut(u16, &mut Sink) -> bool,
) -> Result<(), u16> {
    for glyph in gids.iter().copied() {
        let mut sink1 = Sink::default();
        let mut sink2 = Sink::default();

        if old_face.outline_glyph(GlyphId(glyph), &mut sink1).is_some() {
            if !draw_new(glyph, &mut sink2) || sink1 != sink2 {
                return Err(glyph);
            }
        }
    }

    Ok(())
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
