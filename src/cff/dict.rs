//! Top and Private DICTs.
//!
//! A DICT is a flat list of operands, each list terminated by an operator. We
//! decode the whole DICT into structured fields and re-encode it from them when
//! writing, since the offsets it contains change during subsetting.

use crate::cff::number::Number;
use crate::stream::{Reader, Writeable, Writer};
use crate::{Error, Result};
use std::mem;

/// The maximum number of operands a single operator may take.
pub const MAX_OPERANDS_LEN: usize = 48;

const TWO_BYTE_OPERATOR_MARK: u8 = 12;

/// A DICT operator. Two-byte operators `12 x` are stored as `1200 + x`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Operator(pub u16);

#[allow(unused)]
impl Operator {
    // Top DICT.
    pub const VERSION: Self = Self(0);
    pub const NOTICE: Self = Self(1);
    pub const FULL_NAME: Self = Self(2);
    pub const FAMILY_NAME: Self = Self(3);
    pub const WEIGHT: Self = Self(4);
    pub const FONT_BBOX: Self = Self(5);
    pub const UNIQUE_ID: Self = Self(13);
    pub const XUID: Self = Self(14);
    pub const CHARSET: Self = Self(15);
    pub const ENCODING: Self = Self(16);
    pub const CHAR_STRINGS: Self = Self(17);
    pub const PRIVATE: Self = Self(18);
    pub const COPYRIGHT: Self = Self(1200);
    pub const IS_FIXED_PITCH: Self = Self(1201);
    pub const ITALIC_ANGLE: Self = Self(1202);
    pub const UNDERLINE_POSITION: Self = Self(1203);
    pub const UNDERLINE_THICKNESS: Self = Self(1204);
    pub const PAINT_TYPE: Self = Self(1205);
    pub const CHAR_STRING_TYPE: Self = Self(1206);
    pub const FONT_MATRIX: Self = Self(1207);
    pub const STROKE_WIDTH: Self = Self(1208);
    pub const SYNTHETIC_BASE: Self = Self(1220);
    pub const POSTSCRIPT: Self = Self(1221);
    pub const BASE_FONT_NAME: Self = Self(1222);
    pub const BASE_FONT_BLEND: Self = Self(1223);

    // Top DICT of CID-keyed fonts.
    pub const ROS: Self = Self(1230);
    pub const CID_FONT_VERSION: Self = Self(1231);
    pub const CID_FONT_REVISION: Self = Self(1232);
    pub const CID_FONT_TYPE: Self = Self(1233);
    pub const CID_COUNT: Self = Self(1234);
    pub const UID_BASE: Self = Self(1235);
    pub const FD_ARRAY: Self = Self(1236);
    pub const FD_SELECT: Self = Self(1237);
    pub const FONT_NAME: Self = Self(1238);

    // Private DICT.
    pub const BLUE_VALUES: Self = Self(6);
    pub const OTHER_BLUES: Self = Self(7);
    pub const FAMILY_BLUES: Self = Self(8);
    pub const FAMILY_OTHER_BLUES: Self = Self(9);
    pub const STD_HW: Self = Self(10);
    pub const STD_VW: Self = Self(11);
    pub const SUBRS: Self = Self(19);
    pub const DEFAULT_WIDTH_X: Self = Self(20);
    pub const NOMINAL_WIDTH_X: Self = Self(21);
    pub const BLUE_SCALE: Self = Self(1209);
    pub const BLUE_SHIFT: Self = Self(1210);
    pub const BLUE_FUZZ: Self = Self(1211);
    pub const STEM_SNAP_H: Self = Self(1212);
    pub const STEM_SNAP_V: Self = Self(1213);
    pub const FORCE_BOLD: Self = Self(1214);
    pub const LANGUAGE_GROUP: Self = Self(1217);
    pub const EXPANSION_FACTOR: Self = Self(1218);
    pub const INITIAL_RANDOM_SEED: Self = Self(1219);

    fn escaped(b: u8) -> Option<Self> {
        match b {
            0..=14 | 17..=23 | 30..=38 => Some(Self(1200 + u16::from(b))),
            _ => None,
        }
    }

    fn is_cid(self) -> bool {
        (Self::ROS.0..=Self::FONT_NAME.0).contains(&self.0)
    }
}

impl Writeable for Operator {
    fn write(&self, w: &mut Writer) {
        if self.0 >= 1200 {
            w.write::<[u8; 2]>([TWO_BYTE_OPERATOR_MARK, (self.0 - 1200) as u8]);
        } else {
            w.write::<u8>(self.0 as u8);
        }
    }
}

/// A single operator with its operands.
pub type Entry = (Operator, Vec<Number>);

/// Split a DICT into its entries.
pub fn parse_dict(data: &[u8]) -> Result<Vec<Entry>> {
    let mut r = Reader::new(data);
    let mut entries = vec![];
    let mut operands = vec![];

    while !r.at_end() {
        let b0 = r.peak::<u8>().ok_or(Error::MissingData)?;
        let op = match b0 {
            TWO_BYTE_OPERATOR_MARK => {
                r.skip::<u8>();
                let b1 = r.read::<u8>().ok_or(Error::MissingData)?;
                Operator::escaped(b1).ok_or(Error::InvalidOperator(b1))?
            }
            0..=21 => {
                r.skip::<u8>();
                Operator(u16::from(b0))
            }
            28..=30 | 32..=254 => {
                if operands.len() == MAX_OPERANDS_LEN {
                    return Err(Error::MalformedFont);
                }
                operands.push(Number::parse(&mut r).ok_or(Error::MalformedFont)?);
                continue;
            }
            _ => return Err(Error::MalformedFont),
        };

        entries.push((op, mem::take(&mut operands)));
    }

    if !operands.is_empty() {
        log::warn!("ignoring {} trailing DICT operands", operands.len());
    }

    Ok(entries)
}

fn write_entry(w: &mut Writer, op: Operator, operands: &[Number]) {
    for &operand in operands {
        w.write(operand);
    }
    w.write(op);
}

fn single(operands: &[Number]) -> Result<Number> {
    match operands {
        [n] => Ok(*n),
        _ => Err(Error::MalformedFont),
    }
}

fn sid(operands: &[Number]) -> Result<u16> {
    single(operands)?
        .as_i32()
        .and_then(|n| u16::try_from(n).ok())
        .ok_or(Error::MalformedFont)
}

fn offset(operand: Number) -> Result<usize> {
    operand
        .as_i32()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or(Error::MalformedFont)
}

fn int(n: usize) -> Number {
    Number::Integer(n as i32)
}

/// The Top DICT of a name-keyed or CID-keyed font.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopDict {
    pub version: Option<u16>,
    pub notice: Option<u16>,
    pub copyright: Option<u16>,
    pub full_name: Option<u16>,
    pub family_name: Option<u16>,
    pub weight: Option<u16>,
    pub is_fixed_pitch: Option<Number>,
    pub italic_angle: Option<Number>,
    pub underline_position: Option<Number>,
    pub underline_thickness: Option<Number>,
    pub paint_type: Option<Number>,
    pub charstring_type: Option<Number>,
    pub font_matrix: Option<Vec<Number>>,
    pub unique_id: Option<Number>,
    pub font_bbox: Option<Vec<Number>>,
    pub stroke_width: Option<Number>,
    pub xuid: Option<Vec<Number>>,
    pub charset: Option<usize>,
    pub encoding: Option<usize>,
    pub char_strings: Option<usize>,
    /// Size and offset of the Private DICT.
    pub private: Option<(usize, usize)>,
    /// Operators only CID-keyed fonts have, starting with ROS.
    pub cid: Vec<Entry>,
    /// Everything else, kept as is.
    pub other: Vec<Entry>,
}

impl TopDict {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut dict = Self::default();
        for (op, operands) in parse_dict(data)? {
            match op {
                Operator::VERSION => dict.version = Some(sid(&operands)?),
                Operator::NOTICE => dict.notice = Some(sid(&operands)?),
                Operator::COPYRIGHT => dict.copyright = Some(sid(&operands)?),
                Operator::FULL_NAME => dict.full_name = Some(sid(&operands)?),
                Operator::FAMILY_NAME => dict.family_name = Some(sid(&operands)?),
                Operator::WEIGHT => dict.weight = Some(sid(&operands)?),
                Operator::IS_FIXED_PITCH => dict.is_fixed_pitch = Some(single(&operands)?),
                Operator::ITALIC_ANGLE => dict.italic_angle = Some(single(&operands)?),
                Operator::UNDERLINE_POSITION => {
                    dict.underline_position = Some(single(&operands)?)
                }
                Operator::UNDERLINE_THICKNESS => {
                    dict.underline_thickness = Some(single(&operands)?)
                }
                Operator::PAINT_TYPE => dict.paint_type = Some(single(&operands)?),
                Operator::CHAR_STRING_TYPE => dict.charstring_type = Some(single(&operands)?),
                Operator::FONT_MATRIX => dict.font_matrix = Some(operands),
                Operator::UNIQUE_ID => dict.unique_id = Some(single(&operands)?),
                Operator::FONT_BBOX => dict.font_bbox = Some(operands),
                Operator::STROKE_WIDTH => dict.stroke_width = Some(single(&operands)?),
                Operator::XUID => dict.xuid = Some(operands),
                Operator::CHARSET => dict.charset = Some(offset(single(&operands)?)?),
                Operator::ENCODING => dict.encoding = Some(offset(single(&operands)?)?),
                Operator::CHAR_STRINGS => {
                    dict.char_strings = Some(offset(single(&operands)?)?)
                }
                Operator::PRIVATE => match operands[..] {
                    [size, start] => dict.private = Some((offset(size)?, offset(start)?)),
                    _ => return Err(Error::MalformedFont),
                },
                op if op.is_cid() => dict.cid.push((op, operands)),
                _ => dict.other.push((op, operands)),
            }
        }

        Ok(dict)
    }

    /// Whether this is the Top DICT of a CID-keyed font.
    pub fn is_cid(&self) -> bool {
        self.cid.iter().any(|(op, _)| *op == Operator::ROS)
    }

    pub fn is_fixed_pitch(&self) -> bool {
        self.is_fixed_pitch.is_some_and(|n| n.as_f64() != 0.0)
    }

    pub fn italic_angle(&self) -> f64 {
        self.italic_angle.map_or(0.0, |n| n.as_f64())
    }

    pub fn charstring_type(&self) -> i32 {
        self.charstring_type.and_then(|n| n.as_i32()).unwrap_or(2)
    }

    pub fn write(&self, w: &mut Writer) {
        // ROS must come first.
        for (op, operands) in &self.cid {
            write_entry(w, *op, operands);
        }

        let sids = [
            (Operator::VERSION, self.version),
            (Operator::NOTICE, self.notice),
            (Operator::COPYRIGHT, self.copyright),
            (Operator::FULL_NAME, self.full_name),
            (Operator::FAMILY_NAME, self.family_name),
            (Operator::WEIGHT, self.weight),
        ];
        for (op, sid) in sids {
            if let Some(sid) = sid {
                write_entry(w, op, &[Number::from(i32::from(sid))]);
            }
        }

        let numbers = [
            (Operator::IS_FIXED_PITCH, self.is_fixed_pitch),
            (Operator::ITALIC_ANGLE, self.italic_angle),
            (Operator::UNDERLINE_POSITION, self.underline_position),
            (Operator::UNDERLINE_THICKNESS, self.underline_thickness),
            (Operator::PAINT_TYPE, self.paint_type),
            (Operator::CHAR_STRING_TYPE, self.charstring_type),
            (Operator::UNIQUE_ID, self.unique_id),
            (Operator::STROKE_WIDTH, self.stroke_width),
        ];
        for (op, n) in numbers {
            if let Some(n) = n {
                write_entry(w, op, &[n]);
            }
        }

        let arrays = [
            (Operator::FONT_MATRIX, &self.font_matrix),
            (Operator::FONT_BBOX, &self.font_bbox),
            (Operator::XUID, &self.xuid),
        ];
        for (op, operands) in arrays {
            if let Some(operands) = operands {
                write_entry(w, op, operands);
            }
        }

        for (op, operands) in &self.other {
            write_entry(w, *op, operands);
        }

        let offsets = [
            (Operator::CHARSET, self.charset),
            (Operator::ENCODING, self.encoding),
            (Operator::CHAR_STRINGS, self.char_strings),
        ];
        for (op, offset) in offsets {
            if let Some(offset) = offset {
                write_entry(w, op, &[int(offset)]);
            }
        }

        if let Some((size, offset)) = self.private {
            write_entry(w, Operator::PRIVATE, &[int(size), int(offset)]);
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.write(&mut w);
        w.finish()
    }
}

/// The Private DICT of a font.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrivateDict {
    pub blue_values: Option<Vec<Number>>,
    pub other_blues: Option<Vec<Number>>,
    pub family_blues: Option<Vec<Number>>,
    pub family_other_blues: Option<Vec<Number>>,
    pub blue_scale: Option<Number>,
    pub blue_shift: Option<Number>,
    pub blue_fuzz: Option<Number>,
    pub std_hw: Option<Number>,
    pub std_vw: Option<Number>,
    pub stem_snap_h: Option<Vec<Number>>,
    pub stem_snap_v: Option<Vec<Number>>,
    pub force_bold: Option<Number>,
    pub language_group: Option<Number>,
    pub expansion_factor: Option<Number>,
    pub initial_random_seed: Option<Number>,
    /// Offset of the local subroutines, relative to the start of the DICT.
    pub subrs: Option<usize>,
    pub default_width_x: Option<Number>,
    pub nominal_width_x: Option<Number>,
    pub other: Vec<Entry>,
}

impl PrivateDict {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut dict = Self::default();
        for (op, operands) in parse_dict(data)? {
            match op {
                Operator::BLUE_VALUES => dict.blue_values = Some(operands),
                Operator::OTHER_BLUES => dict.other_blues = Some(operands),
                Operator::FAMILY_BLUES => dict.family_blues = Some(operands),
                Operator::FAMILY_OTHER_BLUES => dict.family_other_blues = Some(operands),
                Operator::BLUE_SCALE => dict.blue_scale = Some(single(&operands)?),
                Operator::BLUE_SHIFT => dict.blue_shift = Some(single(&operands)?),
                Operator::BLUE_FUZZ => dict.blue_fuzz = Some(single(&operands)?),
                Operator::STD_HW => dict.std_hw = Some(single(&operands)?),
                Operator::STD_VW => dict.std_vw = Some(single(&operands)?),
                Operator::STEM_SNAP_H => dict.stem_snap_h = Some(operands),
                Operator::STEM_SNAP_V => dict.stem_snap_v = Some(operands),
                Operator::FORCE_BOLD => dict.force_bold = Some(single(&operands)?),
                Operator::LANGUAGE_GROUP => dict.language_group = Some(single(&operands)?),
                Operator::EXPANSION_FACTOR => {
                    dict.expansion_factor = Some(single(&operands)?)
                }
                Operator::INITIAL_RANDOM_SEED => {
                    dict.initial_random_seed = Some(single(&operands)?)
                }
                Operator::SUBRS => dict.subrs = Some(offset(single(&operands)?)?),
                Operator::DEFAULT_WIDTH_X => dict.default_width_x = Some(single(&operands)?),
                Operator::NOMINAL_WIDTH_X => dict.nominal_width_x = Some(single(&operands)?),
                _ => dict.other.push((op, operands)),
            }
        }

        Ok(dict)
    }

    /// The dominant width of vertical stems.
    pub fn std_vw(&self) -> Option<f64> {
        self.std_vw.map(|n| n.as_f64())
    }

    pub fn write(&self, w: &mut Writer) {
        let arrays = [
            (Operator::BLUE_VALUES, &self.blue_values),
            (Operator::OTHER_BLUES, &self.other_blues),
            (Operator::FAMILY_BLUES, &self.family_blues),
            (Operator::FAMILY_OTHER_BLUES, &self.family_other_blues),
        ];
        for (op, operands) in arrays {
            if let Some(operands) = operands {
                write_entry(w, op, operands);
            }
        }

        let numbers = [
            (Operator::BLUE_SCALE, self.blue_scale),
            (Operator::BLUE_SHIFT, self.blue_shift),
            (Operator::BLUE_FUZZ, self.blue_fuzz),
            (Operator::STD_HW, self.std_hw),
            (Operator::STD_VW, self.std_vw),
        ];
        for (op, n) in numbers {
            if let Some(n) = n {
                write_entry(w, op, &[n]);
            }
        }

        let snaps = [
            (Operator::STEM_SNAP_H, &self.stem_snap_h),
            (Operator::STEM_SNAP_V, &self.stem_snap_v),
        ];
        for (op, operands) in snaps {
            if let Some(operands) = operands {
                write_entry(w, op, operands);
            }
        }

        let numbers = [
            (Operator::FORCE_BOLD, self.force_bold),
            (Operator::LANGUAGE_GROUP, self.language_group),
            (Operator::EXPANSION_FACTOR, self.expansion_factor),
            (Operator::INITIAL_RANDOM_SEED, self.initial_random_seed),
        ];
        for (op, n) in numbers {
            if let Some(n) = n {
                write_entry(w, op, &[n]);
            }
        }

        for (op, operands) in &self.other {
            write_entry(w, *op, operands);
        }

        if let Some(subrs) = self.subrs {
            write_entry(w, Operator::SUBRS, &[int(subrs)]);
        }

        let numbers = [
            (Operator::DEFAULT_WIDTH_X, self.default_width_x),
            (Operator::NOMINAL_WIDTH_X, self.nominal_width_x),
        ];
        for (op, n) in numbers {
            if let Some(n) = n {
                write_entry(w, op, &[n]);
            }
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.write(&mut w);
        w.finish()
    }

    /// Encode the DICT so that local subroutines can directly follow it.
    ///
    /// The `Subrs` offset is the length of the DICT itself, which in turn
    /// depends on how many bytes the offset takes up.
    pub fn to_vec_with_subrs(&mut self) -> Result<Vec<u8>> {
        let mut subrs = 0;
        for _ in 0..4 {
            self.subrs = Some(subrs);
            let data = self.to_vec();
            if data.len() == subrs {
                return Ok(data);
            }
            subrs = data.len();
        }

        Err(Error::OffsetDrift)
    }
}
