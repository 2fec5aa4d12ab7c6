use crate::stream::{Reader, Writer};
use crate::{Error, Result};

/// The horizontal header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hhea {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub min_left_side_bearing: i16,
    pub min_right_side_bearing: i16,
    pub x_max_extent: i16,
    pub caret_slope_rise: i16,
    pub caret_slope_run: i16,
    pub caret_offset: i16,
    pub metric_data_format: i16,
    pub number_of_h_metrics: u16,
}

impl Hhea {
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_impl(data).ok_or(Error::MissingData)
    }

    fn parse_impl(data: &[u8]) -> Option<Self> {
        let mut r = Reader::new(data);
        r.skip::<u32>()?;
        let ascender = r.read::<i16>()?;
        let descender = r.read::<i16>()?;
        let line_gap = r.read::<i16>()?;
        let advance_width_max = r.read::<u16>()?;
        let min_left_side_bearing = r.read::<i16>()?;
        let min_right_side_bearing = r.read::<i16>()?;
        let x_max_extent = r.read::<i16>()?;
        let caret_slope_rise = r.read::<i16>()?;
        let caret_slope_run = r.read::<i16>()?;
        let caret_offset = r.read::<i16>()?;
        r.skip_bytes(8)?;
        let metric_data_format = r.read::<i16>()?;
        let number_of_h_metrics = r.read::<u16>()?;

        Some(Hhea {
            ascender,
            descender,
            line_gap,
            advance_width_max,
            min_left_side_bearing,
            min_right_side_bearing,
            x_max_extent,
            caret_slope_rise,
            caret_slope_run,
            caret_offset,
            metric_data_format,
            number_of_h_metrics,
        })
    }

    pub fn write(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(36);
        w.write::<u16>(1);
        w.write::<u16>(0);
        w.write::<i16>(self.ascender);
        w.write::<i16>(self.descender);
        w.write::<i16>(self.line_gap);
        w.write::<u16>(self.advance_width_max);
        w.write::<i16>(self.min_left_side_bearing);
        w.write::<i16>(self.min_right_side_bearing);
        w.write::<i16>(self.x_max_extent);
        w.write::<i16>(self.caret_slope_rise);
        w.write::<i16>(self.caret_slope_run);
        w.write::<i16>(self.caret_offset);
        w.write([0; 8]);
        w.write::<i16>(self.metric_data_format);
        w.write::<u16>(self.number_of_h_metrics);
        w.finish()
    }
}
