use crate::stream::{Reader, Writer};
use crate::{Error, Result};

/// The horizontal metrics of one glyph.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Metric {
    pub advance: u16,
    pub side_bearing: i16,
}

/// Parse the horizontal metrics of all glyphs.
///
/// Glyphs beyond `number_of_h_metrics` share the last advance and only store
/// their side bearing.
pub fn parse(data: &[u8], number_of_h_metrics: u16, num_glyphs: u16) -> Result<Vec<Metric>> {
    let mut r = Reader::new(data);
    let mut metrics = Vec::with_capacity(usize::from(num_glyphs));

    for _ in 0..number_of_h_metrics.min(num_glyphs) {
        let advance = r.read::<u16>().ok_or(Error::MissingData)?;
        let side_bearing = r.read::<i16>().ok_or(Error::MissingData)?;
        metrics.push(Metric { advance, side_bearing });
    }

    // Metrics past the long ones are allowed to be cut off.
    let last = metrics.last().map(|m| m.advance).unwrap_or(0);
    for _ in metrics.len()..usize::from(num_glyphs) {
        let side_bearing = r.read::<i16>().unwrap_or(0);
        metrics.push(Metric { advance: last, side_bearing });
    }

    Ok(metrics)
}

/// Write a long metric for every glyph.
pub fn write(metrics: &[Metric]) -> Vec<u8> {
    let mut w = Writer::with_capacity(4 * metrics.len());
    for metric in metrics {
        w.write::<u16>(metric.advance);
        w.write::<i16>(metric.side_bearing);
    }
    w.finish()
}
