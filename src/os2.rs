use crate::stream::read_at;
use crate::Result;

/// The parts of the `OS/2` table a font descriptor needs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Os2 {
    pub version: u16,
    pub weight_class: u16,
    /// Only present from version 2 on.
    pub x_height: i16,
    /// Only present from version 2 on.
    pub cap_height: i16,
}

impl Os2 {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let version = read_at::<u16>(data, 0)?;
        let weight_class = read_at::<u16>(data, 4)?;
        let (x_height, cap_height) = if version >= 2 {
            (read_at::<i16>(data, 86)?, read_at::<i16>(data, 88)?)
        } else {
            (0, 0)
        };

        Ok(Os2 { version, weight_class, x_height, cap_height })
    }
}
