use crate::stream::{read_at, Fixed};
use crate::Result;

/// The parts of the `post` table a font descriptor needs.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Post {
    pub italic_angle: f32,
    pub underline_position: i16,
    pub underline_thickness: i16,
    pub is_fixed_pitch: bool,
}

impl Post {
    pub fn parse(data: &[u8]) -> Result<Self> {
        Ok(Post {
            italic_angle: read_at::<Fixed>(data, 4)?.0,
            underline_position: read_at::<i16>(data, 8)?,
            underline_thickness: read_at::<i16>(data, 10)?,
            is_fixed_pitch: read_at::<u32>(data, 12)? != 0,
        })
    }
}
