//! Reading the PostScript name out of the `name` table.

use crate::stream::{Readable, Reader};

/// The name ID of the PostScript name.
const POSTSCRIPT_NAME_ID: u16 = 6;

#[derive(Clone, Copy, Debug)]
struct NameRecord {
    platform_id: u16,
    encoding_id: u16,
    name_id: u16,
    length: u16,
    string_offset: u16,
}

impl Readable<'_> for NameRecord {
    const SIZE: usize = u16::SIZE * 6;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let platform_id = r.read::<u16>()?;
        let encoding_id = r.read::<u16>()?;
        r.skip::<u16>()?; // language id
        let name_id = r.read::<u16>()?;
        let length = r.read::<u16>()?;
        let string_offset = r.read::<u16>()?;

        Some(Self { platform_id, encoding_id, name_id, length, string_offset })
    }
}

impl NameRecord {
    fn is_unicode(&self) -> bool {
        self.platform_id == 0
            || (self.platform_id == 3 && [0, 1, 10].contains(&self.encoding_id))
    }

    fn is_mac_roman(&self) -> bool {
        self.platform_id == 1 && self.encoding_id == 0
    }
}

/// Find the PostScript name of the font, preferring Unicode records.
pub fn postscript_name(data: &[u8]) -> Option<String> {
    let mut r = Reader::new(data);
    r.skip::<u16>()?; // version
    let count = r.read::<u16>()?;
    let storage = usize::from(r.read::<u16>()?);

    let mut fallback = None;
    for _ in 0..count {
        let record = r.read::<NameRecord>()?;
        if record.name_id != POSTSCRIPT_NAME_ID {
            continue;
        }

        let start = storage + usize::from(record.string_offset);
        let Some(bytes) = data.get(start..start + usize::from(record.length)) else {
            continue;
        };

        if record.is_unicode() {
            let units = bytes.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]]));
            let name = char::decode_utf16(units).collect::<Result<String, _>>().ok()?;
            return Some(name);
        } else if record.is_mac_roman() && fallback.is_none() {
            // PostScript names are restricted to printable ASCII.
            fallback = Some(bytes.iter().map(|&b| char::from(b)).collect());
        }
    }

    fallback
}
