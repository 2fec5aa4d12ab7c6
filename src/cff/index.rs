use crate::stream::{Reader, Writer, U24};
use crate::{Error, Result};

/// Parse an INDEX structure.
pub fn parse_index<'a>(r: &mut Reader<'a>) -> Result<Index<'a>> {
    let count = r.read::<u16>().ok_or(Error::MissingData)?;
    if count == 0 {
        return Ok(Index::default());
    }

    let size = r.read::<u8>().ok_or(Error::MissingData)?;
    let offset_size = OffsetSize::from_u8(size).ok_or(Error::InvalidOffsetSize(size))?;
    let offsets_len = (usize::from(count) + 1) * offset_size.to_usize();
    let offsets = VarOffsets {
        data: r.read_bytes(offsets_len).ok_or(Error::MissingData)?,
        offset_size,
    };

    // Offsets must start at one and never decrease.
    let mut prev = 0;
    for i in 0..=u32::from(count) {
        let offset = offsets.get(i).ok_or(Error::InvalidOffset)?;
        if (i == 0 && offset != 0) || offset < prev {
            return Err(Error::InvalidOffset);
        }
        prev = offset;
    }

    // Last offset indicates a Data Index size.
    let data = r.read_bytes(prev as usize).ok_or(Error::MissingData)?;
    Ok(Index { data, offsets })
}

/// Write an INDEX structure.
pub fn write_index<T: AsRef<[u8]>>(w: &mut Writer, items: &[T]) {
    w.write::<u16>(items.len() as u16);
    if items.is_empty() {
        return;
    }

    let data_len: usize = items.iter().map(|item| item.as_ref().len()).sum();
    let offset_size = OffsetSize::for_max(data_len as u32 + 1);
    w.write::<u8>(offset_size as u8);

    let mut offset = 1u32;
    let write_offset = |w: &mut Writer, offset: u32| match offset_size {
        OffsetSize::Size1 => w.write::<u8>(offset as u8),
        OffsetSize::Size2 => w.write::<u16>(offset as u16),
        OffsetSize::Size3 => w.write(U24(offset)),
        OffsetSize::Size4 => w.write::<u32>(offset),
    };

    write_offset(w, offset);
    for item in items {
        offset += item.as_ref().len() as u32;
        write_offset(w, offset);
    }

    for item in items {
        w.extend(item.as_ref());
    }
}

/// The number of bytes `write_index` produces for the items.
pub fn index_len<T: AsRef<[u8]>>(items: &[T]) -> usize {
    if items.is_empty() {
        return 2;
    }

    let data_len: usize = items.iter().map(|item| item.as_ref().len()).sum();
    let offset_size = OffsetSize::for_max(data_len as u32 + 1);
    3 + (items.len() + 1) * offset_size.to_usize() + data_len
}

#[derive(Clone, Copy, Debug)]
pub struct VarOffsets<'a> {
    pub data: &'a [u8],
    pub offset_size: OffsetSize,
}

impl<'a> VarOffsets<'a> {
    pub fn get(&self, index: u32) -> Option<u32> {
        if index >= self.len() {
            return None;
        }

        let start = index as usize * self.offset_size.to_usize();
        let mut r = Reader::new_at(self.data, start);
        let n: u32 = match self.offset_size {
            OffsetSize::Size1 => u32::from(r.read::<u8>()?),
            OffsetSize::Size2 => u32::from(r.read::<u16>()?),
            OffsetSize::Size3 => r.read::<U24>()?.0,
            OffsetSize::Size4 => r.read::<u32>()?,
        };

        // Offsets are offset by one byte in the font,
        // so we have to shift them back.
        n.checked_sub(1)
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.data.len() as u32 / self.offset_size as u32
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Index<'a> {
    pub data: &'a [u8],
    pub offsets: VarOffsets<'a>,
}

impl Default for Index<'_> {
    #[inline]
    fn default() -> Self {
        Index {
            data: b"",
            offsets: VarOffsets { data: b"", offset_size: OffsetSize::Size1 },
        }
    }
}

impl<'a> Index<'a> {
    #[inline]
    pub fn len(&self) -> u32 {
        // Last offset points to the byte after the `Object data`. We should skip it.
        self.offsets.len().saturating_sub(1)
    }

    pub fn get(&self, index: u32) -> Option<&'a [u8]> {
        let next_index = index.checked_add(1)?; // make sure we do not overflow
        let start = self.offsets.get(index)? as usize;
        let end = self.offsets.get(next_index)? as usize;
        self.data.get(start..end)
    }

    /// Copy all items out of the INDEX.
    pub fn to_vec(&self) -> Vec<Vec<u8>> {
        self.iter().map(<[u8]>::to_vec).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OffsetSize {
    Size1 = 1,
    Size2 = 2,
    Size3 = 3,
    Size4 = 4,
}

impl OffsetSize {
    fn from_u8(size: u8) -> Option<Self> {
        match size {
            1 => Some(OffsetSize::Size1),
            2 => Some(OffsetSize::Size2),
            3 => Some(OffsetSize::Size3),
            4 => Some(OffsetSize::Size4),
            _ => None,
        }
    }

    /// The smallest size that can hold `max`.
    pub fn for_max(max: u32) -> Self {
        if max <= 0xFF {
            OffsetSize::Size1
        } else if max <= 0xFFFF {
            OffsetSize::Size2
        } else if max <= 0xFF_FFFF {
            OffsetSize::Size3
        } else {
            OffsetSize::Size4
        }
    }

    #[inline]
    pub fn to_usize(self) -> usize {
        self as usize
    }
}
