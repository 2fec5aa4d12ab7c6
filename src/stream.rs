use crate::{Error, Result};

/// A readable stream of binary data.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    /// The underlying data of the reader.
    data: &'a [u8],
    /// The current offset in bytes. Is not guaranteed to be in range.
    offset: usize,
}

impl<'a> Reader<'a> {
    /// Create a new readable stream of binary data.
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Create a new readable stream of binary data at a specific position.
    #[inline]
    pub fn new_at(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset }
    }

    /// The remaining data from the current offset.
    #[inline]
    pub fn tail(&self) -> Option<&'a [u8]> {
        self.data.get(self.offset..)
    }

    /// The current offset.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Try to read `T` from the data.
    #[inline]
    pub fn read<T: Readable<'a>>(&mut self) -> Option<T> {
        T::read(self)
    }

    /// Try to read `T` from the data without advancing.
    #[inline]
    pub fn peak<T: Readable<'a>>(&self) -> Option<T> {
        let mut r = self.clone();
        T::read(&mut r)
    }

    /// Read a certain number of bytes.
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(len)?;
        let v = self.data.get(self.offset..end)?;
        self.offset = end;
        Some(v)
    }

    /// Skip the next `n` bytes, failing if there are not enough of them.
    #[inline]
    pub fn skip_bytes(&mut self, n: usize) -> Option<()> {
        self.read_bytes(n).map(|_| ())
    }

    /// Advances by `Readable::SIZE`.
    #[inline]
    pub fn skip<T: Readable<'a>>(&mut self) -> Option<()> {
        self.skip_bytes(T::SIZE)
    }

    /// Check whether the reader is at the end of the buffer.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Jump to a specific location.
    #[inline]
    pub fn jump(&mut self, offset: usize) {
        self.offset = offset;
    }
}

/// Read `T` at a fixed offset into `data`.
#[inline]
pub fn read_at<'a, T: Readable<'a>>(data: &'a [u8], offset: usize) -> Result<T> {
    Reader::new_at(data, offset).read::<T>().ok_or(Error::MissingData)
}

/// A writable stream of binary data.
#[derive(Default)]
pub struct Writer(Vec<u8>);

impl Writer {
    /// Create a new writable stream of binary data.
    #[inline]
    pub fn new() -> Self {
        Self(Vec::with_capacity(1024))
    }

    /// Create a new writable stream of binary data with a capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Write `T` into the data.
    #[inline]
    pub fn write<T: Writeable>(&mut self, data: T) {
        data.write(self);
    }

    /// Give bytes into the writer.
    #[inline]
    pub fn extend(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }

    /// Align the contents to a byte boundary.
    #[inline]
    pub fn align(&mut self, to: usize) {
        while self.0.len() % to != 0 {
            self.0.push(0);
        }
    }

    /// The number of written bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return the written bytes.
    #[inline]
    pub fn finish(self) -> Vec<u8> {
        self.0
    }
}

/// Something that can be read from a byte stream with a fixed size.
pub trait Readable<'a>: Sized {
    const SIZE: usize;

    fn read(r: &mut Reader<'a>) -> Option<Self>;
}

/// Something that can be written into a byte stream.
pub trait Writeable: Sized {
    fn write(&self, w: &mut Writer);
}

impl<const N: usize> Readable<'_> for [u8; N] {
    const SIZE: usize = N;

    fn read(r: &mut Reader) -> Option<Self> {
        r.read_bytes(N)?.try_into().ok()
    }
}

impl<const N: usize> Writeable for [u8; N] {
    fn write(&self, w: &mut Writer) {
        w.extend(self)
    }
}

macro_rules! be_number {
    ($($ty:ty),*) => {$(
        impl Readable<'_> for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn read(r: &mut Reader) -> Option<Self> {
                r.read::<[u8; std::mem::size_of::<$ty>()]>().map(Self::from_be_bytes)
            }
        }

        impl Writeable for $ty {
            fn write(&self, w: &mut Writer) {
                w.extend(&self.to_be_bytes());
            }
        }
    )*};
}

be_number!(u8, i8, u16, i16, u32, i32);

/// An unsigned 24-bit integer, used for three-byte CFF offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct U24(pub u32);

impl Readable<'_> for U24 {
    const SIZE: usize = 3;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let data = r.read::<[u8; 3]>()?;
        Some(U24(u32::from_be_bytes([0, data[0], data[1], data[2]])))
    }
}

impl Writeable for U24 {
    fn write(&self, w: &mut Writer) {
        let data = self.0.to_be_bytes();
        w.write::<[u8; 3]>([data[1], data[2], data[3]]);
    }
}

/// A 32-bit signed fixed-point number (16.16).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fixed(pub f32);

impl Readable<'_> for Fixed {
    const SIZE: usize = 4;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        r.read::<i32>().map(|n| Fixed(n as f32 / 65536.0))
    }
}
