//! Operands of CFF DICTs.

use crate::stream::{Reader, Writeable, Writer};
use std::fmt::{self, Debug, Display, Formatter};

/// The longest real number we are willing to decode, in characters.
const FLOAT_STACK_LEN: usize = 64;
const END_OF_FLOAT_FLAG: u8 = 0xf;

/// A DICT operand.
#[derive(Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i32),
    Real(f64),
}

impl Number {
    /// Parse a DICT operand.
    pub fn parse(r: &mut Reader) -> Option<Number> {
        let b0 = r.read::<u8>()?;
        match b0 {
            28 => Some(Number::Integer(i32::from(r.read::<i16>()?))),
            29 => Some(Number::Integer(r.read::<i32>()?)),
            30 => parse_real(r).map(Number::Real),
            32..=246 => Some(Number::Integer(i32::from(b0) - 139)),
            247..=250 => {
                let b1 = i32::from(r.read::<u8>()?);
                Some(Number::Integer((i32::from(b0) - 247) * 256 + b1 + 108))
            }
            251..=254 => {
                let b1 = i32::from(r.read::<u8>()?);
                Some(Number::Integer(-(i32::from(b0) - 251) * 256 - b1 - 108))
            }
            _ => None,
        }
    }

    /// The number as an integer, if it has an integral value.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Number::Integer(n) => Some(n),
            Number::Real(f) if f.fract() == 0.0 && f.abs() <= i32::MAX as f64 => {
                Some(f as i32)
            }
            Number::Real(_) => None,
        }
    }

    /// The number as a float.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Integer(n) => f64::from(n),
            Number::Real(f) => f,
        }
    }
}

impl Debug for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(n) => write!(f, "{n}"),
            Number::Real(n) => write!(f, "{n}"),
        }
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::Integer(n)
    }
}

impl Writeable for Number {
    fn write(&self, w: &mut Writer) {
        match *self {
            Number::Integer(n) => write_integer(n, w),
            Number::Real(f) => write_real(f, w),
        }
    }
}

/// The number of bytes an integer operand occupies.
pub fn encoded_len(n: i32) -> usize {
    match n {
        -107..=107 => 1,
        108..=1131 | -1131..=-108 => 2,
        -32768..=32767 => 3,
        _ => 5,
    }
}

fn write_integer(n: i32, w: &mut Writer) {
    match n {
        -107..=107 => w.write((n + 139) as u8),
        108..=1131 => {
            let temp = n - 108;
            w.write([(temp / 256 + 247) as u8, (temp % 256) as u8]);
        }
        -1131..=-108 => {
            let temp = -n - 108;
            w.write([(temp / 256 + 251) as u8, (temp % 256) as u8]);
        }
        -32768..=32767 => {
            w.write::<u8>(28);
            w.write::<i16>(n as i16);
        }
        _ => {
            w.write::<u8>(29);
            w.write::<i32>(n);
        }
    }
}

// Floats don't appear that often, so going through a string is good enough.
fn write_real(f: f64, w: &mut Writer) {
    let f = if f.is_finite() { f } else { 0.0 };

    // Both forms are the shortest representation that parses back to the
    // same value. Pick whichever needs fewer nibbles.
    let plain = real_nibbles(&format!("{f}"));
    let scientific = real_nibbles(&format!("{f:e}"));
    let mut nibbles = if scientific.len() < plain.len() { scientific } else { plain };

    nibbles.push(END_OF_FLOAT_FLAG);
    if nibbles.len() % 2 != 0 {
        nibbles.push(END_OF_FLOAT_FLAG);
    }

    w.write::<u8>(30);
    for pair in nibbles.chunks(2) {
        w.write((pair[0] << 4) | pair[1]);
    }
}

fn real_nibbles(text: &str) -> Vec<u8> {
    let mut nibbles = Vec::with_capacity(text.len() + 2);
    let mut chars = text.bytes().peekable();
    while let Some(c) = chars.next() {
        match c {
            b'0'..=b'9' => nibbles.push(c - b'0'),
            b'.' => nibbles.push(0xa),
            b'-' => nibbles.push(0xe),
            b'e' | b'E' => {
                if chars.peek() == Some(&b'-') {
                    chars.next();
                    nibbles.push(0xc);
                } else {
                    nibbles.push(0xb);
                }
            }
            _ => {}
        }
    }
    nibbles
}

fn parse_real(r: &mut Reader) -> Option<f64> {
    let mut text = String::with_capacity(16);

    'outer: loop {
        let b = r.read::<u8>()?;
        for nibble in [b >> 4, b & 0xf] {
            match nibble {
                0..=9 => text.push(char::from(b'0' + nibble)),
                0xa => text.push('.'),
                0xb => text.push('E'),
                0xc => text.push_str("E-"),
                0xe => text.push('-'),
                END_OF_FLOAT_FLAG => break 'outer,
                _ => return None,
            }
        }

        if text.len() > FLOAT_STACK_LEN {
            return None;
        }
    }

    text.parse().ok()
}
